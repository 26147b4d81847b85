//! Implicit calls from the framework back into the application.
//!
//! A registration table maps framework methods registering a callback
//! (listeners setters, thread or handler posting, etc.) to the callbacks the
//! framework will later invoke. The table is a flat text file, one entry per
//! line:
//!
//! ```text
//! registration#callback#position
//! ```
//!
//! where `registration` and `callback` are `class->name(descriptor)`
//! signatures and `position` tells where the callback implementation
//! lives:
//!  - `0`: on the class of the method doing the registration call,
//!  - a positive number: in an argument of the registration call, so every
//!    implementer of the callback declaring class is a candidate,
//!  - anything else: a class or interface name whose implementers are
//!    candidates.

use crate::callgraph::{self, CallGraph, CallKind, CallNode};
use crate::errors::{AnalysisError, AnalysisResult};
use crate::repo::Repo;
use dg_code::{Addr, MethodRef};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum CallbackPosition {
    /// The callback is declared by the caller class itself.
    Receiver,
    /// The callback object is passed as the nth argument.
    Argument(u32),
    /// The callback is declared by implementers of the given type.
    Type(String),
}

impl CallbackPosition {
    fn parse(text: &str) -> Self {
        match text.parse::<u32>() {
            Ok(0) => Self::Receiver,
            Ok(n) => Self::Argument(n),
            Err(_) => Self::Type(text.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RegistrationTable {
    entries: BTreeMap<MethodRef, BTreeMap<CallbackPosition, MethodRef>>,
}

impl RegistrationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open<P: AsRef<Path>>(path: P) -> AnalysisResult<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let table = Self::parse(&content)?;
        log::debug!(
            "{} registration methods loaded from {}",
            table.len(),
            path.as_ref().display()
        );
        Ok(table)
    }

    pub fn parse(content: &str) -> AnalysisResult<Self> {
        let mut table = Self::new();
        for (i, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let malformed = |reason: String| AnalysisError::Registration {
                line: i + 1,
                reason,
            };

            let fields: Vec<&str> = line.split('#').collect();
            let [registration, callback, position] = fields.as_slice() else {
                return Err(malformed(format!(
                    "expected 3 fields separated by '#', found {}",
                    fields.len()
                )));
            };
            let registration =
                MethodRef::parse(registration).map_err(|e| malformed(e.to_string()))?;
            let callback = MethodRef::parse(callback).map_err(|e| malformed(e.to_string()))?;
            let position = position.trim();
            if position.is_empty() {
                return Err(malformed("empty callback position".to_string()));
            }
            table.insert(registration, CallbackPosition::parse(position), callback);
        }
        Ok(table)
    }

    pub fn insert(
        &mut self,
        registration: MethodRef,
        position: CallbackPosition,
        callback: MethodRef,
    ) {
        let callbacks = self.entries.entry(registration).or_default();
        if let Some(previous) = callbacks.insert(position, callback) {
            log::debug!("registration callback {previous} overwritten");
        }
    }

    pub fn get(
        &self,
        registration: &MethodRef,
    ) -> Option<&BTreeMap<CallbackPosition, MethodRef>> {
        self.entries.get(registration)
    }

    /// Number of registration methods.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Adds the implicit callback edges triggered by the call to `callee` at
/// `site`, if the callee (or the same method on one of its ancestors) is a
/// registration method. Edges start from the registration placeholder.
pub(crate) fn add_implicit_calls(
    cg: &mut CallGraph,
    repo: &Repo,
    table: &RegistrationTable,
    caller: &CallNode,
    site: Addr,
    callee: &MethodRef,
) {
    let Some((registration, callbacks)) = repo
        .hierarchy()
        .superclass_chain(callee.class_name())
        .find_map(|class| {
            let key = callee.with_class(class);
            table.get(&key).map(|callbacks| (key, callbacks))
        })
    else {
        return;
    };

    let source = CallNode::Placeholder(registration);
    for (position, callback) in callbacks {
        let root = match position {
            CallbackPosition::Receiver => {
                let target = callback.with_class(caller.method().class_name());
                add_callback_edge(cg, repo, &source, target, site);
                continue;
            }
            CallbackPosition::Argument(_) => callback.class_name(),
            CallbackPosition::Type(name) => name.as_str(),
        };
        for class in repo.hierarchy().descendants(root) {
            add_callback_edge(cg, repo, &source, callback.with_class(class), site);
        }
    }
}

fn add_callback_edge(
    cg: &mut CallGraph,
    repo: &Repo,
    source: &CallNode,
    target: MethodRef,
    site: Addr,
) {
    let Some(entry) = callgraph::entry_node(repo, &target) else {
        return;
    };
    log::trace!("implicit call from {source} to {target}");
    cg.add_call(source, entry, site, CallKind::ImplicitCallback);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::FrameworkBoundary;
    use crate::testutils::*;
    use dg_code::{ClassDef, Image};

    fn implicit_edges(cg: &CallGraph) -> Vec<(String, String)> {
        cg.iter_edges()
            .filter(|(_, _, call)| call.kind == CallKind::ImplicitCallback)
            .map(|(src, dst, _)| (src.id(), dst.id()))
            .collect()
    }

    #[test]
    fn parse_table() {
        let table = RegistrationTable::parse(
            "Lfw/Reg;->add(Lfw/CB;)V#Lfw/CB;->onX()V#0\n\
             \n\
             Lfw/Reg;->add(Lfw/CB;)V#Lfw/CB;->onY()V#1\n\
             Lfw/Thread;->start()V#Lfw/Runnable;->run()V#Lfw/Runnable;\n",
        )
        .unwrap();
        assert_eq!(table.len(), 2);
        let callbacks = table.get(&MethodRef::new("Lfw/Reg;", "add", "(Lfw/CB;)V")).unwrap();
        assert_eq!(
            callbacks.get(&CallbackPosition::Receiver),
            Some(&MethodRef::new("Lfw/CB;", "onX", "()V"))
        );
        assert_eq!(
            callbacks.get(&CallbackPosition::Argument(1)),
            Some(&MethodRef::new("Lfw/CB;", "onY", "()V"))
        );
        let callbacks = table.get(&MethodRef::new("Lfw/Thread;", "start", "()V")).unwrap();
        assert!(callbacks.contains_key(&CallbackPosition::Type("Lfw/Runnable;".to_string())));
    }

    #[test]
    fn later_lines_overwrite() {
        let table = RegistrationTable::parse(
            "LR;->a()V#LC;->b()V#0\n\
             LR;->a()V#LC;->c()V#0\n",
        )
        .unwrap();
        let callbacks = table.get(&MethodRef::new("LR;", "a", "()V")).unwrap();
        assert_eq!(callbacks.len(), 1);
        assert_eq!(callbacks[&CallbackPosition::Receiver].name(), "c");
    }

    #[test]
    fn malformed_lines() {
        assert!(matches!(
            RegistrationTable::parse("LR;->a()V#LC;->b()V\n"),
            Err(AnalysisError::Registration { line: 1, .. })
        ));
        assert!(matches!(
            RegistrationTable::parse("\nLR;->a()V#LC;b()V#0\n"),
            Err(AnalysisError::Registration { line: 2, .. })
        ));
        assert!(matches!(
            RegistrationTable::parse("LR;->a()V#LC;->b()V# \n"),
            Err(AnalysisError::Registration { line: 1, .. })
        ));
        assert!(RegistrationTable::parse("").unwrap().is_empty());
    }

    #[test]
    fn missing_file() {
        assert!(matches!(
            RegistrationTable::open("/nonexistent/registrations.txt"),
            Err(AnalysisError::IO(_))
        ));
    }

    #[test]
    fn receiver_callback() {
        let image = Image::new()
            .with_class(
                ClassDef::new("Lapp/Foo;")
                    .extends("Lfw/Base;")
                    .with_method(method_calling("run", &[("Lapp/MyReg;", "add", "(L)")]))
                    .with_method(method_returning("onX")),
            )
            .with_class(ClassDef::new("Lapp/MyReg;").extends("Lfw/Reg;"))
            .with_class(ClassDef::new("Lfw/Reg;"));
        let boundary = FrameworkBoundary::from_prefixes(&["Lfw/"]).unwrap();
        let repo = Repo::new(&image, boundary).unwrap();
        let table = RegistrationTable::parse("Lfw/Reg;->add(L)#Lfw/CB;->onX()V#0").unwrap();
        let cg = repo.build_callgraph(Some(&table));

        assert_eq!(
            implicit_edges(&cg),
            vec![(
                "Lfw/Reg;add(L)0x0000".to_string(),
                "Lapp/Foo;onX()V@0x0".to_string()
            )]
        );
        // explicit part is unchanged
        assert_eq!(
            cg.calls_to(&CallNode::Placeholder(MethodRef::new("Lfw/Reg;", "add", "(L)")))
                .into_iter()
                .map(|(_, call)| call.kind)
                .collect::<Vec<_>>(),
            vec![CallKind::FrameworkBridge]
        );
        assert!(implicit_edges(&repo.build_callgraph(None)).is_empty());
    }

    #[test]
    fn receiver_without_callback() {
        let image = Image::new().with_class(
            ClassDef::new("Lapp/Foo;")
                .with_method(method_calling("run", &[("Lfw/Reg;", "add", "(L)")])),
        );
        let boundary = FrameworkBoundary::from_prefixes(&["Lfw/"]).unwrap();
        let repo = Repo::new(&image, boundary).unwrap();
        let table = RegistrationTable::parse("Lfw/Reg;->add(L)#Lfw/CB;->onX()V#0").unwrap();
        let cg = repo.build_callgraph(Some(&table));
        assert!(implicit_edges(&cg).is_empty());
    }

    #[test]
    fn cyclic_hierarchy() {
        let image = Image::new()
            .with_class(
                ClassDef::new("Lapp/Main;")
                    .with_method(method_calling("run", &[("Lapp/X;", "add", "(L)")])),
            )
            .with_class(ClassDef::new("Lapp/X;").extends("Lapp/Y;"))
            .with_class(
                ClassDef::new("Lapp/Y;")
                    .extends("Lapp/X;")
                    .with_method(method_returning("onX")),
            );
        let boundary = FrameworkBoundary::from_prefixes(&["Lfw/"]).unwrap();
        let repo = Repo::new(&image, boundary).unwrap();
        let table = RegistrationTable::parse(
            "Lfw/Reg;->add(L)#Lfw/CB;->onX()V#0\n\
             Lfw/Reg;->add(L)#Lfw/CB;->onX()V#Lapp/X;\n",
        )
        .unwrap();
        let cg = repo.build_callgraph(Some(&table));

        assert!(implicit_edges(&cg).is_empty());
        assert_eq!(cg.nb_edges(), 0);
    }

    #[test]
    fn empty_callback_body() {
        let image = Image::new().with_class(
            ClassDef::new("Lapp/Foo;")
                .with_method(method_calling("run", &[("Lfw/Reg;", "add", "(L)")]))
                .with_method(method_with_body("onX", "()V", vec![])),
        );
        let boundary = FrameworkBoundary::from_prefixes(&["Lfw/"]).unwrap();
        let repo = Repo::new(&image, boundary).unwrap();
        let table = RegistrationTable::parse("Lfw/Reg;->add(L)#Lfw/CB;->onX()V#0").unwrap();
        let cg = repo.build_callgraph(Some(&table));
        assert!(implicit_edges(&cg).is_empty());
        assert_eq!(cg.nb_nodes(), 2);
    }

    #[test]
    fn implementers_callbacks() {
        let image = Image::new()
            .with_class(
                ClassDef::new("Lapp/Main;")
                    .with_method(method_calling(
                        "run",
                        &[("Lfw/View;", "setListener", "(Lfw/Listener;)V")],
                    )),
            )
            .with_class(
                ClassDef::new("Lapp/Handler;")
                    .implements("Lfw/Listener;")
                    .with_method(method_returning("onClick")),
            )
            .with_class(ClassDef::new("Lapp/SubHandler;").extends("Lapp/Handler;"))
            .with_class(
                ClassDef::new("Lapp/SubSub;")
                    .extends("Lapp/SubHandler;")
                    .with_method(method_returning("onClick")),
            )
            .with_class(
                ClassDef::new("Lapp/Task;")
                    .implements("Lfw/Runnable;")
                    .with_method(method_returning("run")),
            );
        let boundary = FrameworkBoundary::from_prefixes(&["Lfw/"]).unwrap();
        let repo = Repo::new(&image, boundary).unwrap();
        let table = RegistrationTable::parse(
            "Lfw/View;->setListener(Lfw/Listener;)V#Lfw/Listener;->onClick()V#1\n\
             Lfw/View;->setListener(Lfw/Listener;)V#Lfw/Other;->run()V#Lfw/Runnable;\n",
        )
        .unwrap();
        let cg = repo.build_callgraph(Some(&table));

        let source = "Lfw/View;setListener(Lfw/Listener;)V0x0000".to_string();
        assert_eq!(
            implicit_edges(&cg),
            vec![
                (source.clone(), "Lapp/Handler;onClick()V@0x0".to_string()),
                (source.clone(), "Lapp/SubSub;onClick()V@0x0".to_string()),
                (source, "Lapp/Task;run()V@0x0".to_string()),
            ]
        );
    }
}
