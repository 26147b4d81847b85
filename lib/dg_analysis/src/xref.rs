//! Cross references between classes, methods, fields and strings.

use crate::callgraph::{CallGraph, CallKind};
use crate::repo::Repo;
use dg_code::{Addr, FieldRef, InstrKind, MethodRef};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum UsageKind {
    /// `new-instance` of the used class.
    Instantiation,
    /// Type literal (`const-class`).
    TypeUsage,
    /// Invocation of one of the used class methods.
    Call,
}

impl fmt::Display for UsageKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Instantiation => write!(f, "new"),
            Self::TypeUsage => write!(f, "type"),
            Self::Call => write!(f, "call"),
        }
    }
}

/// `user` refers to `used` from the instruction at `site` of `method`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct ClassUsage {
    pub user: String,
    pub used: String,
    pub method: MethodRef,
    pub site: Addr,
    pub kind: UsageKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum FieldAccess {
    Read,
    Write,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct FieldXref {
    pub method: MethodRef,
    pub site: Addr,
    pub field: FieldRef,
    pub access: FieldAccess,
}

/// Callers and callees of a method, as `(method, call site)` pairs. The call
/// site is always an offset in the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MethodXref {
    pub from: BTreeSet<(MethodRef, Addr)>,
    pub to: BTreeSet<(MethodRef, Addr)>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct XrefIndex {
    classes: BTreeSet<ClassUsage>,
    fields: BTreeSet<FieldXref>,
    strings: BTreeMap<String, BTreeSet<(String, MethodRef)>>,
    methods: BTreeMap<MethodRef, MethodXref>,
}

impl XrefIndex {
    /// Walks the instructions of every method graph of the repository, and
    /// the calls resolved while building `callgraph`. References that cannot
    /// be resolved in the image are dropped.
    pub fn build(repo: &Repo, callgraph: &CallGraph) -> Self {
        let mut index = Self::default();

        for graph in repo.iter_method_graphs() {
            let method = graph.method();
            let user = method.class_name();
            for instr in graph.iter_blocks().flat_map(|block| block.instructions()) {
                match instr.kind() {
                    InstrKind::NewInstance(used) => {
                        let kind = UsageKind::Instantiation;
                        index.add_class_usage(repo, method, used, instr.addr(), kind);
                    }
                    InstrKind::ConstClass(used) => {
                        let kind = UsageKind::TypeUsage;
                        index.add_class_usage(repo, method, used, instr.addr(), kind);
                    }
                    InstrKind::FieldGet(field) => {
                        let access = FieldAccess::Read;
                        index.add_field_access(repo, method, field, instr.addr(), access);
                    }
                    InstrKind::FieldPut(field) => {
                        let access = FieldAccess::Write;
                        index.add_field_access(repo, method, field, instr.addr(), access);
                    }
                    InstrKind::ConstString(value) => {
                        index
                            .strings
                            .entry(value.clone())
                            .or_default()
                            .insert((user.to_string(), method.clone()));
                    }
                    _ => (),
                }
            }
        }

        for call in callgraph.resolved_calls() {
            index
                .methods
                .entry(call.caller.clone())
                .or_default()
                .to
                .insert((call.callee.clone(), call.site));
            index
                .methods
                .entry(call.callee.clone())
                .or_default()
                .from
                .insert((call.caller.clone(), call.site));
            if call.kind != CallKind::FrameworkBridge {
                index.add_class_usage(
                    repo,
                    &call.caller,
                    call.callee.class_name(),
                    call.site,
                    UsageKind::Call,
                );
            }
        }

        log::debug!(
            "xrefs: {} class usages, {} field accesses, {} strings, {} methods",
            index.classes.len(),
            index.fields.len(),
            index.strings.len(),
            index.methods.len()
        );
        index
    }

    fn add_class_usage(
        &mut self,
        repo: &Repo,
        method: &MethodRef,
        used: &str,
        site: Addr,
        kind: UsageKind,
    ) {
        let user = method.class_name();
        if user == used || repo.get_class(used).is_none() {
            return;
        }
        self.classes.insert(ClassUsage {
            user: user.to_string(),
            used: used.to_string(),
            method: method.clone(),
            site,
            kind,
        });
    }

    fn add_field_access(
        &mut self,
        repo: &Repo,
        method: &MethodRef,
        field: &FieldRef,
        site: Addr,
        access: FieldAccess,
    ) {
        if repo.find_field(field).is_none() {
            log::trace!("{method}: field {field} is unresolved");
            return;
        }
        self.fields.insert(FieldXref {
            method: method.clone(),
            site,
            field: field.clone(),
            access,
        });
    }

    /// Classes referenced by `class_name`.
    pub fn class_uses<'x>(&'x self, class_name: &'x str) -> impl Iterator<Item = &'x ClassUsage> {
        self.classes.iter().filter(move |usage| usage.user == class_name)
    }

    /// Classes referring to `class_name`.
    pub fn class_users<'x>(&'x self, class_name: &'x str) -> impl Iterator<Item = &'x ClassUsage> {
        self.classes.iter().filter(move |usage| usage.used == class_name)
    }

    pub fn iter_class_usages(&self) -> impl Iterator<Item = &ClassUsage> {
        self.classes.iter()
    }

    pub fn field_accesses<'x>(
        &'x self,
        field: &'x FieldRef,
    ) -> impl Iterator<Item = &'x FieldXref> {
        self.fields.iter().filter(move |xref| &xref.field == field)
    }

    pub fn field_reads<'x>(&'x self, field: &'x FieldRef) -> impl Iterator<Item = &'x FieldXref> {
        self.field_accesses(field)
            .filter(|xref| xref.access == FieldAccess::Read)
    }

    pub fn field_writes<'x>(&'x self, field: &'x FieldRef) -> impl Iterator<Item = &'x FieldXref> {
        self.field_accesses(field)
            .filter(|xref| xref.access == FieldAccess::Write)
    }

    /// `(class, method)` pairs loading the string literal.
    pub fn string_users(&self, value: &str) -> Option<&BTreeSet<(String, MethodRef)>> {
        self.strings.get(value)
    }

    pub fn iter_strings(&self) -> impl Iterator<Item = &str> {
        self.strings.keys().map(String::as_str)
    }

    pub fn method_xref(&self, method: &MethodRef) -> Option<&MethodXref> {
        self.methods.get(method)
    }
}
