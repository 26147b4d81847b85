//! Lifecycle of the application components.
//!
//! The framework drives activities, services and broadcast receivers
//! through a fixed sequence of callbacks. Each linked component gets an
//! entry placeholder calling its first callback, then every implemented
//! callback of a stage is linked to the implemented callbacks of the next
//! non-empty stage. Callbacks are resolved like explicit calls, so a
//! callback inherited from an application ancestor is linked as well.
//!
//! Lifecycle edges have no call site, their `site` is the entry offset.

use crate::callgraph::{self, CallGraph, CallKind, CallNode, Resolution};
use crate::repo::Repo;
use dg_code::{Addr, MethodRef};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

type Stage = &'static [(&'static str, &'static str)];

const ACTIVITY_STAGES: &[Stage] = &[
    &[("onCreate", "(Landroid/os/Bundle;)V")],
    &[("onStart", "()V")],
    &[("onResume", "()V")],
    &[("onPause", "()V")],
    &[("onStop", "()V")],
    &[("onDestroy", "()V")],
];

const SERVICE_STAGES: &[Stage] = &[
    &[("onCreate", "()V")],
    &[
        ("onStartCommand", "(Landroid/content/Intent;II)I"),
        ("onBind", "(Landroid/content/Intent;)Landroid/os/IBinder;"),
    ],
    &[("onUnbind", "(Landroid/content/Intent;)Z")],
    &[("onDestroy", "()V")],
];

const RECEIVER_STAGES: &[Stage] = &[&[(
    "onReceive",
    "(Landroid/content/Context;Landroid/content/Intent;)V",
)]];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    Activity,
    Service,
    Receiver,
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Activity => write!(f, "activity"),
            Self::Service => write!(f, "service"),
            Self::Receiver => write!(f, "receiver"),
        }
    }
}

impl ComponentKind {
    pub const ALL: [Self; 3] = [Self::Activity, Self::Service, Self::Receiver];

    /// Framework class every component of this kind inherits from.
    #[must_use]
    pub const fn base_class(self) -> &'static str {
        match self {
            Self::Activity => "Landroid/app/Activity;",
            Self::Service => "Landroid/app/Service;",
            Self::Receiver => "Landroid/content/BroadcastReceiver;",
        }
    }

    const fn stages(self) -> &'static [Stage] {
        match self {
            Self::Activity => ACTIVITY_STAGES,
            Self::Service => SERVICE_STAGES,
            Self::Receiver => RECEIVER_STAGES,
        }
    }
}

/// A component declaration, as found in an application manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub class: String,
    pub kind: ComponentKind,
}

impl Component {
    pub fn new(class: &str, kind: ComponentKind) -> Self {
        Self {
            class: class.to_string(),
            kind,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ComponentTable {
    components: BTreeMap<String, ComponentKind>,
}

impl ComponentTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Components recognized from their ancestors: every application class
    /// inheriting from the base class of a component kind.
    pub fn infer(repo: &Repo) -> Self {
        let mut table = Self::new();
        for class in repo.image().iter_classes() {
            if repo.is_framework(&class.name) {
                continue;
            }
            let kind = ComponentKind::ALL
                .into_iter()
                .find(|kind| repo.hierarchy().is_subclass_of(&class.name, kind.base_class()));
            if let Some(kind) = kind {
                table.insert(Component::new(&class.name, kind));
            }
        }
        log::debug!("{} components inferred from the hierarchy", table.len());
        table
    }

    /// Adds a component, replacing the kind of an already known class.
    pub fn insert(&mut self, component: Component) {
        if let Some(previous) = self.components.insert(component.class.clone(), component.kind) {
            if previous != component.kind {
                log::debug!(
                    "component {} redeclared as {} (was {})",
                    component.class,
                    component.kind,
                    previous
                );
            }
        }
    }

    pub fn get(&self, class_name: &str) -> Option<ComponentKind> {
        self.components.get(class_name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ComponentKind)> {
        self.components
            .iter()
            .map(|(class, kind)| (class.as_str(), *kind))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl FromIterator<Component> for ComponentTable {
    fn from_iter<T: IntoIterator<Item = Component>>(iter: T) -> Self {
        let mut table = Self::new();
        for component in iter {
            table.insert(component);
        }
        table
    }
}

/// Placeholder standing for the framework entry of a component.
#[must_use]
pub fn component_entry(class_name: &str, kind: ComponentKind) -> CallNode {
    CallNode::Placeholder(MethodRef::new(class_name, format!("<{kind}>"), "()V"))
}

pub(crate) fn add_lifecycle_calls(cg: &mut CallGraph, repo: &Repo, components: &ComponentTable) {
    for (class, kind) in components.iter() {
        let mut stages = kind.stages().iter().map(|stage| {
            stage
                .iter()
                .filter_map(|(name, descriptor)| callback_node(repo, class, name, descriptor))
                .collect::<Vec<_>>()
        });

        let first = stages.next().unwrap_or_default();
        if first.is_empty() {
            log::debug!("{kind} {class} does not implement its entry callback");
            continue;
        }
        let entry = component_entry(class, kind);
        for node in &first {
            cg.add_call(&entry, node.clone(), Addr::entry(), CallKind::Lifecycle);
            cg.add_entry(node.clone());
        }

        let mut previous = first;
        for stage in stages.filter(|stage| !stage.is_empty()) {
            for src in &previous {
                for dst in &stage {
                    cg.add_call(src, dst.clone(), Addr::entry(), CallKind::Lifecycle);
                }
            }
            previous = stage;
        }
    }
}

fn callback_node(repo: &Repo, class: &str, name: &str, descriptor: &str) -> Option<CallNode> {
    match callgraph::resolve(repo, &MethodRef::new(class, name, descriptor)) {
        Resolution::Method(method) => callgraph::entry_node(repo, &method),
        Resolution::Framework(_) | Resolution::Unresolved => None,
    }
}
