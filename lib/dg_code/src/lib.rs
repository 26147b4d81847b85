//! Decoded application image consumed by the `DroidGraph` analyses.
//!
//! This crate does not decode anything: it defines the flat data handed
//! over by a bytecode decoder (instructions with resolved operands,
//! exception descriptors, class table) and a few consistency checks.

mod addr;
mod classes;
mod code;
pub mod errors;
mod instrs;
mod refs;

pub use addr::Addr;
pub use classes::{ClassDef, FieldDef, MethodDef};
pub use code::{CatchHandler, Code, TryItem};
pub use instrs::{InstrKind, Instruction};
pub use refs::{FieldRef, MethodRef};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The whole class table of an application, including the framework
/// classes the decoder knows about (usually without code).
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Image {
    classes: BTreeMap<String, ClassDef>,
}

impl Image {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a class definition. A second definition of an already known
    /// class is ignored.
    pub fn add_class(&mut self, class: ClassDef) {
        if self.classes.contains_key(&class.name) {
            log::warn!("duplicate definition of class {}, ignored", class.name);
            return;
        }
        self.classes.insert(class.name.clone(), class);
    }

    #[must_use]
    pub fn with_class(mut self, class: ClassDef) -> Self {
        self.add_class(class);
        self
    }

    #[inline]
    pub fn get_class(&self, name: &str) -> Option<&ClassDef> {
        self.classes.get(name)
    }

    pub fn iter_classes(&self) -> impl Iterator<Item = &ClassDef> {
        self.classes.values()
    }

    #[inline]
    pub fn nb_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn nb_methods(&self) -> usize {
        self.classes.values().map(|c| c.methods.len()).sum()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl FromIterator<ClassDef> for Image {
    fn from_iter<I: IntoIterator<Item = ClassDef>>(iter: I) -> Self {
        let mut image = Self::new();
        for class in iter {
            image.add_class(class);
        }
        image
    }
}
