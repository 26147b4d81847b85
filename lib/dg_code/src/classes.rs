//! Class table entries.

use crate::{Code, MethodRef};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub type_: String,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, type_: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_: type_.into(),
        }
    }
}

/// A method declaration. Abstract and native methods have no code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDef {
    pub name: String,
    pub descriptor: String,
    pub code: Option<Code>,
}

impl MethodDef {
    pub fn new(name: impl Into<String>, descriptor: impl Into<String>, code: Option<Code>) -> Self {
        Self {
            name: name.into(),
            descriptor: descriptor.into(),
            code,
        }
    }

    #[inline]
    pub fn has_code(&self) -> bool {
        self.code.is_some()
    }

    #[inline]
    pub fn code(&self) -> Option<&Code> {
        self.code.as_ref()
    }

    pub fn matches(&self, name: &str, descriptor: &str) -> bool {
        self.name == name && self.descriptor == descriptor
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDef {
    pub name: String,
    pub superclass: Option<String>,
    pub interfaces: Vec<String>,
    pub methods: Vec<MethodDef>,
    pub fields: Vec<FieldDef>,
}

impl ClassDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            superclass: None,
            interfaces: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn extends(mut self, superclass: impl Into<String>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    #[must_use]
    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    #[must_use]
    pub fn with_method(mut self, method: MethodDef) -> Self {
        self.methods.push(method);
        self
    }

    #[must_use]
    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    pub fn find_method(&self, name: &str, descriptor: &str) -> Option<&MethodDef> {
        self.methods.iter().find(|m| m.matches(name, descriptor))
    }

    pub fn find_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Reference to one of this class methods.
    pub fn method_ref(&self, method: &MethodDef) -> MethodRef {
        MethodRef::new(
            self.name.as_str(),
            method.name.as_str(),
            method.descriptor.as_str(),
        )
    }

    pub fn iter_method_refs(&self) -> impl Iterator<Item = (MethodRef, &MethodDef)> {
        self.methods.iter().map(|m| (self.method_ref(m), m))
    }
}
