//! Symbolic references to methods and fields, as resolved by the decoder
//! from instruction operands.

use crate::errors::{CodeError, CodeResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A `(class, method, descriptor)` triple. It identifies a method both as a
/// call target operand and as a call graph node.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MethodRef {
    class: String,
    name: String,
    descriptor: String,
}

impl MethodRef {
    pub fn new(
        class: impl Into<String>,
        name: impl Into<String>,
        descriptor: impl Into<String>,
    ) -> Self {
        Self {
            class: class.into(),
            name: name.into(),
            descriptor: descriptor.into(),
        }
    }

    /// Parses signature text of the form `class->name(params)ret`.
    ///
    /// The descriptor is everything from the opening parenthesis to the end
    /// of the text, so a missing return type is accepted.
    pub fn parse(text: &str) -> CodeResult<Self> {
        let text = text.trim();
        let malformed = || CodeError::MalformedSignature(text.to_string());
        let (class, rest) = text.split_once("->").ok_or_else(malformed)?;
        let paren = rest.find('(').ok_or_else(malformed)?;
        let (name, descriptor) = rest.split_at(paren);
        if class.is_empty() || name.is_empty() {
            return Err(malformed());
        }
        Ok(Self::new(class, name, descriptor))
    }

    #[inline]
    pub fn class_name(&self) -> &str {
        &self.class
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    /// Same method name and descriptor, looked up on another class.
    #[must_use]
    pub fn with_class(&self, class: &str) -> Self {
        Self::new(class, self.name.as_str(), self.descriptor.as_str())
    }

    /// Concatenation of class, name and descriptor, used as prefix of
    /// exported node identifiers.
    #[must_use]
    pub fn signature(&self) -> String {
        format!("{}{}{}", self.class, self.name, self.descriptor)
    }
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}->{}{}", self.class, self.name, self.descriptor)
    }
}

/// A field operand: declaring class, field name and field type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FieldRef {
    class: String,
    name: String,
    type_: String,
}

impl FieldRef {
    pub fn new(
        class: impl Into<String>,
        name: impl Into<String>,
        type_: impl Into<String>,
    ) -> Self {
        Self {
            class: class.into(),
            name: name.into(),
            type_: type_.into(),
        }
    }

    #[inline]
    pub fn class_name(&self) -> &str {
        &self.class
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn type_(&self) -> &str {
        &self.type_
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}->{}", self.type_, self.class, self.name)
    }
}
