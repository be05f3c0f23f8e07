use std::fmt;

use serde::{Deserialize, Serialize};

/// Address of one entity inside a release tree.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityPath {
    Class {
        class: String,
    },
    Field {
        class: String,
        name: String,
        descriptor: Option<String>,
    },
    Method {
        class: String,
        name: String,
        descriptor: String,
    },
    Parameter {
        class: String,
        method: String,
        descriptor: String,
        index: u16,
    },
}

impl EntityPath {
    pub fn class(class: impl Into<String>) -> Self {
        Self::Class {
            class: class.into(),
        }
    }

    /// Owning class of the addressed entity.
    pub fn owner(&self) -> &str {
        match self {
            Self::Class { class }
            | Self::Field { class, .. }
            | Self::Method { class, .. }
            | Self::Parameter { class, .. } => class,
        }
    }
}

impl fmt::Display for EntityPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Class { class } => write!(f, "{class}"),
            Self::Field {
                class,
                name,
                descriptor: Some(desc),
            } => write!(f, "{class}.{name}:{desc}"),
            Self::Field { class, name, .. } => write!(f, "{class}.{name}"),
            Self::Method {
                class,
                name,
                descriptor,
            } => write!(f, "{class}.{name}{descriptor}"),
            Self::Parameter {
                class,
                method,
                descriptor,
                index,
            } => write!(f, "{class}.{method}{descriptor}#{index}"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A finding attached to one entity of a release tree.
///
/// Warnings leave the entity in place with partial data; errors mean the
/// entity was excluded from the tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub path: EntityPath,
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    pub fn new(path: EntityPath, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            path,
            severity,
            message: message.into(),
        }
    }

    pub fn info(path: EntityPath, message: impl Into<String>) -> Self {
        Self::new(path, Severity::Info, message)
    }

    pub fn warning(path: EntityPath, message: impl Into<String>) -> Self {
        Self::new(path, Severity::Warning, message)
    }

    pub fn error(path: EntityPath, message: impl Into<String>) -> Self {
        Self::new(path, Severity::Error, message)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}: {}", self.severity, self.path, self.message)
    }
}
