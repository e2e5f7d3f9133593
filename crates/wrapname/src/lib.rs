//! wrapname: name resolution and symbol derivation for binding generators
//!
//! This crate computes the target-language names of wrapped declarations:
//! - Identifier mangling for safe target symbols
//! - Naming formats for wrapper, member, accessor and lifecycle functions
//! - Rename and name-warning rules with a scope/template/wildcard cascade
//! - Feature attachment using the same cascade
//! - Redefinition checks for declarations sharing a resolved name

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod config;
pub mod diagnostics;
pub mod equivalence;
pub mod features;
pub mod interface;
pub mod mangle;
pub mod naming;
pub mod node;
pub mod resolve;
pub mod rules;
pub mod shape;

// Re-export main types
pub use config::Config;
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use features::FeatureStore;
pub use interface::{Interface, InterfaceReport, ResolvedSymbol};
pub use mangle::mangle;
pub use naming::{NamingFormats, Role};
pub use node::{Node, NodeKind, Parm, Storage};
pub use resolve::{NamingContext, IGNORE};
pub use rules::{Keyword, Rule, RuleStore};
pub use shape::TemplateDefaults;

/// A location in an interface file (file, line)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub file: PathBuf,
    pub line: u32, // 1-indexed line
}

impl Location {
    pub fn new(file: PathBuf, line: u32) -> Self {
        Self { file, line }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.file.display(), self.line)
    }
}

/// Access level of a declaration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    #[default]
    Public,
    Protected,
    Private,
}

impl std::fmt::Display for Access {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Access::Public => write!(f, "public"),
            Access::Protected => write!(f, "protected"),
            Access::Private => write!(f, "private"),
        }
    }
}

/// Errors that can occur while registering rules or loading interfaces
#[derive(Debug, thiserror::Error)]
pub enum NamingError {
    #[error("Invalid naming template for role '{role}': {template} (unknown placeholder '%{placeholder}')")]
    InvalidTemplate {
        role: String,
        template: String,
        placeholder: char,
    },

    #[error("Unknown naming role: {0}")]
    UnknownRole(String),

    #[error("Invalid name format '{format}': {reason}")]
    InvalidFormat { format: String, reason: String },

    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse interface: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, NamingError>;
