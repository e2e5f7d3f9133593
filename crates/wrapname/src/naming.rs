//! Naming formats for generated symbols.
//!
//! A target backend registers one template per [`Role`]; unregistered roles
//! fall back to built-in defaults. Templates use `%f` (function), `%c`
//! (class), `%m` (member) and `%v` (variable) placeholders.
//!
//! # Examples
//!
//! ```
//! use wrapname::{NamingFormats, Role};
//!
//! let mut formats = NamingFormats::new();
//! assert_eq!(formats.wrapper_name("foo"), "_wrap_foo");
//!
//! formats.register(Role::Wrapper, "XS_%f").unwrap();
//! assert_eq!(formats.wrapper_name("foo"), "XS_foo");
//! assert_eq!(formats.member_name("class Foo", "bar"), "Foo_bar");
//! ```

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::mangle::mangle;
use crate::shape;
use crate::{NamingError, Result};

/// Semantic role of a generated symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Wrapper,
    Member,
    Get,
    Set,
    Construct,
    Destroy,
    Disown,
}

impl Role {
    pub const ALL: [Role; 7] = [
        Role::Wrapper,
        Role::Member,
        Role::Get,
        Role::Set,
        Role::Construct,
        Role::Destroy,
        Role::Disown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Wrapper => "wrapper",
            Role::Member => "member",
            Role::Get => "get",
            Role::Set => "set",
            Role::Construct => "construct",
            Role::Destroy => "destroy",
            Role::Disown => "disown",
        }
    }

    /// Built-in template used when the role is unregistered.
    pub fn default_template(&self) -> &'static str {
        match self {
            Role::Wrapper => "_wrap_%f",
            Role::Member => "%c_%m",
            Role::Get => "%v_get",
            Role::Set => "%v_set",
            Role::Construct => "new_%c",
            Role::Destroy => "delete_%c",
            Role::Disown => "disown_%c",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = NamingError;

    fn from_str(s: &str) -> Result<Self> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| NamingError::UnknownRole(s.to_string()))
    }
}

const COPY_CONSTRUCT_DEFAULT: &str = "copy_%c";

/// Registry of role -> naming template.
#[derive(Debug, Clone, Default)]
pub struct NamingFormats {
    formats: HashMap<Role, String>,
}

/// Check that every `%` in `template` introduces a known placeholder.
fn validate_template(role: Role, template: &str) -> Result<()> {
    let mut chars = template.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            continue;
        }
        match chars.next() {
            Some('f' | 'c' | 'm' | 'v') => {}
            other => {
                return Err(NamingError::InvalidTemplate {
                    role: role.to_string(),
                    template: template.to_string(),
                    placeholder: other.unwrap_or('%'),
                })
            }
        }
    }
    Ok(())
}

/// Strip a leading `struct `/`class `/`union ` tag.
pub fn strip_type_tag(classname: &str) -> &str {
    for tag in ["struct ", "class ", "union "] {
        if let Some(rest) = classname.strip_prefix(tag) {
            return rest;
        }
    }
    classname
}

impl NamingFormats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template for `role`, replacing any previous one.
    pub fn register(&mut self, role: Role, template: &str) -> Result<()> {
        validate_template(role, template)?;
        tracing::debug!("naming format {} = {:?}", role, template);
        self.formats.insert(role, template.to_string());
        Ok(())
    }

    /// Remove the template for `role`; builders fall back to the default.
    pub fn unregister(&mut self, role: Role) {
        self.formats.remove(&role);
    }

    /// The template currently in effect for `role`.
    pub fn template(&self, role: Role) -> &str {
        self.formats
            .get(&role)
            .map(String::as_str)
            .unwrap_or_else(|| role.default_template())
    }

    fn class_template(&self, role: Role, default: &str, classname: &str) -> String {
        let template = self
            .formats
            .get(&role)
            .map(String::as_str)
            .unwrap_or(default);
        let cname = shape::namestr(classname);
        template.replace("%c", strip_type_tag(&cname))
    }

    /// Name of the wrapper function for `fname`, mangled.
    pub fn wrapper_name(&self, fname: &str) -> String {
        mangle(&self.template(Role::Wrapper).replace("%f", fname))
    }

    /// Name of a class member function. Not mangled.
    pub fn member_name(&self, classname: &str, mname: &str) -> String {
        self.class_template(Role::Member, Role::Member.default_template(), classname)
            .replace("%m", mname)
    }

    /// Name of the accessor reading variable `vname`.
    pub fn getter_name(&self, vname: &str) -> String {
        self.template(Role::Get).replace("%v", vname)
    }

    /// Name of the accessor writing variable `vname`.
    pub fn setter_name(&self, vname: &str) -> String {
        self.template(Role::Set).replace("%v", vname)
    }

    pub fn constructor_name(&self, classname: &str) -> String {
        self.class_template(
            Role::Construct,
            Role::Construct.default_template(),
            classname,
        )
    }

    /// Copy constructors share the `construct` role; only the default differs.
    pub fn copy_constructor_name(&self, classname: &str) -> String {
        self.class_template(Role::Construct, COPY_CONSTRUCT_DEFAULT, classname)
    }

    pub fn destructor_name(&self, classname: &str) -> String {
        self.class_template(Role::Destroy, Role::Destroy.default_template(), classname)
    }

    pub fn disown_name(&self, classname: &str) -> String {
        self.class_template(Role::Disown, Role::Disown.default_template(), classname)
    }
}
