//! Name resolution for wrapped declarations.
//!
//! [`NamingContext`] owns every registry used during one pipeline run:
//! naming formats, rename and name-warning rules, features and template
//! defaults. Directives are registered first; afterwards each emitted
//! symbol is passed through [`NamingContext::resolve`], which applies the
//! matching rename, then the matching name-warning rule, and falls back to
//! the original name.
//!
//! # Examples
//!
//! ```
//! use wrapname::{NamingContext, Node, NodeKind};
//!
//! let mut ctx = NamingContext::new();
//! ctx.add_rename("", "print", None, "print_", &[], &[]).unwrap();
//!
//! let node = Node::new(NodeKind::Cdecl, "print");
//! assert_eq!(ctx.resolve(&node, "", "print", None, None), "print_");
//! assert_eq!(ctx.resolve(&node, "", "other", None, None), "other");
//! ```

use std::collections::HashSet;

use crate::config::Config;
use crate::diagnostics::Diagnostics;
use crate::features::FeatureStore;
use crate::naming::NamingFormats;
use crate::node::{Node, NodeKind, Parm, Storage};
use crate::rules::{format_name, is_name_format, Keyword, Rule, RuleKind, RuleStore};
use crate::shape::{self, TemplateDefaults};
use crate::{Access, Result};

/// Rename payload that suppresses wrapping of the declaration.
pub const IGNORE: &str = "$ignore";

/// True if name warnings apply to `node` at all.
///
/// Class forwards produce no target symbol, typedefs have no effect in the
/// target language, and bare templates are only wrapped through explicit
/// instantiations.
pub fn needs_name_warning(node: &Node) -> bool {
    !(node.kind == NodeKind::ClassForward
        || node.storage == Some(Storage::Typedef)
        || node.hidden
        || node.ignore
        || node.template_type.is_some())
}

/// True if a protected member must be fully registered: virtual-like
/// functions, constructors and destructors.
pub fn needs_protected(node: &Node) -> bool {
    match node.kind {
        NodeKind::Cdecl if node.is_function() => {
            matches!(node.storage, None | Some(Storage::Virtual))
        }
        NodeKind::Constructor | NodeKind::Destructor => true,
        _ => false,
    }
}

/// Apply a rename payload to `name`.
///
/// `%s` payloads are formats fed with `name` (or `prefix`, `name` when
/// `fullname` is set); for destructors the format gets a leading `~`.
/// Other payloads are used verbatim.
pub fn apply_rename(newname: &str, fullname: bool, prefix: &str, name: &str) -> Option<String> {
    if newname.is_empty() {
        return None;
    }
    if newname == IGNORE {
        return Some(IGNORE.to_string());
    }
    if !is_name_format(newname) {
        return Some(newname.to_string());
    }
    let fmt = if name.starts_with('~') && !newname.starts_with('~') {
        format!("~{}", newname)
    } else {
        newname.to_string()
    };
    let result = if fullname && !prefix.is_empty() {
        format_name(&fmt, &[prefix, name])
    } else {
        format_name(&fmt, &[name])
    };
    Some(result)
}

/// All naming state for one pipeline run.
#[derive(Debug)]
pub struct NamingContext {
    pub formats: NamingFormats,
    pub renames: RuleStore,
    pub warnings: RuleStore,
    pub features: FeatureStore,
    pub templates: TemplateDefaults,
    pub diagnostics: Diagnostics,
    /// Names whose warning message was already reported
    warned: HashSet<String>,
    warn_protected: bool,
}

impl Default for NamingContext {
    fn default() -> Self {
        Self::new()
    }
}

impl NamingContext {
    pub fn new() -> Self {
        Self {
            formats: NamingFormats::new(),
            renames: RuleStore::new(RuleKind::Rename),
            warnings: RuleStore::new(RuleKind::Warning),
            features: FeatureStore::new(),
            templates: TemplateDefaults::new(),
            diagnostics: Diagnostics::new(),
            warned: HashSet::new(),
            warn_protected: true,
        }
    }

    /// Build a context with the naming formats and options from `config`.
    ///
    /// Invalid templates are reported and skipped.
    pub fn from_config(config: &Config) -> Self {
        let mut ctx = Self::new();
        ctx.warn_protected = config.warn_protected;
        for (role, template) in &config.naming {
            if let Err(e) = ctx.formats.register(*role, template) {
                tracing::warn!("Config error: {}", e);
            }
        }
        ctx
    }

    /// Register a rename of `prefix::name` (shape `decl`) to `newname`.
    pub fn add_rename(
        &mut self,
        prefix: &str,
        name: &str,
        decl: Option<&str>,
        newname: &str,
        keywords: &[Keyword],
        parms: &[Parm],
    ) -> Result<()> {
        self.renames
            .add(prefix, name, decl, Rule::new(newname), keywords, parms)
    }

    /// Register a name warning with diagnostic `message`.
    pub fn add_warning(
        &mut self,
        prefix: &str,
        name: &str,
        decl: Option<&str>,
        message: &str,
        keywords: &[Keyword],
        parms: &[Parm],
    ) -> Result<()> {
        self.warnings
            .add(prefix, name, decl, Rule::new(message), keywords, parms)
    }

    pub fn set_feature(
        &mut self,
        name: &str,
        decl: Option<&str>,
        feature: &str,
        value: Option<&str>,
        attribs: &[Keyword],
    ) {
        self.features
            .set(name, decl, feature, value, attribs, &self.templates);
    }

    /// Merge matching features onto `node`, using its own name and shape.
    pub fn attach_features(&self, prefix: &str, node: &mut Node) {
        let name = node.name.clone();
        let decl = node.decl.clone();
        self.features
            .attach(prefix, &name, decl.as_deref(), node, &self.templates);
    }

    /// Propagate renames, warnings and features from `base` to `derived`.
    pub fn inherit(&mut self, base: &str, derived: &str) {
        tracing::debug!("inherit naming rules {} -> {}", base, derived);
        self.renames.propagate(base, derived);
        self.warnings.propagate(base, derived);
        self.features.propagate(base, derived);
    }

    fn has_rules(&self) -> bool {
        !(self.renames.is_empty() && self.warnings.is_empty())
    }

    /// The warning rule matching `node`, without reporting anything.
    fn find_warning(
        &self,
        node: &Node,
        prefix: &str,
        name: &str,
        decl: Option<&str>,
    ) -> Option<&Rule> {
        if self.warnings.is_empty() || name.is_empty() || !needs_name_warning(node) {
            return None;
        }
        if node.access != Access::Public && !(self.warn_protected && needs_protected(node)) {
            return None;
        }
        self.warnings.find(Some(node), prefix, name, decl)
    }

    /// The warning rule matching `node`. Rules marked `error` are reported
    /// as errors on every match.
    pub fn warning_rule(
        &mut self,
        node: &Node,
        prefix: &str,
        name: &str,
        decl: Option<&str>,
    ) -> Option<Rule> {
        let rule = self.find_warning(node, prefix, name, decl)?.clone();
        if rule.error {
            self.diagnostics.error(&rule.name, node.location.as_ref());
        }
        Some(rule)
    }

    /// The warning message for `node`, if a warning rule matches.
    pub fn name_warning(
        &mut self,
        node: &Node,
        prefix: &str,
        name: &str,
        decl: Option<&str>,
    ) -> Option<String> {
        self.warning_rule(node, prefix, name, decl)
            .map(|rule| rule.name)
    }

    /// The name used for rule lookups: `name` itself, or its
    /// default-argument-normalized spelling when only that one has rules.
    fn lookup_name(&self, node: &Node, prefix: &str, name: &str, decl: Option<&str>) -> String {
        let literal_hit = |n: &str| {
            self.renames.find(Some(node), prefix, n, decl).is_some()
                || self.find_warning(node, prefix, n, decl).is_some()
        };
        if !shape::is_template(name) || literal_hit(name) {
            return name.to_string();
        }
        let dname = self.templates.deftype(name);
        if dname != name && literal_hit(&dname) {
            tracing::debug!("'{}' resolved through '{}'", name, dname);
            return dname;
        }
        name.to_string()
    }

    /// Compute the target name of `node` declared as `prefix::name` with
    /// shape `decl`. Returns `oldname` (or `name`) when no rule applies and
    /// [`IGNORE`] when the declaration should not be wrapped.
    pub fn resolve(
        &mut self,
        node: &Node,
        prefix: &str,
        name: &str,
        decl: Option<&str>,
        oldname: Option<&str>,
    ) -> String {
        let fallback = || oldname.unwrap_or(name).to_string();
        if !self.has_rules() {
            return fallback();
        }

        let lname = self.lookup_name(node, prefix, name, decl);
        let mut result = self
            .renames
            .find(Some(node), prefix, &lname, decl)
            .and_then(|rule| apply_rename(&rule.name, rule.fullname, prefix, name));

        let nname = result.clone().unwrap_or(lname);
        if let Some(wrn) = self.warning_rule(node, prefix, &nname, decl) {
            if let Some(rename) = wrn.rename.as_deref() {
                result = apply_rename(rename, wrn.fullname, prefix, name);
            }
            if !wrn.error && !wrn.name.is_empty() && !self.warned.contains(&nname) {
                self.diagnostics.warning(&wrn.name, node.location.as_ref());
                self.warned.insert(nname);
            }
        }

        match result {
            Some(r) if !r.is_empty() => r,
            _ => fallback(),
        }
    }

    /// Resolve `node` by its own name and shape and record the result in
    /// its `sym_name`.
    pub fn resolve_node(&mut self, node: &mut Node, prefix: &str) -> String {
        let name = node.name.clone();
        let decl = node.decl.clone();
        let oldname = node.sym_name.clone();
        let resolved = self.resolve(node, prefix, &name, decl.as_deref(), oldname.as_deref());
        node.sym_name = Some(resolved.clone());
        resolved
    }
}
