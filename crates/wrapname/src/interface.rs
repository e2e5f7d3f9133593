//! Interface description pipeline.
//!
//! An [`Interface`] is a JSON document handed over by a front-end: naming
//! formats, template defaults, `rename`/`namewarn`/`feature` directives,
//! classes with their bases and members, and free declarations. Running it
//! registers everything, walks the class hierarchy, resolves every
//! declaration and derives the symbols a backend emits for it.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::diagnostics::Diagnostic;
use crate::equivalence::needs_redefinition_warning;
use crate::mangle::mangle;
use crate::naming::Role;
use crate::node::{Node, NodeKind, Parm, Storage};
use crate::resolve::{NamingContext, IGNORE};
use crate::rules::Keyword;
use crate::{Location, Result};

/// A registration directive, applied in document order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "directive", rename_all = "lowercase")]
pub enum Directive {
    Rename {
        #[serde(default)]
        scope: String,
        #[serde(default)]
        name: String,
        #[serde(default)]
        decl: Option<String>,
        to: String,
        #[serde(default)]
        keywords: Vec<Keyword>,
        #[serde(default)]
        parms: Vec<Parm>,
    },
    Namewarn {
        #[serde(default)]
        scope: String,
        #[serde(default)]
        name: String,
        #[serde(default)]
        decl: Option<String>,
        message: String,
        #[serde(default)]
        keywords: Vec<Keyword>,
        #[serde(default)]
        parms: Vec<Parm>,
    },
    Feature {
        #[serde(default)]
        name: String,
        #[serde(default)]
        decl: Option<String>,
        feature: String,
        /// Absent value deletes the feature
        #[serde(default)]
        value: Option<String>,
        #[serde(default)]
        attribs: Vec<Keyword>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateDecl {
    pub name: String,
    pub arity: usize,
    #[serde(default)]
    pub defaults: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassDecl {
    pub name: String,
    /// Enclosing namespace, empty for global classes
    #[serde(default)]
    pub scope: String,
    /// Fully qualified base class names
    #[serde(default)]
    pub bases: Vec<String>,
    #[serde(default)]
    pub members: Vec<Node>,
    #[serde(default)]
    pub location: Option<Location>,
}

impl ClassDecl {
    pub fn qualified_name(&self) -> String {
        scoped(&self.scope, &self.name)
    }
}

/// A complete interface description.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Interface {
    #[serde(default)]
    pub module: Option<String>,
    #[serde(default)]
    pub naming: BTreeMap<Role, String>,
    #[serde(default)]
    pub templates: Vec<TemplateDecl>,
    #[serde(default)]
    pub directives: Vec<Directive>,
    #[serde(default)]
    pub classes: Vec<ClassDecl>,
    #[serde(default)]
    pub declarations: Vec<Node>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolStatus {
    Wrapped,
    /// Renamed to `$ignore`
    Ignored,
    /// Shares its target name with an earlier declaration
    Redefined,
}

/// Emitter-facing result for one declaration.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedSymbol {
    pub name: String,
    pub scope: String,
    pub kind: NodeKind,
    pub target: String,
    pub status: SymbolStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wrapper: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub getter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub setter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constructor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destructor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disown: Option<String>,
    pub mangled: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub features: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl ResolvedSymbol {
    fn new(node: &Node, scope: &str, target: String, status: SymbolStatus) -> Self {
        Self {
            name: node.name.clone(),
            scope: scope.to_string(),
            kind: node.kind,
            mangled: mangle(&scoped(scope, &target)),
            target,
            status,
            wrapper: None,
            member: None,
            getter: None,
            setter: None,
            constructor: None,
            destructor: None,
            disown: None,
            features: node
                .attrs
                .iter()
                .filter(|(k, _)| k.starts_with("feature:"))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            location: node.location.clone(),
        }
    }
}

/// Output of [`Interface::run`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct InterfaceReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    pub symbols: Vec<ResolvedSymbol>,
    pub diagnostics: Vec<Diagnostic>,
}

impl InterfaceReport {
    pub fn wrapped(&self) -> impl Iterator<Item = &ResolvedSymbol> {
        self.symbols
            .iter()
            .filter(|s| s.status == SymbolStatus::Wrapped)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == crate::Severity::Error)
            .count()
    }
}

fn scoped(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}::{}", prefix, name)
    }
}

/// A copy constructor takes a single reference to its own class.
fn is_copy_constructor(node: &Node, class_name: &str) -> bool {
    match node.parms.as_slice() {
        [parm] => {
            let ty = parm.ty.strip_prefix("r.").unwrap_or("");
            let ty = ty.strip_prefix("q(const).").unwrap_or(ty);
            !ty.is_empty() && (ty == class_name || ty.ends_with(&format!("::{}", class_name)))
        }
        _ => false,
    }
}

fn is_variable(node: &Node) -> bool {
    node.kind == NodeKind::Cdecl
        && !node.is_function()
        && node.storage != Some(Storage::Typedef)
}

fn is_immutable(node: &Node) -> bool {
    node.attrs
        .get("feature:immutable")
        .is_some_and(|v| !v.is_empty() && v != "0")
}

/// Declarations already emitted under one target name, one per shape.
struct Emitted {
    nodes: Vec<Node>,
    overloads: usize,
}

/// Tracks target names per scope for redefinition checks.
#[derive(Default)]
struct SymbolTable {
    scopes: HashMap<(String, String), Emitted>,
}

impl Interface {
    /// Load an interface description from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let interface: Interface = serde_json::from_str(&text)?;
        tracing::debug!(
            "Loaded interface {:?}: {} directives, {} classes, {} declarations",
            path,
            interface.directives.len(),
            interface.classes.len(),
            interface.declarations.len()
        );
        Ok(interface)
    }

    fn register(&self, ctx: &mut NamingContext) -> Result<()> {
        for (role, template) in &self.naming {
            ctx.formats.register(*role, template)?;
        }
        for t in &self.templates {
            ctx.templates.register(&t.name, t.arity, t.defaults.clone());
        }
        for directive in &self.directives {
            match directive {
                Directive::Rename {
                    scope,
                    name,
                    decl,
                    to,
                    keywords,
                    parms,
                } => ctx.add_rename(scope, name, decl.as_deref(), to, keywords, parms)?,
                Directive::Namewarn {
                    scope,
                    name,
                    decl,
                    message,
                    keywords,
                    parms,
                } => ctx.add_warning(scope, name, decl.as_deref(), message, keywords, parms)?,
                Directive::Feature {
                    name,
                    decl,
                    feature,
                    value,
                    attribs,
                } => ctx.set_feature(name, decl.as_deref(), feature, value.as_deref(), attribs),
            }
        }
        Ok(())
    }

    /// Classes ordered so that each one follows every base it names that is
    /// declared in this document. Cyclic hierarchies are cut at the first
    /// class revisited.
    fn hierarchy_order(&self) -> Vec<&ClassDecl> {
        let by_name: HashMap<String, &ClassDecl> = self
            .classes
            .iter()
            .map(|c| (c.qualified_name(), c))
            .collect();
        let mut visited: HashSet<String> = HashSet::new();
        let mut order = Vec::with_capacity(self.classes.len());

        for class in &self.classes {
            let mut stack = vec![(class, false)];
            while let Some((current, bases_done)) = stack.pop() {
                if bases_done {
                    order.push(current);
                    continue;
                }
                if !visited.insert(current.qualified_name()) {
                    continue;
                }
                stack.push((current, true));
                for base in current.bases.iter().rev() {
                    if let Some(&parent) = by_name.get(base) {
                        if !visited.contains(base) {
                            stack.push((parent, false));
                        }
                    }
                }
            }
        }
        order
    }

    /// Register, inherit, resolve and check every declaration.
    ///
    /// Registration errors (bad formats or templates) abort the run; name
    /// warnings and redefinitions are collected as diagnostics.
    pub fn run(&self, ctx: &mut NamingContext) -> Result<InterfaceReport> {
        self.register(ctx)?;

        for class in self.hierarchy_order() {
            let derived = class.qualified_name();
            for base in &class.bases {
                ctx.inherit(base, &derived);
            }
        }

        let mut table = SymbolTable::default();
        let mut symbols = Vec::new();

        for decl in &self.declarations {
            let node = decl.clone();
            symbols.push(resolve_declaration(ctx, &mut table, node, "", None));
        }

        for class in &self.classes {
            let mut class_node = Node::new(NodeKind::Class, &class.name);
            class_node.location = class.location.clone();
            let class_symbol =
                resolve_declaration(ctx, &mut table, class_node.clone(), &class.scope, None);
            let class_target = class_symbol.target.clone();
            let class_status = class_symbol.status;
            symbols.push(class_symbol);

            if class_status == SymbolStatus::Ignored {
                continue;
            }
            let prefix = class.qualified_name();
            for member in &class.members {
                let node = member.clone().with_ref("parentNode", class_node.clone());
                symbols.push(resolve_declaration(
                    ctx,
                    &mut table,
                    node,
                    &prefix,
                    Some(&class_target),
                ));
            }
        }

        Ok(InterfaceReport {
            module: self.module.clone(),
            symbols,
            diagnostics: ctx.diagnostics.take(),
        })
    }
}

fn resolve_declaration(
    ctx: &mut NamingContext,
    table: &mut SymbolTable,
    mut node: Node,
    prefix: &str,
    class_target: Option<&str>,
) -> ResolvedSymbol {
    ctx.attach_features(prefix, &mut node);
    let target = ctx.resolve_node(&mut node, prefix);

    if target == IGNORE {
        tracing::debug!("'{}' ignored", scoped(prefix, &node.name));
        return ResolvedSymbol::new(&node, prefix, target, SymbolStatus::Ignored);
    }

    let mut overload = 0;
    let key = (prefix.to_string(), target.clone());
    match table.scopes.get_mut(&key) {
        Some(earlier) => {
            let overloadable = node.is_function()
                && earlier
                    .nodes
                    .iter()
                    .all(|n| n.kind == node.kind && n.is_function());
            let same_shape = earlier.nodes.iter().position(|n| n.decl == node.decl);
            if overloadable && same_shape.is_none() {
                earlier.overloads += 1;
                overload = earlier.overloads;
                earlier.nodes.push(node.clone());
            } else {
                // Compare against the declaration of the same shape, if any.
                let other = &earlier.nodes[same_shape.unwrap_or(0)];
                let in_class = class_target.is_some();
                if needs_redefinition_warning(other, &node, in_class) {
                    let message = format!(
                        "Identifier '{}' redefined by '{}' (ignored)",
                        target,
                        scoped(prefix, &node.name)
                    );
                    ctx.diagnostics.warning(&message, node.location.as_ref());
                }
                return ResolvedSymbol::new(&node, prefix, target, SymbolStatus::Redefined);
            }
        }
        None => {
            table.scopes.insert(
                key,
                Emitted {
                    nodes: vec![node.clone()],
                    overloads: 0,
                },
            );
        }
    }

    let mut symbol = ResolvedSymbol::new(&node, prefix, target.clone(), SymbolStatus::Wrapped);
    let formats = &ctx.formats;
    let wrap = |name: &str| {
        if overload > 0 {
            formats.wrapper_name(&format!("{}__SWIG_{}", name, overload))
        } else {
            formats.wrapper_name(name)
        }
    };

    match (node.kind, class_target) {
        (NodeKind::Constructor, Some(class)) => {
            let ctor = if is_copy_constructor(&node, &node.name) {
                formats.copy_constructor_name(class)
            } else {
                formats.constructor_name(class)
            };
            symbol.wrapper = Some(wrap(&ctor));
            symbol.constructor = Some(ctor);
        }
        (NodeKind::Destructor, Some(class)) => {
            let dtor = formats.destructor_name(class);
            symbol.wrapper = Some(formats.wrapper_name(&dtor));
            symbol.destructor = Some(dtor);
            symbol.disown = Some(formats.disown_name(class));
        }
        (NodeKind::Cdecl, Some(class)) if node.is_function() => {
            let member = formats.member_name(class, &target);
            symbol.wrapper = Some(wrap(&member));
            symbol.member = Some(member);
        }
        (NodeKind::Cdecl, Some(class)) if is_variable(&node) => {
            let member = formats.member_name(class, &target);
            symbol.getter = Some(formats.getter_name(&member));
            if !is_immutable(&node) {
                symbol.setter = Some(formats.setter_name(&member));
            }
            symbol.member = Some(member);
        }
        (NodeKind::Cdecl, None) if node.is_function() => {
            symbol.wrapper = Some(wrap(&target));
        }
        (NodeKind::Cdecl, None) if is_variable(&node) => {
            symbol.getter = Some(formats.getter_name(&target));
            if !is_immutable(&node) {
                symbol.setter = Some(formats.setter_name(&target));
            }
        }
        (NodeKind::Constant | NodeKind::EnumItem, _) => {
            symbol.wrapper = Some(formats.wrapper_name(&target));
        }
        _ => {}
    }
    symbol
}
