//! Rename and name-warning rule storage.
//!
//! A [`RuleStore`] keeps two collections:
//! - an exact table keyed by `scope::name` and then by declaration shape
//!   (`None` meaning "any shape")
//! - an ordered fallback list for rules that carry match predicates or a
//!   source format and so cannot be reduced to a single key
//!
//! Lookups walk a fixed cascade of keys (exact scope, wildcard class,
//! template prefixes, wildcard name, global) and return the first hit.
//! Fallback-list entries are evaluated in registration order.
//!
//! # Examples
//!
//! ```
//! use wrapname::{Rule, RuleStore};
//! use wrapname::rules::RuleKind;
//!
//! let mut store = RuleStore::new(RuleKind::Rename);
//! store.add("Shape", "area", None, Rule::new("get_area"), &[], &[]).unwrap();
//!
//! let rule = store.lookup("Shape", "area", Some("f().")).unwrap();
//! assert_eq!(rule.name, "get_area");
//! assert!(store.lookup("Other", "area", None).is_none());
//! ```

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::node::{Node, Parm};
use crate::shape;
use crate::{NamingError, Result};

/// Wildcard sentinel: as a scope it matches any class, as a name it
/// matches every declaration in a scope.
pub const START: &str = "*";

/// A `name=value` keyword attached to a rename or warning directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyword {
    pub name: String,
    pub value: String,
}

impl Keyword {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

/// Requirement that an attribute of the candidate node equals a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchPredicate {
    /// Attribute path, dotted to reach related nodes
    pub path: String,
    pub value: String,
}

impl MatchPredicate {
    /// Build a predicate from a `match*` keyword.
    ///
    /// `match` tests `nodeType`; `match$path` and `match.path` test `path`.
    pub fn from_keyword(kw: &Keyword) -> Option<Self> {
        let rest = kw.name.strip_prefix("match")?;
        let path = match rest.find(['$', '.']) {
            Some(pos) => &rest[pos + 1..],
            None => "nodeType",
        };
        Some(Self {
            path: path.to_string(),
            value: kw.value.clone(),
        })
    }

    pub fn matches(&self, node: Option<&Node>) -> bool {
        node.and_then(|n| n.attr(&self.path))
            .is_some_and(|v| v == self.value)
    }
}

/// Which collection a store holds; decides the recognized keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    Rename,
    Warning,
}

impl RuleKind {
    fn keys(&self) -> &'static [&'static str] {
        match self {
            RuleKind::Rename => &["fullname", "sourcefmt", "targetfmt"],
            RuleKind::Warning => &["rename", "error", "fullname", "sourcefmt", "targetfmt"],
        }
    }
}

/// A rename or name-warning rule.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rule {
    /// Target name (rename rules) or diagnostic message (warning rules)
    pub name: String,
    /// Feed `scope` and `name` to the format instead of just `name`
    #[serde(default)]
    pub fullname: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sourcefmt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub targetfmt: Option<String>,
    /// Rename applied along with a warning
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rename: Option<String>,
    /// Report the message as an error instead of a warning
    #[serde(default)]
    pub error: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matchlist: Vec<MatchPredicate>,
    /// Shape recorded for fallback-list entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decl: Option<String>,
    /// Source name recorded for fallback-list entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub targetname: Option<String>,
}

fn flag(value: &str) -> bool {
    !value.is_empty() && value != "0"
}

impl Rule {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Move recognized keywords into the rule. `match*` keywords become
    /// predicates; anything else is ignored.
    pub fn attach_keys(&mut self, kind: RuleKind, keywords: &[Keyword]) {
        for kw in keywords {
            if let Some(pred) = MatchPredicate::from_keyword(kw) {
                self.matchlist.push(pred);
                continue;
            }
            if !kind.keys().contains(&kw.name.as_str()) {
                continue;
            }
            match kw.name.as_str() {
                "fullname" => self.fullname = flag(&kw.value),
                "sourcefmt" => self.sourcefmt = Some(kw.value.clone()),
                "targetfmt" => self.targetfmt = Some(kw.value.clone()),
                "rename" => self.rename = Some(kw.value.clone()),
                "error" => self.error = flag(&kw.value),
                _ => {}
            }
        }
    }

    /// True if every match predicate holds for `node`.
    pub fn matches(&self, node: Option<&Node>) -> bool {
        self.matchlist.iter().all(|p| p.matches(node))
    }

    /// Rules with predicates or a source format live in the fallback list.
    fn needs_list(&self) -> bool {
        self.sourcefmt.is_some() || !self.matchlist.is_empty()
    }

    fn validate(&self, kind: RuleKind) -> Result<()> {
        if kind == RuleKind::Rename && is_name_format(&self.name) {
            validate_format(&self.name)?;
        }
        if let Some(rename) = self.rename.as_deref().filter(|r| is_name_format(r)) {
            validate_format(rename)?;
        }
        for fmt in [&self.sourcefmt, &self.targetfmt].into_iter().flatten() {
            validate_format(fmt)?;
        }
        Ok(())
    }
}

/// True if a rename payload is a `%s` format rather than a literal name.
///
/// The single-character `%` and the `%=` operator name are literals.
pub fn is_name_format(payload: &str) -> bool {
    payload.len() > 1 && payload.contains('%') && payload != "%="
}

/// Reject formats using directives other than `%s`/`%%` or taking more than
/// two arguments.
pub fn validate_format(fmt: &str) -> Result<()> {
    let invalid = |reason: String| NamingError::InvalidFormat {
        format: fmt.to_string(),
        reason,
    };
    let mut args = 0;
    let mut chars = fmt.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            continue;
        }
        match chars.next() {
            Some('s') => args += 1,
            Some(d) if d.is_ascii_alphabetic() => {
                return Err(invalid(format!("unsupported directive '%{}'", d)));
            }
            _ => {}
        }
    }
    if args > 2 {
        return Err(invalid(format!("{} arguments, at most 2 allowed", args)));
    }
    Ok(())
}

/// Substitute `args` into the successive `%s` of `fmt`; `%%` is a literal `%`.
pub fn format_name(fmt: &str, args: &[&str]) -> String {
    let mut out = String::with_capacity(fmt.len() + 16);
    let mut args = args.iter();
    let mut chars = fmt.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('s') => {
                chars.next();
                out.push_str(args.next().copied().unwrap_or(""));
            }
            Some('%') => {
                chars.next();
                out.push('%');
            }
            _ => out.push('%'),
        }
    }
    out
}

fn scoped(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}::{}", prefix, name)
    }
}

/// One step of the lookup cascade.
enum Probe {
    Key(String),
    Expand { prefix: String, name: String },
}

/// Iterator over the keys probed for `(prefix, name)`, in priority order.
///
/// Template and wildcard reductions are queued on an explicit stack rather
/// than handled by recursion. Keys already probed are skipped.
pub struct Cascade {
    stack: Vec<Probe>,
    seen: HashSet<String>,
}

impl Cascade {
    pub fn new(prefix: &str, name: &str) -> Self {
        Self {
            stack: vec![Probe::Expand {
                prefix: prefix.to_string(),
                name: name.to_string(),
            }],
            seen: HashSet::new(),
        }
    }

    fn expand(prefix: &str, name: &str) -> Vec<Probe> {
        let mut probes = Vec::new();
        if prefix.is_empty() {
            probes.push(Probe::Key(format!("::{}", name)));
        } else {
            probes.push(Probe::Key(format!("{}::{}", prefix, name)));
            let cls = shape::scopename_last(prefix);
            if cls != prefix {
                probes.push(Probe::Key(format!("*::{}::{}", cls, name)));
            }
            if shape::is_template(name) {
                let t_name = shape::template_prefix(name);
                if t_name != name {
                    probes.push(Probe::Expand {
                        prefix: prefix.to_string(),
                        name: t_name.to_string(),
                    });
                }
            }
            if shape::is_template(prefix) {
                let t_prefix = shape::template_prefix(prefix);
                if t_prefix != prefix {
                    probes.push(Probe::Expand {
                        prefix: t_prefix.to_string(),
                        name: shape::template_prefix(name).to_string(),
                    });
                }
            }
            if name != START {
                probes.push(Probe::Expand {
                    prefix: prefix.to_string(),
                    name: START.to_string(),
                });
            }
            probes.push(Probe::Key(format!("*::{}", name)));
        }
        probes.push(Probe::Key(name.to_string()));
        probes.push(Probe::Key(START.to_string()));
        probes
    }
}

impl Iterator for Cascade {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        while let Some(probe) = self.stack.pop() {
            match probe {
                Probe::Key(key) => {
                    if self.seen.insert(key.clone()) {
                        return Some(key);
                    }
                }
                Probe::Expand { prefix, name } => {
                    let children = Self::expand(&prefix, &name);
                    self.stack.extend(children.into_iter().rev());
                }
            }
        }
        None
    }
}

/// Shape -> rule, `None` holding the shape-agnostic entry.
pub type ShapeTable = HashMap<Option<String>, Rule>;

/// Exact table plus ordered fallback list.
#[derive(Debug, Clone)]
pub struct RuleStore {
    kind: RuleKind,
    table: HashMap<String, ShapeTable>,
    list: Vec<Rule>,
}

impl RuleStore {
    pub fn new(kind: RuleKind) -> Self {
        Self {
            kind,
            table: HashMap::new(),
            list: Vec::new(),
        }
    }

    pub fn kind(&self) -> RuleKind {
        self.kind
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty() && self.list.is_empty()
    }

    /// Number of exact-table keys.
    pub fn key_count(&self) -> usize {
        self.table.len()
    }

    pub fn fallback_rules(&self) -> &[Rule] {
        &self.list
    }

    /// Register a rule for `prefix::name` with optional shape `decl`.
    ///
    /// `keywords` are attached first. When `decl` is a function shape and
    /// `parms` has defaulted parameters, one extra entry is registered per
    /// elided trailing parameter so call forms without the defaults match.
    ///
    /// Exact-table entries for an identical key overwrite earlier ones;
    /// fallback-list entries are never deduplicated and are evaluated in
    /// registration order.
    pub fn add(
        &mut self,
        prefix: &str,
        name: &str,
        decl: Option<&str>,
        mut rule: Rule,
        keywords: &[Keyword],
        parms: &[Parm],
    ) -> Result<()> {
        rule.attach_keys(self.kind, keywords);
        rule.validate(self.kind)?;

        self.add_single(prefix, name, decl, rule.clone());

        if let Some(decl) = decl {
            let mut parms = parms.to_vec();
            while parms.iter().any(Parm::has_default) {
                parms.pop();
                let types: Vec<&str> = parms.iter().map(|p| p.ty.as_str()).collect();
                let Some(reduced) = shape::replace_parms(decl, &types) else {
                    break;
                };
                self.add_single(prefix, name, Some(&reduced), rule.clone());
            }
        }
        Ok(())
    }

    fn add_single(&mut self, prefix: &str, name: &str, decl: Option<&str>, mut rule: Rule) {
        let nname = if name.is_empty() {
            String::new()
        } else {
            let full = scoped(prefix, name);
            match rule.targetfmt.as_deref() {
                Some(fmt) => format_name(fmt, &[&full]),
                None => full,
            }
        };

        if nname.is_empty() || rule.needs_list() {
            tracing::debug!(
                "{:?} rule '{}' appended to fallback list (decl {:?})",
                self.kind,
                nname,
                decl
            );
            rule.decl = decl.map(str::to_string);
            if !nname.is_empty() {
                rule.targetname = Some(nname);
            }
            self.list.push(rule);
        } else {
            tracing::debug!("{:?} rule '{}' stored (decl {:?})", self.kind, nname, decl);
            self.table
                .entry(nname)
                .or_default()
                .insert(decl.map(str::to_string), rule);
        }
    }

    fn probe(&self, key: &str, decl: Option<&str>) -> Option<&Rule> {
        let entries = self.table.get(key)?;
        tracing::trace!("probe '{}' decl {:?}", key, decl);
        if let Some(decl) = decl {
            if let Some(rule) = entries.get(&Some(decl.to_string())) {
                return Some(rule);
            }
        }
        entries.get(&None)
    }

    /// Walk the exact-table cascade for `(prefix, name, decl)`.
    pub fn lookup(&self, prefix: &str, name: &str, decl: Option<&str>) -> Option<&Rule> {
        if self.table.is_empty() {
            return None;
        }
        Cascade::new(prefix, name).find_map(|key| self.probe(&key, decl))
    }

    /// Scan the fallback list in registration order.
    pub fn lookup_list(
        &self,
        node: Option<&Node>,
        prefix: &str,
        name: &str,
        decl: Option<&str>,
    ) -> Option<&Rule> {
        self.list.iter().find(|rule| {
            if let Some(rdecl) = rule.decl.as_deref() {
                if decl != Some(rdecl) {
                    return false;
                }
            }
            if !rule.matches(node) {
                return false;
            }
            let Some(target) = rule.targetname.as_deref() else {
                return true;
            };
            let use_prefix = rule.fullname && !prefix.is_empty();
            let sname = match rule.sourcefmt.as_deref() {
                Some(fmt) if use_prefix => format_name(fmt, &[prefix, name]),
                Some(fmt) => format_name(fmt, &[name]),
                None if use_prefix => scoped(prefix, name),
                None => name.to_string(),
            };
            sname == target
        })
    }

    /// Table cascade filtered by the rule's predicates, then the fallback list.
    pub fn find(
        &self,
        node: Option<&Node>,
        prefix: &str,
        name: &str,
        decl: Option<&str>,
    ) -> Option<&Rule> {
        self.lookup(prefix, name, decl)
            .filter(|rule| rule.matches(node))
            .or_else(|| self.lookup_list(node, prefix, name, decl))
    }

    /// Copy every `base::`-prefixed entry to the matching `derived::` key,
    /// keeping entries the derived scope already defines.
    pub fn propagate(&mut self, base: &str, derived: &str) {
        let bprefix = format!("{}::", base);
        let inherited: Vec<(String, ShapeTable)> = self
            .table
            .iter()
            .filter_map(|(key, entries)| {
                key.strip_prefix(&bprefix)
                    .map(|rest| (format!("{}::{}", derived, rest), entries.clone()))
            })
            .collect();

        for (nkey, entries) in inherited {
            tracing::debug!("{:?} rules inherited as '{}'", self.kind, nkey);
            let target = self.table.entry(nkey).or_default();
            for (decl, rule) in entries {
                target.entry(decl).or_insert(rule);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeKind;

    fn rename_store() -> RuleStore {
        RuleStore::new(RuleKind::Rename)
    }

    #[test]
    fn test_cascade_order_for_scoped_name() {
        let keys: Vec<String> = Cascade::new("ns::A", "foo").collect();
        assert_eq!(
            keys,
            vec![
                "ns::A::foo",
                "*::A::foo",
                "ns::A::*",
                "*::A::*",
                "*::*",
                "*",
                "*::foo",
                "foo",
            ]
        );
    }

    #[test]
    fn test_cascade_order_for_global_name() {
        let keys: Vec<String> = Cascade::new("", "foo").collect();
        assert_eq!(keys, vec!["::foo", "foo", "*"]);
    }

    #[test]
    fn test_cascade_template_reductions() {
        let keys: Vec<String> = Cascade::new("Box<(int)>", "get<(T)>").collect();
        let pos = |k: &str| keys.iter().position(|x| x == k).unwrap();
        assert!(pos("Box<(int)>::get<(T)>") < pos("Box<(int)>::get"));
        assert!(pos("Box<(int)>::get") < pos("Box::get"));
        assert!(pos("Box::get") < pos("Box<(int)>::*"));
        assert!(pos("Box<(int)>::*") < pos("*::get<(T)>"));
        assert_eq!(keys.last().map(String::as_str), Some("get<(T)>"));
    }

    #[test]
    fn test_exact_rule_goes_to_table() {
        let mut store = rename_store();
        store.add("", "oldName", None, Rule::new("newName"), &[], &[]).unwrap();
        assert_eq!(store.key_count(), 1);
        assert!(store.fallback_rules().is_empty());
        assert_eq!(store.lookup("", "oldName", None).unwrap().name, "newName");
    }

    #[test]
    fn test_predicate_rule_goes_to_list() {
        let mut store = rename_store();
        store
            .add(
                "",
                "Foo",
                None,
                Rule::new("make_foo"),
                &[Keyword::new("match", "constructor")],
                &[],
            )
            .unwrap();
        assert_eq!(store.key_count(), 0);
        assert_eq!(store.fallback_rules().len(), 1);
        assert_eq!(
            store.fallback_rules()[0].targetname.as_deref(),
            Some("Foo")
        );

        let ctor = Node::new(NodeKind::Constructor, "Foo");
        let class = Node::new(NodeKind::Class, "Foo");
        assert!(store.find(Some(&ctor), "", "Foo", None).is_some());
        assert!(store.find(Some(&class), "", "Foo", None).is_none());
        assert!(store.find(None, "", "Foo", None).is_none());
    }

    #[test]
    fn test_shape_specific_before_shape_agnostic() {
        let mut store = rename_store();
        store.add("A", "f", None, Rule::new("any"), &[], &[]).unwrap();
        store
            .add("A", "f", Some("f(int)."), Rule::new("int_only"), &[], &[])
            .unwrap();
        assert_eq!(store.lookup("A", "f", Some("f(int).")).unwrap().name, "int_only");
        assert_eq!(store.lookup("A", "f", Some("f(double).")).unwrap().name, "any");
        assert_eq!(store.lookup("A", "f", None).unwrap().name, "any");
    }

    #[test]
    fn test_shape_rule_does_not_match_other_shapes() {
        let mut store = rename_store();
        store
            .add("A", "f", Some("f(int)."), Rule::new("int_only"), &[], &[])
            .unwrap();
        assert!(store.lookup("A", "f", Some("f(double).")).is_none());
        assert!(store.lookup("A", "f", None).is_none());
    }

    #[test]
    fn test_default_argument_variants() {
        let mut store = rename_store();
        let parms = vec![
            Parm::new("int"),
            Parm::new("int").with_default("0"),
            Parm::new("double").with_default("1.0"),
        ];
        store
            .add(
                "A",
                "foo",
                Some("q(const).f(int,int,double)."),
                Rule::new("bar"),
                &[],
                &parms,
            )
            .unwrap();
        for decl in [
            "q(const).f(int,int,double).",
            "q(const).f(int,int).",
            "q(const).f(int).",
        ] {
            assert_eq!(store.lookup("A", "foo", Some(decl)).unwrap().name, "bar");
        }
        assert!(store.lookup("A", "foo", Some("q(const).f().")).is_none());
    }

    #[test]
    fn test_wildcard_class_and_scope() {
        let mut store = rename_store();
        store.add("*", "size", None, Rule::new("length"), &[], &[]).unwrap();
        assert_eq!(store.lookup("Vec", "size", None).unwrap().name, "length");
        assert!(store.lookup("", "size", None).is_none());

        store.add("*::Inner", "get", None, Rule::new("fetch"), &[], &[]).unwrap();
        assert_eq!(store.lookup("outer::Inner", "get", None).unwrap().name, "fetch");
    }

    #[test]
    fn test_rename_everything_in_scope() {
        let mut store = rename_store();
        store.add("Legacy", START, None, Rule::new("old_%s"), &[], &[]).unwrap();
        assert_eq!(store.lookup("Legacy", "anything", None).unwrap().name, "old_%s");
    }

    #[test]
    fn test_template_fallbacks() {
        let mut store = rename_store();
        store.add("Box", "get", None, Rule::new("fetch"), &[], &[]).unwrap();
        assert_eq!(store.lookup("Box<(int)>", "get", None).unwrap().name, "fetch");

        store.add("", "make", None, Rule::new("build"), &[], &[]).unwrap();
        assert_eq!(store.lookup("Factory", "make<(int)>", None).unwrap().name, "build");
    }

    #[test]
    fn test_exact_overwrite() {
        let mut store = rename_store();
        store.add("", "f", None, Rule::new("first"), &[], &[]).unwrap();
        store.add("", "f", None, Rule::new("second"), &[], &[]).unwrap();
        assert_eq!(store.lookup("", "f", None).unwrap().name, "second");
    }

    #[test]
    fn test_fallback_list_first_match_wins() {
        let mut store = rename_store();
        let kw = [Keyword::new("match", "cdecl")];
        store.add("", "f", None, Rule::new("first"), &kw, &[]).unwrap();
        store.add("", "f", None, Rule::new("second"), &kw, &[]).unwrap();
        let node = Node::new(NodeKind::Cdecl, "f");
        assert_eq!(store.find(Some(&node), "", "f", None).unwrap().name, "first");
    }

    #[test]
    fn test_sourcefmt_and_targetfmt() {
        let mut store = rename_store();
        store
            .add(
                "",
                "foo",
                None,
                Rule::new("%s_renamed"),
                &[
                    Keyword::new("sourcefmt", "get_%s"),
                    Keyword::new("targetfmt", "get_%s"),
                ],
                &[],
            )
            .unwrap();
        let rule = &store.fallback_rules()[0];
        assert_eq!(rule.targetname.as_deref(), Some("get_foo"));
        assert!(store.find(None, "", "foo", None).is_some());
        assert!(store.find(None, "", "bar", None).is_none());
    }

    #[test]
    fn test_fallback_shape_filter() {
        let mut store = rename_store();
        store
            .add(
                "",
                "f",
                Some("f(int)."),
                Rule::new("g"),
                &[Keyword::new("match", "cdecl")],
                &[],
            )
            .unwrap();
        let node = Node::new(NodeKind::Cdecl, "f");
        assert!(store.find(Some(&node), "", "f", Some("f(int).")).is_some());
        assert!(store.find(Some(&node), "", "f", Some("f(char).")).is_none());
        assert!(store.find(Some(&node), "", "f", None).is_none());
    }

    #[test]
    fn test_dotted_predicate() {
        let mut store = rename_store();
        store
            .add(
                "",
                "f",
                None,
                Rule::new("g"),
                &[Keyword::new("match$parentNode.nodeType", "class")],
                &[],
            )
            .unwrap();
        let parent = Node::new(NodeKind::Class, "C");
        let member = Node::new(NodeKind::Cdecl, "f").with_ref("parentNode", parent);
        let free = Node::new(NodeKind::Cdecl, "f");
        assert!(store.find(Some(&member), "", "f", None).is_some());
        assert!(store.find(Some(&free), "", "f", None).is_none());
    }

    #[test]
    fn test_propagate_keeps_derived_rules() {
        let mut store = rename_store();
        store.add("Base", "method", None, Rule::new("base_m"), &[], &[]).unwrap();
        store.add("Base", "other", None, Rule::new("base_o"), &[], &[]).unwrap();
        store.add("Derived", "other", None, Rule::new("own_o"), &[], &[]).unwrap();
        store.propagate("Base", "Derived");
        assert_eq!(store.lookup("Derived", "method", None).unwrap().name, "base_m");
        assert_eq!(store.lookup("Derived", "other", None).unwrap().name, "own_o");
        assert_eq!(store.lookup("Base", "other", None).unwrap().name, "base_o");
    }

    #[test]
    fn test_propagate_does_not_match_longer_prefix() {
        let mut store = rename_store();
        store.add("BaseX", "m", None, Rule::new("x"), &[], &[]).unwrap();
        store.propagate("Base", "Derived");
        assert!(store.lookup("Derived", "m", None).is_none());
    }

    #[test]
    fn test_warning_keys() {
        let mut rule = Rule::new("message");
        rule.attach_keys(
            RuleKind::Warning,
            &[
                Keyword::new("rename", "_%s"),
                Keyword::new("error", "1"),
                Keyword::new("bogus", "x"),
            ],
        );
        assert_eq!(rule.rename.as_deref(), Some("_%s"));
        assert!(rule.error);

        let mut rule = Rule::new("x");
        rule.attach_keys(RuleKind::Rename, &[Keyword::new("rename", "_%s")]);
        assert!(rule.rename.is_none());
    }

    #[test]
    fn test_invalid_formats_rejected() {
        let mut store = rename_store();
        assert!(store.add("", "f", None, Rule::new("%d_x"), &[], &[]).is_err());
        assert!(store.add("", "f", None, Rule::new("%s%s%s"), &[], &[]).is_err());
        assert!(store.add("", "f", None, Rule::new("%="), &[], &[]).is_ok());
        assert!(store.add("", "g", None, Rule::new("%"), &[], &[]).is_ok());
        assert!(!store.is_empty());
    }

    #[test]
    fn test_format_name() {
        assert_eq!(format_name("new_%s", &["x"]), "new_x");
        assert_eq!(format_name("%s_%s", &["A", "f"]), "A_f");
        assert_eq!(format_name("%s", &["A", "f"]), "A");
        assert_eq!(format_name("100%%_%s", &["x"]), "100%_x");
        assert_eq!(format_name("%s_%s", &["x"]), "x_");
    }
}
