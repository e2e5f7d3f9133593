//! Feature attachment.
//!
//! Features are attribute bags keyed like rename rules (`scope::name`, then
//! declaration shape). Unlike renames, every matching bag along the cascade
//! is merged onto the node, so later, more specific bags overwrite earlier
//! ones: global, catch-all name, class-generic, wildcard class, template
//! prefix, exact scope.

use std::collections::{BTreeMap, HashMap};

use crate::node::{Node, NodeKind};
use crate::rules::Keyword;
use crate::shape::{self, TemplateDefaults};

/// Feature name -> value.
pub type FeatureBag = BTreeMap<String, String>;

#[derive(Debug, Clone, Default)]
pub struct FeatureStore {
    table: HashMap<String, HashMap<Option<String>, FeatureBag>>,
}

impl FeatureStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Set (or with `value == None`, delete) `feature` on `name`/`decl`.
    ///
    /// Each attribute is stored as `feature:attr`. An empty `name` makes a
    /// global feature. Template instantiations also set the feature on
    /// their default-argument-normalized spelling.
    pub fn set(
        &mut self,
        name: &str,
        decl: Option<&str>,
        feature: &str,
        value: Option<&str>,
        attribs: &[Keyword],
        templates: &TemplateDefaults,
    ) {
        tracing::debug!("feature {} = {:?} on '{}' {:?}", feature, value, name, decl);
        let bag = self
            .table
            .entry(name.to_string())
            .or_default()
            .entry(decl.map(str::to_string))
            .or_default();

        let attrib_keys = attribs
            .iter()
            .map(|a| (format!("{}:{}", feature, a.name), a.value.as_str()));
        match value {
            Some(value) => {
                bag.insert(feature.to_string(), value.to_string());
                for (key, attr_value) in attrib_keys {
                    bag.insert(key, attr_value.to_string());
                }
            }
            None => {
                bag.remove(feature);
                for (key, _) in attrib_keys {
                    bag.remove(&key);
                }
            }
        }

        if shape::is_template(name) {
            let dname = templates.deftype(name);
            if dname != name {
                self.set(&dname, decl, feature, value, attribs, templates);
            }
        }
    }

    fn merge(&self, key: &str, decl: Option<&str>, node: &mut Node) {
        let Some(entries) = self.table.get(key) else {
            return;
        };
        tracing::trace!("features_get '{}'", key);
        let mut apply = |bag: Option<&FeatureBag>| {
            for (k, v) in bag.into_iter().flatten() {
                node.attrs.insert(k.clone(), v.clone());
            }
        };
        apply(entries.get(&None));
        if let Some(decl) = decl {
            apply(entries.get(&Some(decl.to_string())));
        }
    }

    /// Merge every feature matching `(prefix, name, decl)` onto `node`.
    pub fn attach(
        &self,
        prefix: &str,
        name: &str,
        decl: Option<&str>,
        node: &mut Node,
        templates: &TemplateDefaults,
    ) {
        if self.table.is_empty() {
            return;
        }

        let mut name = name.to_string();
        let mut decl = decl.map(str::to_string);

        // Template constructors and destructors are named after the bare template.
        if shape::is_template(&name)
            && matches!(node.kind, NodeKind::Constructor | NodeKind::Destructor)
        {
            let (nprefix, nlast) = shape::scopename_split(&name);
            let tlast = shape::template_prefix(nlast);
            let rname = match nprefix {
                Some(p) => format!("{}::{}", p, tlast),
                None => tlast.to_string(),
            };
            decl = decl.map(|d| d.replace(&name, &rname));
            name = rname;
        }

        let mut pending = Some(name);
        let mut visited: Vec<String> = Vec::new();
        while let Some(name) = pending.take() {
            self.attach_pass(prefix, &name, decl.as_deref(), node);
            visited.push(name.clone());
            if shape::is_template(&name) {
                let dname = templates.deftype(&name);
                if !visited.contains(&dname) {
                    pending = Some(dname);
                }
            }
        }
    }

    fn attach_pass(&self, prefix: &str, name: &str, decl: Option<&str>, node: &mut Node) {
        self.merge("", None, node);
        if name.is_empty() {
            return;
        }
        self.merge(name, decl, node);
        if prefix.is_empty() {
            self.merge(&format!("::{}", name), decl, node);
            return;
        }
        self.merge(&format!("{}::", prefix), decl, node);
        self.merge(&format!("*::{}", name), decl, node);
        if shape::is_template(prefix) {
            let tprefix = shape::template_prefix(prefix);
            self.merge(&format!("{}::{}", tprefix, name), decl, node);
        }
        self.merge(&format!("{}::{}", prefix, name), decl, node);
    }

    /// Copy `base::`-prefixed feature bags to `derived::`, keeping
    /// features the derived scope already sets.
    pub fn propagate(&mut self, base: &str, derived: &str) {
        let bprefix = format!("{}::", base);
        let inherited: Vec<_> = self
            .table
            .iter()
            .filter_map(|(key, entries)| {
                key.strip_prefix(&bprefix)
                    .map(|rest| (format!("{}::{}", derived, rest), entries.clone()))
            })
            .collect();
        for (nkey, entries) in inherited {
            let target = self.table.entry(nkey).or_default();
            for (decl, bag) in entries {
                target.entry(decl).or_insert(bag);
            }
        }
    }
}
