//! Declaration nodes as handed over by the front-end.
//!
//! The engine only reads these and annotates `sym_name` and attached
//! features. The `attrs` map is the open-ended extension point used by
//! feature attachment; `refs` holds related nodes reachable from match
//! predicates through dotted attribute paths.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::shape;
use crate::{Access, Location};

/// The kind of declaration node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Cdecl,
    Class,
    ClassForward,
    Constructor,
    Destructor,
    Template,
    Enum,
    EnumItem,
    Constant,
    Namespace,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Cdecl => "cdecl",
            NodeKind::Class => "class",
            NodeKind::ClassForward => "classforward",
            NodeKind::Constructor => "constructor",
            NodeKind::Destructor => "destructor",
            NodeKind::Template => "template",
            NodeKind::Enum => "enum",
            NodeKind::EnumItem => "enumitem",
            NodeKind::Constant => "constant",
            NodeKind::Namespace => "namespace",
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage class of a declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Storage {
    Static,
    Virtual,
    Friend,
    Typedef,
    Extern,
    #[serde(rename = "%constant")]
    Constant,
}

impl Storage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Storage::Static => "static",
            Storage::Virtual => "virtual",
            Storage::Friend => "friend",
            Storage::Typedef => "typedef",
            Storage::Extern => "extern",
            Storage::Constant => "%constant",
        }
    }
}

/// A function parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parm {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub ty: String,
    /// Default value, if the parameter has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Parm {
    pub fn new(ty: &str) -> Self {
        Self {
            name: None,
            ty: ty.to_string(),
            value: None,
        }
    }

    pub fn with_default(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }

    pub fn has_default(&self) -> bool {
        self.value.is_some()
    }
}

/// A declaration node
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    #[serde(rename = "nodeType")]
    pub kind: NodeKind,
    /// Declared name, possibly scope-qualified or a template instantiation
    pub name: String,
    /// Resolved output name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sym_name: Option<String>,
    /// Declaration shape: `f(int,int).` for functions, absent otherwise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decl: Option<String>,
    /// Base type (return type for functions, aliased type for typedefs)
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<Storage>,
    #[serde(default)]
    pub access: Access,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parms: Vec<Parm>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub ignore: bool,
    /// Template this node was instantiated from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    /// Set on bare template definitions (not instantiations)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Attached features and other open-ended attributes
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
    /// Related nodes reachable from dotted attribute paths
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub refs: BTreeMap<String, Node>,
}

impl Node {
    pub fn new(kind: NodeKind, name: &str) -> Self {
        Self {
            kind,
            name: name.to_string(),
            sym_name: None,
            decl: None,
            ty: None,
            value: None,
            storage: None,
            access: Access::Public,
            parms: Vec::new(),
            hidden: false,
            ignore: false,
            template: None,
            template_type: None,
            location: None,
            attrs: BTreeMap::new(),
            refs: BTreeMap::new(),
        }
    }

    /// A `cdecl` function node whose shape is derived from `parms`.
    pub fn function(name: &str, parms: Vec<Parm>) -> Self {
        let mut node = Self::new(NodeKind::Cdecl, name);
        node.decl = Some(shape::function_shape(
            &parms.iter().map(|p| p.ty.as_str()).collect::<Vec<_>>(),
            false,
        ));
        node.parms = parms;
        node
    }

    pub fn with_decl(mut self, decl: &str) -> Self {
        self.decl = Some(decl.to_string());
        self
    }

    pub fn with_type(mut self, ty: &str) -> Self {
        self.ty = Some(ty.to_string());
        self
    }

    pub fn with_value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }

    pub fn with_storage(mut self, storage: Storage) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn with_access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }

    pub fn with_template(mut self, template: &str) -> Self {
        self.template = Some(template.to_string());
        self
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_ref(mut self, key: &str, node: Node) -> Self {
        self.refs.insert(key.to_string(), node);
        self
    }

    /// True if the declaration is function-shaped.
    pub fn is_function(&self) -> bool {
        self.decl.as_deref().is_some_and(shape::is_function)
    }

    /// The resolved output name, or the declared name when unresolved.
    pub fn target_name(&self) -> &str {
        self.sym_name.as_deref().unwrap_or(&self.name)
    }

    /// Look up a single attribute by name.
    fn attr_local(&self, key: &str) -> Option<Cow<'_, str>> {
        let flag = |b: bool| b.then_some(Cow::Borrowed("1"));
        match key {
            "nodeType" => Some(Cow::Borrowed(self.kind.as_str())),
            "name" => Some(Cow::Borrowed(self.name.as_str())),
            "sym:name" => self.sym_name.as_deref().map(Cow::Borrowed),
            "decl" => self.decl.as_deref().map(Cow::Borrowed),
            "type" => self.ty.as_deref().map(Cow::Borrowed),
            "value" => self.value.as_deref().map(Cow::Borrowed),
            "storage" => self.storage.map(|s| Cow::Borrowed(s.as_str())),
            "access" => Some(Cow::Owned(self.access.to_string())),
            "template" => self.template.as_deref().map(Cow::Borrowed),
            "templatetype" => self.template_type.as_deref().map(Cow::Borrowed),
            "hidden" => flag(self.hidden),
            "ignore" => flag(self.ignore),
            _ => self.attrs.get(key).map(|v| Cow::Borrowed(v.as_str())),
        }
    }

    /// Look up an attribute, following dotted paths through `refs`.
    ///
    /// `"nodeType"` reads this node; `"parentNode.nodeType"` reads the node
    /// stored under `parentNode`. `$` is accepted as a separator as well.
    pub fn attr(&self, path: &str) -> Option<Cow<'_, str>> {
        match path.find(['.', '$']) {
            Some(pos) => self
                .refs
                .get(&path[..pos])
                .and_then(|related| related.attr(&path[pos + 1..])),
            None => self.attr_local(path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_node_shape() {
        let node = Node::function("f", vec![Parm::new("int"), Parm::new("p.char")]);
        assert_eq!(node.decl.as_deref(), Some("f(int,p.char)."));
        assert!(node.is_function());
        assert_eq!(node.target_name(), "f");
    }

    #[test]
    fn test_attr_fixed_fields() {
        let node = Node::new(NodeKind::Constructor, "Foo")
            .with_storage(Storage::Static)
            .with_access(Access::Protected);
        assert_eq!(node.attr("nodeType").as_deref(), Some("constructor"));
        assert_eq!(node.attr("storage").as_deref(), Some("static"));
        assert_eq!(node.attr("access").as_deref(), Some("protected"));
        assert_eq!(node.attr("hidden"), None);
    }

    #[test]
    fn test_attr_dotted_path() {
        let base = Node::new(NodeKind::Class, "Base");
        let node = Node::new(NodeKind::Cdecl, "f").with_ref("parentNode", base);
        assert_eq!(node.attr("parentNode.nodeType").as_deref(), Some("class"));
        assert_eq!(node.attr("parentNode$name").as_deref(), Some("Base"));
        assert_eq!(node.attr("missing.nodeType"), None);
    }

    #[test]
    fn test_attr_extension_map() {
        let mut node = Node::new(NodeKind::Cdecl, "f");
        node.attrs.insert("feature:immutable".into(), "1".into());
        assert_eq!(node.attr("feature:immutable").as_deref(), Some("1"));
    }

    #[test]
    fn test_node_deserializes_from_json() {
        let node: Node = serde_json::from_str(
            r#"{"nodeType":"cdecl","name":"f","decl":"f(int).","storage":"%constant"}"#,
        )
        .unwrap();
        assert_eq!(node.kind, NodeKind::Cdecl);
        assert_eq!(node.storage, Some(Storage::Constant));
        assert_eq!(node.access, Access::Public);
    }
}
