//! Helpers over canonical type strings, scoped names and declaration shapes.
//!
//! Names and shapes arrive already canonicalized by the front-end:
//! - template instantiations are written `Name<(arg1,arg2)>`
//! - scopes are separated by `::`
//! - a function shape is `f(type1,type2).`, prefixed by `q(const).` for
//!   const-qualified member functions

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

const TEMPLATE_OPEN: &str = "<(";
const TEMPLATE_CLOSE: &str = ")>";

/// True if `name` is a template instantiation such as `vector<(int)>`.
pub fn is_template(name: &str) -> bool {
    match name.find(TEMPLATE_OPEN) {
        Some(pos) => name[pos + 2..].contains(TEMPLATE_CLOSE),
        None => false,
    }
}

/// The part of `name` before its template arguments.
pub fn template_prefix(name: &str) -> &str {
    match name.find(TEMPLATE_OPEN) {
        Some(pos) => &name[..pos],
        None => name,
    }
}

/// Split the argument list of `Name<(a,b)>` at top-level commas, returning
/// the prefix, the arguments and whatever follows the closing `)>`.
pub fn template_parts(name: &str) -> Option<(&str, Vec<&str>, &str)> {
    let open = name.find(TEMPLATE_OPEN)?;
    let body_start = open + TEMPLATE_OPEN.len();
    let bytes = name.as_bytes();
    let mut depth = 0usize;
    let mut args = Vec::new();
    let mut arg_start = body_start;
    let mut i = body_start;
    while i < bytes.len() {
        match bytes[i] {
            b'(' | b'<' | b'[' => depth += 1,
            b')' if depth == 0 && bytes.get(i + 1) == Some(&b'>') => {
                if i > arg_start || !args.is_empty() {
                    args.push(&name[arg_start..i]);
                }
                return Some((&name[..open], args, &name[i + 2..]));
            }
            b')' | b'>' | b']' => depth = depth.saturating_sub(1),
            b',' if depth == 0 => {
                args.push(&name[arg_start..i]);
                arg_start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Convert a canonical type string into its source spelling (`A<(int)>` -> `A<int>`).
pub fn namestr(name: &str) -> String {
    name.replace(TEMPLATE_OPEN, "<").replace(TEMPLATE_CLOSE, ">")
}

/// Byte positions of top-level `::` separators (outside template arguments).
fn scope_separators(name: &str) -> Vec<usize> {
    let bytes = name.as_bytes();
    let mut depth = 0usize;
    let mut seps = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'<' | b'(' => depth += 1,
            b'>' | b')' => depth = depth.saturating_sub(1),
            b':' if depth == 0 && bytes.get(i + 1) == Some(&b':') => {
                seps.push(i);
                i += 1;
            }
            _ => {}
        }
        i += 1;
    }
    seps
}

/// Split `a::b::c` into (`Some("a::b")`, `"c"`). Unscoped names have no prefix.
pub fn scopename_split(name: &str) -> (Option<&str>, &str) {
    match scope_separators(name).last() {
        Some(&pos) => (Some(&name[..pos]), &name[pos + 2..]),
        None => (None, name),
    }
}

/// The last scope segment of `name`.
pub fn scopename_last(name: &str) -> &str {
    scopename_split(name).1
}

/// True if `decl` is a function shape, ignoring a leading qualifier.
pub fn is_function(decl: &str) -> bool {
    strip_qualifier(decl).1.starts_with("f(")
}

/// True if `decl` carries a leading `const` qualifier.
pub fn is_const(decl: &str) -> bool {
    matches!(strip_qualifier(decl).0, Some(q) if q.contains("const"))
}

/// Split a leading `q(...)` qualifier from `decl`.
fn strip_qualifier(decl: &str) -> (Option<&str>, &str) {
    if let Some(rest) = decl.strip_prefix("q(") {
        if let Some(end) = rest.find(").") {
            return (Some(&rest[..end]), &rest[end + 2..]);
        }
    }
    (None, decl)
}

/// Position just past the `).` that closes the leading `f(` of `decl`.
fn function_end(decl: &str) -> Option<usize> {
    let bytes = decl.as_bytes();
    let mut depth = 0usize;
    for (i, b) in bytes.iter().enumerate().skip(2) {
        match b {
            b'(' => depth += 1,
            b')' if depth == 0 => {
                return (bytes.get(i + 1) == Some(&b'.')).then_some(i + 2);
            }
            b')' => depth -= 1,
            _ => {}
        }
    }
    None
}

/// Build a function shape from parameter types.
pub fn function_shape<S: AsRef<str>>(parm_types: &[S], is_const: bool) -> String {
    let parms: Vec<&str> = parm_types.iter().map(AsRef::as_ref).collect();
    let mut shape = String::new();
    if is_const {
        shape.push_str("q(const).");
    }
    shape.push_str("f(");
    shape.push_str(&parms.join(","));
    shape.push_str(").");
    shape
}

/// Replace the parameter list of function shape `decl`, keeping a leading
/// `const` qualifier and anything after the parameter list.
pub fn replace_parms<S: AsRef<str>>(decl: &str, parm_types: &[S]) -> Option<String> {
    let constq = is_const(decl);
    let (_, func) = strip_qualifier(decl);
    if !func.starts_with("f(") {
        return None;
    }
    let rest = &func[function_end(func)?..];
    let mut shape = function_shape(parm_types, constq);
    shape.push_str(rest);
    Some(shape)
}

/// Registry of template default arguments.
///
/// Stands in for the symbol table's template normalization: a template
/// registered with `arity` parameters and trailing `defaults` turns
/// `T<(a)>` into `T<(a,d)>`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateDefaults {
    templates: HashMap<String, TemplateSignature>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TemplateSignature {
    arity: usize,
    defaults: Vec<String>,
}

impl TemplateDefaults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register template `name` taking `arity` parameters, the last
    /// `defaults.len()` of which have the given default arguments.
    pub fn register(&mut self, name: &str, arity: usize, defaults: Vec<String>) {
        let defaults = if defaults.len() > arity {
            defaults[defaults.len() - arity..].to_vec()
        } else {
            defaults
        };
        self.templates
            .insert(name.to_string(), TemplateSignature { arity, defaults });
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    fn normalize_segment(&self, segment: &str) -> String {
        let Some((prefix, args, suffix)) = template_parts(segment) else {
            return segment.to_string();
        };
        let Some(sig) = self.templates.get(prefix) else {
            return segment.to_string();
        };
        let mut full: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        let first_default = sig.arity - sig.defaults.len();
        while full.len() < sig.arity && full.len() >= first_default {
            full.push(sig.defaults[full.len() - first_default].clone());
        }
        format!("{}<({})>{}", prefix, full.join(","), suffix)
    }

    /// The default-argument-normalized spelling of `name`.
    pub fn deftype(&self, name: &str) -> String {
        if self.templates.is_empty() || !is_template(name) {
            return name.to_string();
        }
        let mut out = String::with_capacity(name.len());
        let mut start = 0;
        for sep in scope_separators(name) {
            out.push_str(&self.normalize_segment(&name[start..sep]));
            out.push_str("::");
            start = sep + 2;
        }
        out.push_str(&self.normalize_segment(&name[start..]));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_template() {
        assert!(is_template("vector<(int)>"));
        assert!(is_template("ns::Box<(int)>::get"));
        assert!(!is_template("operator<"));
        assert!(!is_template("plain"));
    }

    #[test]
    fn test_template_prefix() {
        assert_eq!(template_prefix("vector<(int)>"), "vector");
        assert_eq!(template_prefix("plain"), "plain");
    }

    #[test]
    fn test_template_parts_nested() {
        let (prefix, args, suffix) = template_parts("map<(int,pair<(a,b)>)>").unwrap();
        assert_eq!(prefix, "map");
        assert_eq!(args, vec!["int", "pair<(a,b)>"]);
        assert_eq!(suffix, "");
    }

    #[test]
    fn test_scopename_split_respects_templates() {
        assert_eq!(scopename_split("a::b::c"), (Some("a::b"), "c"));
        assert_eq!(scopename_split("c"), (None, "c"));
        assert_eq!(
            scopename_split("ns::Box<(a::T)>"),
            (Some("ns"), "Box<(a::T)>")
        );
        assert_eq!(scopename_last("A::B"), "B");
    }

    #[test]
    fn test_function_shapes() {
        assert_eq!(function_shape(&["int", "int"], false), "f(int,int).");
        assert_eq!(function_shape::<&str>(&[], true), "q(const).f().");
        assert!(is_function("f(int)."));
        assert!(is_function("q(const).f()."));
        assert!(!is_function("p.int"));
        assert!(is_const("q(const).f()."));
        assert!(!is_const("f()."));
    }

    #[test]
    fn test_replace_parms_keeps_const_and_tail() {
        assert_eq!(
            replace_parms("q(const).f(int,double).", &["int"]).unwrap(),
            "q(const).f(int)."
        );
        assert_eq!(
            replace_parms("f(int,p.f(int).).", &["int"]).unwrap(),
            "f(int)."
        );
        assert!(replace_parms("p.int", &["int"]).is_none());
    }

    #[test]
    fn test_deftype_appends_defaults() {
        let mut templates = TemplateDefaults::new();
        templates.register("vector", 2, vec!["allocator<(int)>".to_string()]);
        assert_eq!(
            templates.deftype("vector<(int)>"),
            "vector<(int,allocator<(int)>)>"
        );
        assert_eq!(
            templates.deftype("vector<(int,alloc)>"),
            "vector<(int,alloc)>"
        );
        assert_eq!(templates.deftype("list<(int)>"), "list<(int)>");
        assert_eq!(
            templates.deftype("ns::vector<(int)>::size"),
            "ns::vector<(int,allocator<(int)>)>::size"
        );
    }

    #[test]
    fn test_deftype_normalizes_scope_segments() {
        let mut templates = TemplateDefaults::new();
        templates.register("Box", 2, vec!["int".to_string()]);
        assert_eq!(templates.deftype("Box<(T)>::get"), "Box<(T,int)>::get");
    }
}
