//! Redefinition checks for declarations that resolve to the same name.

use crate::node::{Node, NodeKind, Storage};

fn is_typedef(node: &Node) -> bool {
    node.storage == Some(Storage::Typedef)
}

fn parm_types_match(a: &Node, b: &Node) -> bool {
    a.parms.len() == b.parms.len() && a.parms.iter().zip(&b.parms).all(|(x, y)| x.ty == y.ty)
}

/// True if `a` and `b` may share one target name without conflict.
///
/// `a_in_class` says whether `a` is a class member; members are only
/// compared structurally when they are friends.
pub fn nodes_equivalent(a: &Node, b: &Node, a_in_class: bool) -> bool {
    if a.kind != b.kind {
        return false;
    }

    if a.kind == NodeKind::Cdecl {
        if is_typedef(a) || is_typedef(b) {
            return a.storage == b.storage && a.ty == b.ty;
        }
        let is_static = |n: &Node| n.storage == Some(Storage::Static);
        if (is_static(a) || is_static(b)) && a.storage != b.storage {
            return false;
        }
        if a_in_class && a.storage != Some(Storage::Friend) {
            return false;
        }
        return a.decl == b.decl
            && a.ty == b.ty
            && parm_types_match(a, b)
            && a.template.is_some() == b.template.is_some();
    }

    let is_constant = |n: &Node| n.storage == Some(Storage::Constant);
    if is_constant(a) || is_constant(b) {
        return a.storage == b.storage && a.ty == b.ty && a.value == b.value;
    }
    false
}

/// True if declaring `b` after `a` under the same target name deserves a
/// redefinition warning.
///
/// A rename on either declaration always warns.
pub fn needs_redefinition_warning(a: &Node, b: &Node, a_in_class: bool) -> bool {
    let renamed = |n: &Node| n.sym_name.as_deref().is_some_and(|s| s != n.name);
    if renamed(a) || renamed(b) {
        return true;
    }
    !nodes_equivalent(a, b, a_in_class)
}
