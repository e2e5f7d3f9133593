//! Identifier mangling.
//!
//! Turns scoped names and operator symbols into bare identifiers that are
//! safe to embed in generated glue code.
//!
//! # Examples
//!
//! ```
//! use wrapname::mangle;
//!
//! assert_eq!(mangle("Foo::bar"), "Foo_bar");
//! assert_eq!(mangle("operator+"), "operatora___");
//! assert_eq!(mangle("plain_name"), "plain_name");
//! ```

/// Suffix appended whenever a special character was substituted.
pub const MANGLE_SUFFIX: &str = "___";

/// Scope separator in declared names.
pub const SCOPE_SEPARATOR: &str = "::";

fn substitute(b: u8) -> char {
    match b {
        b'+' => 'a',
        b'-' => 's',
        b'*' => 'm',
        b'/' => 'd',
        b'<' => 'l',
        b'>' => 'g',
        b'=' => 'e',
        b',' => 'c',
        b'(' => 'p',
        b')' => 'P',
        b'[' => 'b',
        b']' => 'B',
        b'^' => 'x',
        b'&' => 'A',
        b'|' => 'o',
        b'~' => 'n',
        b'!' => 'N',
        b'%' => 'M',
        b'.' => 'f',
        b'?' => 'q',
        _ => '_',
    }
}

/// Mangle `name`, returning the identifier and whether any special
/// character had to be substituted.
///
/// Works on UTF-8 bytes: a multi-byte character yields one `_` per byte.
pub fn mangle_with_flag(name: &str) -> (String, bool) {
    let unscoped = name.replace(SCOPE_SEPARATOR, "_");
    let mut special = false;
    let mut out: String = unscoped
        .bytes()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == b'_' {
                char::from(c)
            } else {
                special = true;
                substitute(c)
            }
        })
        .collect();
    if special {
        out.push_str(MANGLE_SUFFIX);
    }
    (out, special)
}

/// Mangle an arbitrary scoped identifier or operator symbol.
#[must_use]
pub fn mangle(name: &str) -> String {
    mangle_with_flag(name).0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_identifier_unchanged() {
        for s in ["foo", "Foo_Bar9", "_wrap_x", ""] {
            assert_eq!(mangle(s), s);
        }
    }

    #[test]
    fn test_scope_separator_is_not_special() {
        let (out, special) = mangle_with_flag("ns::Foo::bar");
        assert_eq!(out, "ns_Foo_bar");
        assert!(!special);
    }

    #[test]
    fn test_operator_substitution_appends_suffix() {
        assert_eq!(mangle("operator+="), "operatorae___");
        assert_eq!(mangle("operator()"), "operatorpP___");
        assert_eq!(mangle("operator[]"), "operatorbB___");
        assert_eq!(mangle("~Foo"), "nFoo___");
    }

    #[test]
    fn test_full_substitution_table() {
        assert_eq!(
            mangle("+-*/<>=,()[]^&|~!%.?"),
            "asmdlgecpPbBxAonNMfq___"
        );
    }

    #[test]
    fn test_unknown_characters_become_underscore() {
        assert_eq!(mangle("a b"), "a_b___");
        assert_eq!(mangle("a:b"), "a_b___");
    }

    #[test]
    fn test_multibyte_characters_mangle_per_byte() {
        assert_eq!(mangle("café"), "caf_____");
        assert_eq!(mangle("ns::naïve"), "ns_na__ve___");
    }

    #[test]
    fn test_template_names() {
        assert_eq!(mangle("vector<(int)>"), "vectorlpintPg___");
    }
}
