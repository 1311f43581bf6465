//! Language-level type names.
//!
//! `std::any::type_name` reports fully qualified paths
//! (`std::collections::hash::map::HashMap<alloc::string::String, i32>`).
//! Messages show what a test author would write instead
//! (`HashMap<String, i32>`), with `Option<T>` shortened to `T?`.

use regex::Regex;
use std::sync::OnceLock;

fn path_prefix() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"\b(?:[A-Za-z_][A-Za-z0-9_]*::)+").ok())
        .as_ref()
}

/// Display name for a `std::any::type_name` token
#[must_use]
pub fn display_name(token: &str) -> String {
    let stripped = match path_prefix() {
        Some(pattern) => pattern.replace_all(token, "").into_owned(),
        None => token.to_string(),
    };
    shorten_options(&stripped)
}

/// Rewrite every `Option<X>` as `X?`, innermost first
fn shorten_options(name: &str) -> String {
    const OPEN: &str = "Option<";
    let mut out = String::with_capacity(name.len());
    let mut rest = name;
    while let Some(pos) = find_option(rest) {
        out.push_str(&rest[..pos]);
        let inner_start = pos + OPEN.len();
        match matching_close(&rest[inner_start..]) {
            Some(len) => {
                out.push_str(&shorten_options(&rest[inner_start..inner_start + len]));
                out.push('?');
                rest = &rest[inner_start + len + 1..];
            }
            None => {
                out.push_str(&rest[pos..]);
                return out;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Position of an `Option<` that starts an identifier
fn find_option(s: &str) -> Option<usize> {
    let mut from = 0;
    while let Some(found) = s[from..].find("Option<") {
        let pos = from + found;
        let boundary = s[..pos]
            .chars()
            .next_back()
            .map_or(true, |c| !(c.is_alphanumeric() || c == '_'));
        if boundary {
            return Some(pos);
        }
        from = pos + 1;
    }
    None
}

/// Length up to the `>` closing an already opened `<`
fn matching_close(s: &str) -> Option<usize> {
    let mut depth = 0_usize;
    for (i, c) in s.char_indices() {
        match c {
            '<' => depth += 1,
            '>' if depth == 0 => return Some(i),
            '>' => depth -= 1,
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_strips_module_paths() {
        let token = std::any::type_name::<HashMap<String, String>>();
        assert_eq!(display_name(token), "HashMap<String, String>");
    }

    #[test]
    fn test_primitives_unchanged() {
        assert_eq!(display_name("i32"), "i32");
        assert_eq!(display_name("&str"), "&str");
        assert_eq!(display_name("[u8; 4]"), "[u8; 4]");
    }

    #[test]
    fn test_option_becomes_nullable_marker() {
        let token = std::any::type_name::<Option<i32>>();
        assert_eq!(display_name(token), "i32?");
    }

    #[test]
    fn test_nested_options() {
        let token = std::any::type_name::<Vec<Option<Option<String>>>>();
        assert_eq!(display_name(token), "Vec<String??>");
    }

    #[test]
    fn test_option_suffix_in_identifier_is_kept() {
        assert_eq!(display_name("MyOption<u8>"), "MyOption<u8>");
    }

    #[test]
    fn test_dyn_trait() {
        let token = std::any::type_name::<Box<dyn std::error::Error>>();
        assert_eq!(display_name(token), "Box<dyn Error>");
    }
}
