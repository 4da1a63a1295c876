//! Component identifiers.
//!
//! Every installable component is addressed by a canonical option of the
//! form `com_<name>` where `name` is drawn from `[A-Za-z0-9_-]`. Anything else
//! is stripped, so user input like `../etc` can never name a path outside
//! the component roots.

/// Prefix shared by all component options.
pub const PREFIX: &str = "com_";

/// Normalizes a component name into its `com_<name>` option.
///
/// Returns an empty string when nothing valid remains, including for the bare
/// prefix `com_`. Callers must reject the empty result.
///
/// ```rust
/// use hub_dispatch::canonical;
///
/// assert_eq!(canonical("Blog"), "com_Blog");
/// assert_eq!(canonical("com_blog"), "com_blog");
/// assert_eq!(canonical("../etc"), "com_etc");
/// assert_eq!(canonical("com_"), "");
/// ```
pub fn canonical(name: &str) -> String {
    let option: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'))
        .collect();

    if option.is_empty() {
        return option;
    }
    if option.starts_with(PREFIX) {
        if option == PREFIX {
            return String::new();
        }
        return option;
    }
    format!("{}{}", PREFIX, option)
}

/// Joins `parts` and canonicalizes the result.
pub fn canonical_parts<S: AsRef<str>>(parts: &[S]) -> String {
    let joined: String = parts.iter().map(AsRef::as_ref).collect();
    canonical(&joined)
}

/// The component name without its `com_` prefix.
pub fn component_name(option: &str) -> &str {
    option.strip_prefix(PREFIX).unwrap_or(option)
}

/// Checks `value` against `[A-Za-z_\x80-\xff][A-Za-z0-9_\x80-\xff]*`.
///
/// Any non-ASCII character counts as a letter.
pub fn is_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() || !c.is_ascii() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric() || !c.is_ascii())
}

/// Uppercases the first character.
pub fn ucfirst(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_canonical_examples() {
        assert_eq!(canonical("Foo"), "com_Foo");
        assert_eq!(canonical("com_Foo"), "com_Foo");
        assert_eq!(canonical("../etc"), "com_etc");
        assert_eq!(canonical("com_"), "");
        assert_eq!(canonical(""), "");
        assert_eq!(canonical("..//.."), "");
        assert_eq!(canonical("com_.."), "");
        assert_eq!(canonical("my-blog_2"), "com_my-blog_2");
    }

    #[test]
    fn test_canonical_parts() {
        assert_eq!(canonical_parts(&["com_", "blog"]), "com_blog");
        assert_eq!(canonical_parts::<&str>(&[]), "");
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("entries"));
        assert!(is_identifier("_private"));
        assert!(is_identifier("café"));
        assert!(is_identifier("ünïcode"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("42"));
        assert!(!is_identifier("a-b"));
        assert!(!is_identifier("a.b"));
    }

    #[test]
    fn test_component_name() {
        assert_eq!(component_name("com_blog"), "blog");
        assert_eq!(component_name("blog"), "blog");
    }

    proptest! {
        #[test]
        fn canonical_is_empty_or_prefixed(input in ".*") {
            let out = canonical(&input);
            if !out.is_empty() {
                prop_assert!(out.starts_with(PREFIX));
                let name = &out[PREFIX.len()..];
                prop_assert!(!name.is_empty());
                prop_assert!(name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-'));
            }
        }

        #[test]
        fn canonical_is_idempotent(input in ".*") {
            let once = canonical(&input);
            prop_assert_eq!(canonical(&once), once);
        }
    }
}
