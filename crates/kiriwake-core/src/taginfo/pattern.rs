//! Regexp assembly helpers for registry-driven lexers.
//!
//! Lexer patterns are built by joining the alternate patterns of every
//! descriptor in a category into a single alternation, wrapped according to
//! a small config string.

use super::Taginfo;

/// Joins pattern fragments into a single `a|b|c` alternation, optionally
/// escaping each fragment as a literal.
pub fn join<S: AsRef<str>>(quote: bool, strs: &[S]) -> String {
    let mut v = Vec::with_capacity(strs.len());
    for s in strs {
        if quote {
            v.push(regex::escape(s.as_ref()));
        } else {
            v.push(s.as_ref().to_string());
        }
    }
    v.join("|")
}

/// Builds a grouped alternation for the given fragments.
///
/// Config options:
///
/// - `i` - ignore case
/// - `^` - add `^` start anchor
/// - `a` - add `\b` start anchor
/// - `q` - escape each fragment as a literal
/// - `b` - add `\b` end anchor
/// - `$` - add `$` end anchor
pub fn build<S: AsRef<str>>(config: &str, strs: &[S]) -> String {
    let mut s = String::new();
    if config.contains('i') {
        s.push_str("(?i)");
    }
    if config.contains('^') {
        s.push('^');
    }
    if config.contains('a') {
        s.push_str(r"\b");
    }
    s.push('(');
    s.push_str(&join(config.contains('q'), strs));
    s.push(')');
    if config.contains('b') {
        s.push_str(r"\b");
    }
    if config.contains('$') {
        s.push('$');
    }
    s
}

/// Builds a grouped alternation from the patterns of registry descriptors.
///
/// See [`build`] for config options.
pub fn taginfo(config: &str, infos: &[Taginfo]) -> String {
    let v: Vec<String> = infos.iter().map(|info| info.pattern().into_owned()).collect();
    build(config, &v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_quotes_literals() {
        assert_eq!(join(false, &["a+", "b"]), "a+|b");
        assert_eq!(join(true, &["a+", "b"]), r"a\+|b");
    }

    #[test]
    fn build_applies_config() {
        assert_eq!(build("i^b", &["x264", "x265"]), r"(?i)^(x264|x265)\b");
        assert_eq!(build("$", &["mkv"]), "(mkv)$");
        assert_eq!(build("a", &["web"]), r"\b(web)");
    }
}
