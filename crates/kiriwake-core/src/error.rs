use thiserror::Error;

/// Errors that can occur while constructing a parser or loading a tag
/// registry.
///
/// Parsing itself never fails: any byte sequence produces a [`Release`],
/// possibly with an unknown type. The only fallible operations are registry
/// loading (fatal to parser construction) and the concurrent scanner.
///
/// [`Release`]: crate::types::Release
#[derive(Debug, Error)]
pub enum KiriwakeError {
    /// The registry CSV contained no rows at all.
    #[error("empty csv")]
    EmptyCsv,

    /// The registry CSV header row is missing or does not match the
    /// mandatory `Type,Tag,Title,Regexp,Other,ReleaseType,TypeExclusive`.
    #[error("line 1: must have csv headers Type, Tag, Title, Regexp, Other, ReleaseType, TypeExclusive")]
    InvalidHeader,

    /// A registry CSV row has the wrong number of columns.
    #[error("line {line}: must have {expected} columns, got {got}")]
    InvalidColumns {
        /// 1-based CSV line number.
        line: usize,
        /// Expected column count.
        expected: usize,
        /// Column count found on the line.
        got: usize,
    },

    /// A registry row is missing its canonical tag text.
    #[error("line {line}: must define tag")]
    MissingTag {
        /// 1-based CSV line number.
        line: usize,
    },

    /// A (category, tag) pair occurred more than once.
    #[error("line {line}: type {category:?} with tag {tag:?} previously defined on line {prev}")]
    DuplicateTag {
        /// 1-based CSV line number of the repeated definition.
        line: usize,
        /// 1-based CSV line number of the first definition.
        prev: usize,
        /// Registry category key.
        category: String,
        /// Canonical tag text.
        tag: String,
    },

    /// A registry row names a release type outside the known set.
    #[error("line {line}: invalid release type {value:?}")]
    InvalidReleaseType {
        /// 1-based CSV line number.
        line: usize,
        /// The offending value.
        value: String,
    },

    /// A registry row's alternate pattern failed to compile.
    #[error("line {line}: tag {tag:?} has invalid regexp {pattern:?}")]
    InvalidPattern {
        /// 1-based CSV line number.
        line: usize,
        /// Canonical tag text of the row.
        tag: String,
        /// The pattern that failed to compile.
        pattern: String,
    },

    /// An unquoted CSV field contained a stray quote, or a quoted field was
    /// left unterminated.
    #[error("line {line}: malformed csv field")]
    MalformedCsv {
        /// 1-based CSV line number.
        line: usize,
    },

    /// A lexer or helper pattern failed to compile (should not happen with
    /// the built-in patterns).
    #[error("regex compilation error: {0}")]
    Regex(#[from] regex::Error),

    /// Reading a registry file from disk failed.
    #[error("{file}: {source}")]
    RegistryIo {
        /// Base name of the file that could not be read.
        file: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for kiriwake operations.
pub type Result<T> = std::result::Result<T, KiriwakeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_carries_line_numbers() {
        let err = KiriwakeError::DuplicateTag {
            line: 12,
            prev: 4,
            category: "source".into(),
            tag: "WEB-DL".into(),
        };
        let s = err.to_string();
        assert!(s.contains("line 12"));
        assert!(s.contains("line 4"));
        assert!(s.contains("WEB-DL"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<KiriwakeError>();
    }
}
