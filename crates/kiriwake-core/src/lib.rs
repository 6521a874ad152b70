//! # Kiriwake Core
//!
//! Scene release name parsing. Takes a filename-like string such as
//! `The.Matrix.1999.1080p.BluRay.x264-GROUP` and decomposes it into a
//! structured [`Release`] (title, artist, year, season/episode, resolution,
//! codec, group, …) with a classified media type (movie, series, episode,
//! music, book, game, app, …).
//!
//! Parsing is permissive and pure: any byte sequence produces a release,
//! and re-rendering the token sequence reproduces the input byte-for-byte.
//!
//! ## Quick Start
//!
//! ```rust
//! let r = kiriwake_core::parse_str("The.Matrix.1999.1080p.BluRay.x264-GROUP.mkv");
//!
//! assert_eq!(r.typ, kiriwake_core::Type::Movie);
//! assert_eq!(r.title.as_deref(), Some("The Matrix"));
//! assert_eq!(r.year, Some(1999));
//! assert_eq!(r.group.as_deref(), Some("GROUP"));
//! ```

pub mod compare;
pub mod error;
pub mod normalize;
pub mod parser;
pub mod scan;
pub mod taginfo;
pub mod types;

use once_cell::sync::Lazy;

// Re-export primary API
pub use compare::{compare, compare_title, parse_roman};
pub use error::{KiriwakeError, Result};
pub use normalize::{Collapser, clean, normalize};
pub use parser::{TagBuilder, TagParser};
pub use scan::{CancelToken, ReleaseScanner, Scan, ScanError, ScanStream};
pub use taginfo::{Finder, Taginfo, TaginfoMap};
pub use types::{Release, Tag, TagType, Type, Verb, find};

// The embedded registry is validated by the test suite; failing to load it
// is a build defect, not a runtime condition.
static DEFAULT_PARSER: Lazy<TagParser> =
    Lazy::new(|| TagParser::builtin().expect("embedded tag registry must load"));

/// The shared parser over the embedded default registry.
pub fn default_parser() -> &'static TagParser {
    &DEFAULT_PARSER
}

/// Parses a release from raw bytes using the default parser.
pub fn parse(src: &[u8]) -> Release {
    DEFAULT_PARSER.parse_release(src)
}

/// Parses a release from a string using the default parser.
pub fn parse_str(s: &str) -> Release {
    parse(s.as_bytes())
}

/// Parses tags and the front/back cutoff using the default parser.
pub fn parse_tags(src: &[u8]) -> (Vec<Tag>, usize) {
    DEFAULT_PARSER.parse(src)
}
