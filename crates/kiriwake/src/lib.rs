//! # Kiriwake
//!
//! Scene release name parsing, classification and comparison.
//!
//! This crate re-exports the [`kiriwake-core`](kiriwake_core) API.
//!
//! ```rust
//! let r = kiriwake::parse_str("Star.Trek.Lower.Decks.S03E02.1080p.AMZN.WEB-DL.H.264-GNOME.mkv");
//!
//! assert_eq!(r.typ, kiriwake::Type::Episode);
//! assert_eq!(r.title.as_deref(), Some("Star Trek Lower Decks"));
//! assert_eq!(r.series, Some(3));
//! assert_eq!(r.episode, Some(2));
//! ```

pub use kiriwake_core::*;
