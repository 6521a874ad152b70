//! The structured parse output.

use serde::{Deserialize, Serialize};

use crate::types::tag::{Tag, Verb};

/// Classified release type.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Type {
    #[default]
    Unknown,
    App,
    Audiobook,
    Book,
    Comic,
    Education,
    Episode,
    Game,
    Magazine,
    Movie,
    Music,
    Series,
}

impl Type {
    /// Parses a release type from its registry spelling. The empty string is
    /// the unknown type.
    pub fn from_tag(s: &str) -> Option<Type> {
        match s {
            "" => Some(Type::Unknown),
            "app" => Some(Type::App),
            "audiobook" => Some(Type::Audiobook),
            "book" => Some(Type::Book),
            "comic" => Some(Type::Comic),
            "education" => Some(Type::Education),
            "episode" => Some(Type::Episode),
            "game" => Some(Type::Game),
            "magazine" => Some(Type::Magazine),
            "movie" => Some(Type::Movie),
            "music" => Some(Type::Music),
            "series" => Some(Type::Series),
            _ => None,
        }
    }

    /// Returns true when the type is one of `types`.
    pub fn is(self, types: &[Type]) -> bool {
        types.contains(&self)
    }

    /// The comparison class for release ordering: unknown < movie <
    /// series = episode < music < app < game < book < audiobook <
    /// education < comic < magazine.
    pub fn class(self) -> u8 {
        match self {
            Type::Unknown => 0,
            Type::Movie => 1,
            Type::Series | Type::Episode => 2,
            Type::Music => 3,
            Type::App => 4,
            Type::Game => 5,
            Type::Book => 6,
            Type::Audiobook => 7,
            Type::Education => 8,
            Type::Comic => 9,
            Type::Magazine => 10,
        }
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Type::Unknown => "unknown",
            Type::App => "app",
            Type::Audiobook => "audiobook",
            Type::Book => "book",
            Type::Comic => "comic",
            Type::Education => "education",
            Type::Episode => "episode",
            Type::Game => "game",
            Type::Magazine => "magazine",
            Type::Movie => "movie",
            Type::Music => "music",
            Type::Series => "series",
        };
        f.write_str(s)
    }
}

/// Structured release information.
///
/// Assembled once by the builder from a frozen token sequence; the token
/// sequence itself is retained so the original input can be reproduced
/// byte-for-byte.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Release {
    /// Classified release type.
    #[serde(rename = "type")]
    pub typ: Type,

    /// Artist, for music/book/audiobook releases.
    pub artist: Option<String>,
    /// Main title.
    pub title: Option<String>,
    /// Subtitle or episode title.
    pub subtitle: Option<String>,
    /// Alternate title, when the name carries an `aka` rename.
    pub alt: Option<String>,

    /// Platform (app/game releases).
    pub platform: Option<String>,
    /// CPU architecture (app releases).
    pub arch: Option<String>,

    /// Source medium (`WEB-DL`, `BluRay`, `LP`, …).
    pub source: Option<String>,
    /// Video resolution.
    pub resolution: Option<String>,
    /// Streaming collection / network.
    pub collection: Option<String>,

    /// Release year.
    pub year: Option<u16>,
    /// Release month.
    pub month: Option<u8>,
    /// Release day.
    pub day: Option<u8>,

    /// Season number.
    pub series: Option<u16>,
    /// Episode number.
    pub episode: Option<u16>,
    /// Version (`v2`, `v1.17`, …).
    pub version: Option<String>,
    /// Disc descriptor (`CD1`, `8x`, `2DiSCS`, …).
    pub disc: Option<String>,

    /// Video codecs, in encounter order.
    pub codec: Vec<String>,
    /// HDR flavors, in encounter order.
    pub hdr: Vec<String>,
    /// Audio codecs, in encounter order.
    pub audio: Vec<String>,
    /// Audio channel layout.
    pub channels: Option<String>,
    /// Other markers (`PROPER`, `REMUX`, `BOXSET`, …), in encounter order.
    pub other: Vec<String>,
    /// Cut markers, in encounter order.
    pub cut: Vec<String>,
    /// Edition markers, in encounter order.
    pub edition: Vec<String>,
    /// Languages, in encounter order.
    pub language: Vec<String>,

    /// Size marker (`1.5GiB`, …).
    pub size: Option<String>,
    /// Region code.
    pub region: Option<String>,
    /// Container format.
    pub container: Option<String>,
    /// Genre.
    pub genre: Option<String>,
    /// Catalog or music id.
    pub id: Option<String>,
    /// Release group.
    pub group: Option<String>,
    /// Generic bracketed metadata, as `key:value` pairs.
    pub meta: Vec<String>,
    /// Site marker.
    pub site: Option<String>,
    /// Checksum.
    pub sum: Option<String>,
    /// Password marker.
    pub pass: Option<String>,
    /// Request flag.
    pub req: bool,
    /// File extension.
    pub ext: Option<String>,

    #[serde(skip)]
    pub(crate) tags: Vec<Tag>,
    #[serde(skip)]
    pub(crate) dates: Vec<usize>,
    #[serde(skip)]
    pub(crate) unused: Vec<usize>,
    #[serde(skip)]
    pub(crate) end: usize,
}

impl Release {
    /// All tags, in capture order.
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// The index dividing front tags from back tags.
    pub fn end(&self) -> usize {
        self.end
    }

    /// Text tags not consumed by title extraction.
    pub fn unused(&self) -> Vec<&Tag> {
        self.unused.iter().map(|&i| &self.tags[i]).collect()
    }

    /// Date tags demoted during fixups.
    pub fn dates(&self) -> Vec<&Tag> {
        self.dates.iter().map(|&i| &self.tags[i]).collect()
    }

    /// Renders the release with the given verb. The original verb
    /// reconstructs the input byte-for-byte; the quoted verb additionally
    /// wraps it in quotes.
    pub fn render(&self, verb: Verb) -> Vec<u8> {
        match verb {
            Verb::Quoted => {
                let s = String::from_utf8_lossy(&self.render(Verb::Original)).into_owned();
                format!("{s:?}").into_bytes()
            }
            _ => {
                let mut buf = Vec::new();
                for tag in &self.tags {
                    buf.extend_from_slice(&tag.render(verb));
                }
                buf
            }
        }
    }

    /// The original input bytes.
    pub fn original(&self) -> Vec<u8> {
        self.render(Verb::Original)
    }
}

impl std::fmt::Display for Release {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.original()))
    }
}
