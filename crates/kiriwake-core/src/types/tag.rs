//! The token model.
//!
//! Every lexer match becomes a [`Tag`]: a typed, positioned slice of the
//! input. `values[0]` is always the original captured span (raw bytes, so
//! any byte sequence round-trips), `values[1..]` the category-specific
//! captures, at minimum a normalized primary value. Registry-bound tags keep
//! a [`Finder`] so the normalized value can be re-resolved against the
//! registry at any time.

use std::borrow::Cow;

use regex::Regex;

use crate::taginfo::{Finder, Taginfo};
use crate::types::Type;

/// Token type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagType {
    Whitespace,
    Delim,
    Text,
    Platform,
    Arch,
    Source,
    Resolution,
    Collection,
    Date,
    Series,
    Version,
    Disc,
    Codec,
    Hdr,
    Audio,
    Channels,
    Other,
    Cut,
    Edition,
    Language,
    Size,
    Region,
    Container,
    Genre,
    Id,
    Group,
    Meta,
    Ext,
}

impl TagType {
    /// Returns true when the type is one of `types`.
    pub fn is(self, types: &[TagType]) -> bool {
        types.contains(&self)
    }

    /// The registry category key for registry-driven token types.
    pub fn category(self) -> &'static str {
        match self {
            TagType::Platform => "platform",
            TagType::Arch => "arch",
            TagType::Source => "source",
            TagType::Resolution => "resolution",
            TagType::Collection => "collection",
            TagType::Codec => "codec",
            TagType::Hdr => "hdr",
            TagType::Audio => "audio",
            TagType::Channels => "channels",
            TagType::Other => "other",
            TagType::Cut => "cut",
            TagType::Edition => "edition",
            TagType::Language => "language",
            TagType::Size => "size",
            TagType::Region => "region",
            TagType::Container => "container",
            TagType::Genre => "genre",
            TagType::Group => "group",
            TagType::Ext => "ext",
            _ => "",
        }
    }
}

impl std::fmt::Display for TagType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TagType::Whitespace => "Whitespace",
            TagType::Delim => "Delim",
            TagType::Text => "Text",
            TagType::Platform => "Platform",
            TagType::Arch => "Arch",
            TagType::Source => "Source",
            TagType::Resolution => "Resolution",
            TagType::Collection => "Collection",
            TagType::Date => "Date",
            TagType::Series => "Series",
            TagType::Version => "Version",
            TagType::Disc => "Disc",
            TagType::Codec => "Codec",
            TagType::Hdr => "HDR",
            TagType::Audio => "Audio",
            TagType::Channels => "Channels",
            TagType::Other => "Other",
            TagType::Cut => "Cut",
            TagType::Edition => "Edition",
            TagType::Language => "Language",
            TagType::Size => "Size",
            TagType::Region => "Region",
            TagType::Container => "Container",
            TagType::Genre => "Genre",
            TagType::Id => "ID",
            TagType::Group => "Group",
            TagType::Meta => "Meta",
            TagType::Ext => "Ext",
        };
        f.write_str(s)
    }
}

/// Rendering mode for tags and releases.
///
/// - `o` — original captured bytes
/// - `s`, `r` — normalized value
/// - `v` — tag type, colon, quoted capture values
/// - `q` — all values, quoted
/// - `e` — `<Type:normalized>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Original,
    Normalized,
    TypeValues,
    Quoted,
    Embedded,
}

impl Verb {
    /// Maps a verb letter to its rendering mode.
    pub fn from_char(c: char) -> Option<Verb> {
        match c {
            'o' => Some(Verb::Original),
            's' | 'r' => Some(Verb::Normalized),
            'v' => Some(Verb::TypeValues),
            'q' => Some(Verb::Quoted),
            'e' => Some(Verb::Embedded),
            _ => None,
        }
    }
}

/// A classified, positioned slice of the input.
#[derive(Debug, Clone)]
pub struct Tag {
    typ: TagType,
    values: Vec<Vec<u8>>,
    finder: Option<Finder>,
    prev: Option<TagType>,
    prev_finder: Option<Finder>,
}

impl PartialEq for Tag {
    fn eq(&self, other: &Self) -> bool {
        self.typ == other.typ && self.values == other.values && self.prev == other.prev
    }
}

impl Tag {
    /// Creates a new tag. Every tag carries at least the original span and
    /// one capture value.
    pub fn new<V: Into<Vec<u8>>>(typ: TagType, finder: Option<Finder>, values: Vec<V>) -> Tag {
        let values: Vec<Vec<u8>> = values.into_iter().map(Into::into).collect();
        debug_assert!(values.len() >= 2, "a tag needs at least 2 values");
        Tag {
            typ,
            values,
            finder,
            prev: None,
            prev_finder: None,
        }
    }

    /// Returns a copy of the tag retyped to `typ`, remembering the previous
    /// type and finder.
    pub fn as_type(&self, typ: TagType, finder: Option<Finder>) -> Tag {
        Tag {
            typ,
            values: self.values.clone(),
            finder,
            prev: Some(self.typ),
            prev_finder: self.finder.clone(),
        }
    }

    /// The tag's type.
    pub fn tag_type(&self) -> TagType {
        self.typ
    }

    /// The type the tag had before its last demotion, if any.
    pub fn prev_type(&self) -> Option<TagType> {
        self.prev
    }

    /// The finder the tag had before its last demotion, if any.
    pub fn prev_finder(&self) -> Option<&Finder> {
        self.prev_finder.as_ref()
    }

    /// Returns true when the tag is of one of `types`.
    pub fn is(&self, types: &[TagType]) -> bool {
        self.tag_type().is(types)
    }

    /// The original captured span.
    pub fn original_bytes(&self) -> &[u8] {
        &self.values[0]
    }

    /// All capture values, lossily decoded.
    pub fn values(&self) -> Vec<String> {
        self.values
            .iter()
            .map(|v| String::from_utf8_lossy(v).into_owned())
            .collect()
    }

    fn value(&self, i: usize) -> Cow<'_, str> {
        self.values
            .get(i)
            .map(|v| String::from_utf8_lossy(v))
            .unwrap_or_default()
    }

    /// Resolves the tag's registry descriptor from its normalized value.
    pub fn info(&self) -> Option<&Taginfo> {
        self.finder.as_ref()?.find(&self.normalize())
    }

    /// The release type hinted by the tag's registry descriptor.
    pub fn info_type(&self) -> Type {
        self.info().map(Taginfo::release_type).unwrap_or_default()
    }

    /// Whether the tag's registry descriptor is marked type-exclusive.
    pub fn info_excl(&self) -> bool {
        self.info().is_some_and(Taginfo::excl)
    }

    /// The display title from the tag's registry descriptor, with `$N`
    /// placeholders substituted from the capture values.
    pub fn info_title(&self) -> String {
        let Some(info) = self.info() else {
            return String::new();
        };
        let mut s = info.title().to_string();
        for i in 1..self.values.len() {
            s = s.replace(&format!("${}", i + 1), &self.value(i));
        }
        s
    }

    /// Canonicalizes `s` through the finder and substitutes `$N`
    /// placeholders from the extra capture values. Only non-empty captures
    /// count: a category pattern is an alternation over every descriptor,
    /// so groups belonging to the other descriptors come back empty.
    fn canonical(&self, s: &str, extra: &[Vec<u8>]) -> String {
        let Some(finder) = &self.finder else {
            return s.to_string();
        };
        let mut s = match finder.find(s) {
            Some(info) => info.tag().to_string(),
            None => s.to_string(),
        };
        for (i, v) in extra.iter().filter(|v| !v.is_empty()).enumerate() {
            s = s.replace(
                &format!("${}", i + 1),
                &String::from_utf8_lossy(v),
            );
        }
        s
    }

    fn canonical1(&self) -> String {
        self.canonical(&self.value(1), &self.values[2.min(self.values.len())..])
    }

    /// The normalized value for the tag.
    pub fn normalize(&self) -> String {
        match self.tag_type() {
            TagType::Whitespace => self.whitespace(),
            TagType::Delim => self.delim(),
            TagType::Text => self.text(),
            TagType::Platform => self.platform(),
            TagType::Arch => self.arch(),
            TagType::Source => self.source(),
            TagType::Resolution => self.resolution(),
            TagType::Collection => self.collection(),
            TagType::Date => {
                let (year, month, day) = self.date();
                if month != 0 && day != 0 {
                    format!("{year}-{month:02}-{day:02}")
                } else {
                    year.to_string()
                }
            }
            TagType::Series => {
                let (series, episode) = self.series();
                if episode != 0 {
                    format!("S{series:02}E{episode:02}")
                } else {
                    format!("S{series:02}")
                }
            }
            TagType::Version => self.version(),
            TagType::Disc => self.disc(),
            TagType::Codec => self.codec(),
            TagType::Hdr => self.hdr(),
            TagType::Audio => self.audio(),
            TagType::Channels => self.channels(),
            TagType::Other => self.other(),
            TagType::Cut => self.cut(),
            TagType::Edition => self.edition(),
            TagType::Language => self.language(),
            TagType::Size => self.size(),
            TagType::Region => self.region(),
            TagType::Container => self.container(),
            TagType::Genre => self.genre(),
            TagType::Id => self.id(),
            TagType::Group => self.group(),
            TagType::Meta => {
                let (typ, s) = self.meta();
                match typ.as_str() {
                    "site" | "sum" => format!("[{s}]"),
                    "pass" => format!("{{{{{s}}}}}"),
                    "req" => "[REQ]".to_string(),
                    _ => format!("[[{typ}:{s}]]"),
                }
            }
            TagType::Ext => self.ext(),
        }
    }

    /// Determines if `s` matches the tag when rendered with `verb`,
    /// optionally restricted to `types`.
    pub fn matches(&self, s: &str, verb: Verb, types: &[TagType]) -> bool {
        if !types.is_empty() && !self.is(types) {
            return false;
        }
        let v = String::from_utf8_lossy(&self.render(verb)).into_owned();
        if s.is_empty() {
            return true;
        }
        let mut s = s.to_string();
        if verb == Verb::Normalized {
            if let Some(finder) = &self.finder {
                if let Some(info) = finder.find(&s) {
                    s = info.tag().to_string();
                }
            }
        }
        s == v
    }

    /// Determines if the regexp `pattern` matches the tag's normalized
    /// rendering, optionally restricted to `types`.
    pub fn matches_regexp(&self, pattern: &str, types: &[TagType]) -> bool {
        if !types.is_empty() && !self.is(types) {
            return false;
        }
        let v = String::from_utf8_lossy(&self.render(Verb::Normalized)).into_owned();
        Regex::new(pattern).map(|re| re.is_match(&v)).unwrap_or(false)
    }

    /// Renders the tag with the given verb.
    pub fn render(&self, verb: Verb) -> Vec<u8> {
        match verb {
            Verb::Original => self.values[0].clone(),
            Verb::Normalized => self.normalize().into_bytes(),
            Verb::TypeValues => {
                format!("{}:{:?}", self.tag_type(), &self.values()[1..]).into_bytes()
            }
            Verb::Quoted => format!("{:?}", self.values()).into_bytes(),
            Verb::Embedded => {
                format!("<{}:{}>", self.tag_type(), self.normalize().escape_debug()).into_bytes()
            }
        }
    }

    /// Normalized whitespace value.
    pub fn whitespace(&self) -> String {
        self.value(1).into_owned()
    }

    /// Normalized delimiter value.
    pub fn delim(&self) -> String {
        self.value(1).into_owned()
    }

    /// Normalized text value. A text tag demoted from a date keeps its
    /// original span.
    pub fn text(&self) -> String {
        if self.prev == Some(TagType::Date) {
            self.value(0).into_owned()
        } else {
            self.value(1).into_owned()
        }
    }

    /// Normalized platform value.
    pub fn platform(&self) -> String {
        self.canonical1()
    }

    /// Normalized arch value.
    pub fn arch(&self) -> String {
        self.canonical1()
    }

    /// Normalized source value.
    pub fn source(&self) -> String {
        self.canonical1()
    }

    /// Normalized resolution value.
    pub fn resolution(&self) -> String {
        self.canonical1()
    }

    /// Normalized collection value.
    pub fn collection(&self) -> String {
        self.canonical1()
    }

    /// Year, month, day captures. Zero means absent.
    pub fn date(&self) -> (u16, u8, u8) {
        let year = self.value(1).parse().unwrap_or(0);
        let month = self.value(2).parse().unwrap_or(0);
        let day = self.value(3).parse().unwrap_or(0);
        (year, month, day)
    }

    /// Season and episode captures. Zero means absent.
    pub fn series(&self) -> (u16, u16) {
        let series = self.value(1).parse().unwrap_or(0);
        let episode = self.value(2).parse().unwrap_or(0);
        (series, episode)
    }

    /// Normalized version value.
    pub fn version(&self) -> String {
        self.value(1).to_lowercase()
    }

    /// Normalized disc value, formatted per its kind.
    pub fn disc(&self) -> String {
        let num: u16 = self.value(2).parse().unwrap_or(0);
        match self.value(1).as_ref() {
            "CD" | "DVD" => format!("{}{num}", self.value(1)),
            "S" => format!("{num}DiSCS"),
            "X" => format!("{num}x"),
            _ => format!("D{num:02}"),
        }
    }

    /// Normalized codec value.
    pub fn codec(&self) -> String {
        self.canonical1()
    }

    /// Normalized HDR value.
    pub fn hdr(&self) -> String {
        self.canonical1()
    }

    /// Normalized audio value.
    pub fn audio(&self) -> String {
        self.canonical1()
    }

    /// Normalized channels value, reduced to `D.D` form.
    pub fn channels(&self) -> String {
        let s: String = self
            .canonical(&self.value(1), &[])
            .chars()
            .filter(char::is_ascii_digit)
            .collect();
        if s.len() < 2 {
            return s;
        }
        format!("{}.{}", &s[..1], &s[1..])
    }

    /// Normalized other value.
    pub fn other(&self) -> String {
        let s = self.canonical1();
        match s.to_uppercase().as_str() {
            y @ ("19XX" | "20XX") => y.to_string(),
            _ => s,
        }
    }

    /// Normalized cut value.
    pub fn cut(&self) -> String {
        self.canonical1()
    }

    /// Normalized edition value.
    pub fn edition(&self) -> String {
        self.canonical1()
    }

    /// Normalized language value.
    pub fn language(&self) -> String {
        self.canonical1()
    }

    /// Normalized size value.
    pub fn size(&self) -> String {
        self.canonical1().to_uppercase().replace('I', "i")
    }

    /// Normalized region value.
    pub fn region(&self) -> String {
        self.canonical1()
    }

    /// Normalized container value.
    pub fn container(&self) -> String {
        self.canonical1()
    }

    /// Normalized genre value.
    pub fn genre(&self) -> String {
        self.canonical1()
    }

    /// Normalized id value.
    pub fn id(&self) -> String {
        self.canonical1()
    }

    /// Normalized group value.
    pub fn group(&self) -> String {
        self.value(1).into_owned()
    }

    /// Meta key and value.
    pub fn meta(&self) -> (String, String) {
        (self.value(1).into_owned(), self.value(2).into_owned())
    }

    /// Normalized extension value.
    pub fn ext(&self) -> String {
        self.value(1).to_lowercase()
    }
}

/// Finds up to `count` tags matching `s` under `verb`, optionally restricted
/// to `types`, returning the matches and the index one past the last tag
/// visited. A `count` of `None` means no limit. An empty `s` with no type
/// restriction copies the first `count` tags.
pub fn find(
    tags: &[Tag],
    s: &str,
    count: Option<usize>,
    verb: char,
    types: &[TagType],
) -> (Vec<Tag>, usize) {
    let count = count.unwrap_or(tags.len());
    if s.is_empty() && types.is_empty() {
        let count = count.min(tags.len());
        return (tags[..count].to_vec(), count);
    }
    let regexp = verb == 'r';
    let verb = Verb::from_char(verb).unwrap_or(Verb::Normalized);
    let mut v = Vec::new();
    let mut i = 0;
    while i < tags.len() && v.len() < count {
        let ok = if regexp {
            tags[i].matches_regexp(s, types)
        } else {
            tags[i].matches(s, verb, types)
        };
        if ok {
            v.push(tags[i].clone());
        }
        i += 1;
    }
    (v, i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taginfo;

    fn genre_finder() -> Finder {
        let m = taginfo::all(&[]).unwrap();
        Finder::new(m["genre"].clone())
    }

    fn text(s: &str) -> Tag {
        Tag::new(TagType::Text, None, vec![s.as_bytes(), s.as_bytes()])
    }

    #[test]
    fn tag_requires_two_values() {
        let tag = text("a");
        assert_eq!(tag.original_bytes(), b"a");
        assert_eq!(tag.text(), "a");
    }

    #[test]
    fn as_type_remembers_previous() {
        let f = genre_finder();
        let tag = Tag::new(TagType::Genre, Some(f), vec![b"anime".to_vec(), b"anime".to_vec()]);
        let demoted = tag.as_type(TagType::Text, None);
        assert_eq!(demoted.tag_type(), TagType::Text);
        assert_eq!(demoted.prev_type(), Some(TagType::Genre));
        assert_eq!(demoted.original_bytes(), b"anime");
    }

    #[test]
    fn info_resolves_case_insensitively() {
        let f = genre_finder();
        for s in ["anime", "Anime", "ANIME", "ANiME"] {
            let tag = Tag::new(TagType::Genre, Some(f.clone()), vec![s.as_bytes(), s.as_bytes()]);
            let info = tag.info().expect("genre should resolve");
            assert_eq!(info.tag(), "Anime");
        }
    }

    #[test]
    fn date_normalize() {
        let tag = Tag::new(
            TagType::Date,
            None,
            vec![b"2009-01-02".to_vec(), b"2009".to_vec(), b"01".to_vec(), b"02".to_vec()],
        );
        assert_eq!(tag.date(), (2009, 1, 2));
        assert_eq!(tag.normalize(), "2009-01-02");

        let tag = Tag::new(
            TagType::Date,
            None,
            vec![b"2009".to_vec(), b"2009".to_vec(), Vec::new(), Vec::new()],
        );
        assert_eq!(tag.normalize(), "2009");
    }

    #[test]
    fn series_normalize() {
        let tag = Tag::new(
            TagType::Series,
            None,
            vec![b"S03E02".to_vec(), b"03".to_vec(), b"02".to_vec()],
        );
        assert_eq!(tag.series(), (3, 2));
        assert_eq!(tag.normalize(), "S03E02");
    }

    #[test]
    fn disc_normalize_kinds() {
        for (kind, num, exp) in [
            ("CD", "1", "CD1"),
            ("DVD", "2", "DVD2"),
            ("S", "1", "1DiSCS"),
            ("X", "8", "8x"),
            ("D", "1", "D01"),
        ] {
            let tag = Tag::new(
                TagType::Disc,
                None,
                vec![kind.as_bytes(), kind.as_bytes(), num.as_bytes()],
            );
            assert_eq!(tag.disc(), exp, "kind {kind}");
        }
    }

    #[test]
    fn render_verbs() {
        let tag = Tag::new(
            TagType::Date,
            None,
            vec![b"2009".to_vec(), b"2009".to_vec(), Vec::new(), Vec::new()],
        );
        assert_eq!(tag.render(Verb::Original), b"2009");
        assert_eq!(tag.render(Verb::Normalized), b"2009");
        assert_eq!(tag.render(Verb::Embedded), b"<Date:2009>");
    }

    #[test]
    fn find_by_value_and_type() {
        let f = genre_finder();
        let tags = vec![
            text("a"),
            text("b"),
            Tag::new(TagType::Genre, Some(f.clone()), vec![b"anime".to_vec(), b"anime".to_vec()]),
            text("a"),
            Tag::new(TagType::Genre, Some(f.clone()), vec![b"horror".to_vec(), b"horror".to_vec()]),
            text("c"),
        ];
        let (v, _) = find(&tags, "a", None, 'o', &[]);
        assert_eq!(v.len(), 2);
        let (v, _) = find(&tags, "a", Some(1), 'o', &[]);
        assert_eq!(v.len(), 1);
        let (v, _) = find(&tags, "A", Some(1), 'o', &[]);
        assert_eq!(v.len(), 0);
        let (v, _) = find(&tags, "", None, 's', &[TagType::Text]);
        assert_eq!(v.len(), 4);
        let (v, _) = find(&tags, "", None, 'o', &[TagType::Genre]);
        assert_eq!(v.len(), 2);
        // normalized lookup goes through the registry
        for s in ["horror", "HORROR", "Horror"] {
            let (v, _) = find(&tags, s, None, 's', &[]);
            assert_eq!(v.len(), 1, "lookup {s}");
            assert_eq!(v[0].normalize(), "Horror");
        }
        // regexp matching
        let (v, _) = find(&tags, "(?i)^anime$", None, 'r', &[]);
        assert_eq!(v.len(), 1);
        let (v, _) = find(&tags, "(?i)^(anime|horror)$", None, 'r', &[]);
        assert_eq!(v.len(), 2);
    }
}
