//! Tag-knowledge registry.
//!
//! A registry is a map of category key (`source`, `resolution`, `codec`, …)
//! to descriptors loaded from CSV. Each descriptor carries the canonical tag
//! text, a display title, an optional alternate pattern, an optional
//! back-of-name alias, an associated release type hint and an exclusivity
//! flag. Tokens produced by the lexers keep a [`Finder`] back-reference into
//! their category so normalized values can be re-resolved on demand.

pub mod pattern;

use std::borrow::Cow;
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::sync::Arc;

use regex::Regex;

use crate::error::{KiriwakeError, Result};
use crate::types::Type;

/// Number of CSV columns, including the leading category column.
const COLUMNS: usize = 7;

/// Mandatory CSV header row.
const HEADER: [&str; COLUMNS] = [
    "Type",
    "Tag",
    "Title",
    "Regexp",
    "Other",
    "ReleaseType",
    "TypeExclusive",
];

/// The embedded default registry.
const TAGINFO_CSV: &str = include_str!("taginfo.csv");

/// A single tag descriptor.
#[derive(Debug, Clone)]
pub struct Taginfo {
    tag: String,
    title: String,
    regexp: String,
    other: String,
    typ: Type,
    excl: bool,
    re: Regex,
}

impl Taginfo {
    /// Creates a descriptor from its six CSV fields
    /// (`Tag,Title,Regexp,Other,ReleaseType,TypeExclusive`).
    pub fn new(fields: [&str; COLUMNS - 1]) -> Result<Self> {
        Self::from_fields(fields, 0)
    }

    fn from_fields(fields: [&str; COLUMNS - 1], line: usize) -> Result<Self> {
        let [tag, title, regexp, other, typstr, excl] = fields;
        if tag.is_empty() {
            return Err(KiriwakeError::MissingTag { line });
        }
        let typ = Type::from_tag(typstr).ok_or_else(|| KiriwakeError::InvalidReleaseType {
            line,
            value: typstr.to_string(),
        })?;
        let title = if title.is_empty() { tag } else { title };
        let mut info = Taginfo {
            tag: tag.to_string(),
            title: title.to_string(),
            regexp: regexp.to_string(),
            other: other.to_string(),
            typ,
            excl: excl == "1",
            // placeholder, replaced below
            re: Regex::new("^$")?,
        };
        info.re = Regex::new(&format!("(?i)^(?:{})$", info.pattern())).map_err(|_| {
            KiriwakeError::InvalidPattern {
                line,
                tag: tag.to_string(),
                pattern: regexp.to_string(),
            }
        })?;
        Ok(info)
    }

    /// The canonical normalized tag text.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The display title (falls back to the tag text).
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The raw alternate pattern, empty when the tag matches literally.
    pub fn regexp(&self) -> &str {
        &self.regexp
    }

    /// The back-of-name alias, used by the group lexer and as an extra genre
    /// pattern.
    pub fn other(&self) -> &str {
        &self.other
    }

    /// The associated release type hint.
    pub fn release_type(&self) -> Type {
        self.typ
    }

    /// Whether the tag is exclusive to its release type.
    pub fn excl(&self) -> bool {
        self.excl
    }

    /// The effective pattern: the alternate pattern when present, the escaped
    /// tag text otherwise.
    pub fn pattern(&self) -> Cow<'_, str> {
        if !self.regexp.is_empty() {
            Cow::Borrowed(&self.regexp)
        } else {
            Cow::Owned(regex::escape(&self.tag))
        }
    }

    /// Whether `s` matches this descriptor, anchored and case-insensitive.
    pub fn matches(&self, s: &str) -> bool {
        self.re.is_match(s)
    }
}

/// Registry descriptors keyed by category.
pub type TaginfoMap = HashMap<String, Vec<Taginfo>>;

/// A cheaply cloneable lookup into one registry category.
///
/// Looking up the same normalized value twice always returns the same
/// descriptor: descriptors are matched in registry order and the first match
/// wins.
#[derive(Debug, Clone, Default)]
pub struct Finder(Arc<[Taginfo]>);

impl Finder {
    /// Creates a finder over the given descriptors.
    pub fn new(infos: Vec<Taginfo>) -> Self {
        Finder(infos.into())
    }

    /// Finds the first descriptor matching `s`.
    pub fn find(&self, s: &str) -> Option<&Taginfo> {
        self.0.iter().find(|info| info.matches(s))
    }

    /// The descriptors backing this finder.
    pub fn infos(&self) -> &[Taginfo] {
        &self.0
    }
}

/// Loads registry CSV from a reader.
///
/// The header row is mandatory and must match exactly. Duplicate
/// (category, tag) pairs, malformed rows, invalid patterns and unknown
/// release types are reported with their 1-based data line number.
pub fn load<R: Read>(rdr: R) -> Result<TaginfoMap> {
    let mut lines = BufReader::new(rdr).lines();
    let header = match lines.next() {
        None => return Err(KiriwakeError::EmptyCsv),
        Some(Err(e)) => {
            return Err(KiriwakeError::RegistryIo {
                file: "<reader>".into(),
                source: e,
            });
        }
        Some(Ok(line)) => line,
    };
    let fields = split_csv(&header, 1)?;
    if fields.len() != COLUMNS || fields.iter().zip(HEADER).any(|(a, b)| a.as_str() != b) {
        return Err(KiriwakeError::InvalidHeader);
    }
    let mut m: TaginfoMap = HashMap::new();
    let mut exists: HashMap<(String, String), usize> = HashMap::new();
    let mut line = 0;
    for s in lines {
        let s = s.map_err(|e| KiriwakeError::RegistryIo {
            file: "<reader>".into(),
            source: e,
        })?;
        line += 1;
        if s.is_empty() {
            continue;
        }
        let fields = split_csv(&s, line)?;
        if fields.len() != COLUMNS {
            return Err(KiriwakeError::InvalidColumns {
                line,
                expected: COLUMNS,
                got: fields.len(),
            });
        }
        let key = (fields[0].clone(), fields[1].clone());
        if let Some(&prev) = exists.get(&key) {
            return Err(KiriwakeError::DuplicateTag {
                line,
                prev,
                category: key.0,
                tag: key.1,
            });
        }
        let info = Taginfo::from_fields(
            [
                fields[1].as_str(),
                fields[2].as_str(),
                fields[3].as_str(),
                fields[4].as_str(),
                fields[5].as_str(),
                fields[6].as_str(),
            ],
            line,
        )?;
        m.entry(fields[0].clone()).or_default().push(info);
        exists.insert(key, line);
    }
    if line == 0 {
        return Err(KiriwakeError::EmptyCsv);
    }
    Ok(m)
}

/// Loads registry CSV from a string.
pub fn load_str(s: &str) -> Result<TaginfoMap> {
    load(s.as_bytes())
}

/// Loads registry CSV from a file.
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<TaginfoMap> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|e| KiriwakeError::RegistryIo {
        file: path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default(),
        source: e,
    })?;
    load(file)
}

/// Loads the embedded default registry, merging any extra descriptor maps on
/// top of it.
pub fn all(extras: &[TaginfoMap]) -> Result<TaginfoMap> {
    let mut m = load_str(TAGINFO_CSV)?;
    for extra in extras {
        for (k, v) in extra {
            m.entry(k.clone()).or_default().extend(v.iter().cloned());
        }
    }
    tracing::debug!(
        categories = m.len(),
        descriptors = m.values().map(Vec::len).sum::<usize>(),
        "loaded tag registry"
    );
    Ok(m)
}

/// The raw embedded registry CSV.
pub fn all_csv() -> &'static str {
    TAGINFO_CSV
}

/// Splits one CSV record, honoring double-quoted fields with `""` escapes.
fn split_csv(s: &str, line: usize) -> Result<Vec<String>> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut chars = s.chars().peekable();
    let mut quoted = false;
    loop {
        match chars.next() {
            None => {
                if quoted {
                    return Err(KiriwakeError::MalformedCsv { line });
                }
                fields.push(std::mem::take(&mut field));
                return Ok(fields);
            }
            Some('"') if quoted => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    quoted = false;
                }
            }
            Some('"') if field.is_empty() => quoted = true,
            Some('"') => return Err(KiriwakeError::MalformedCsv { line }),
            Some(',') if !quoted => fields.push(std::mem::take(&mut field)),
            Some(c) => field.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_registry_loads() {
        let m = all(&[]).unwrap();
        for key in [
            "source",
            "resolution",
            "codec",
            "audio",
            "channels",
            "hdr",
            "other",
            "cut",
            "edition",
            "language",
            "region",
            "container",
            "platform",
            "arch",
            "collection",
            "genre",
            "ext",
        ] {
            assert!(m.contains_key(key), "missing category {key}");
        }
    }

    #[test]
    fn embedded_patterns_match_their_own_tag() {
        let m = all(&[]).unwrap();
        for (category, infos) in &m {
            for info in infos {
                if info.tag().contains('$') {
                    continue;
                }
                assert!(
                    info.matches(info.tag()),
                    "category {category} tag {:?} does not match its own pattern {:?}",
                    info.tag(),
                    info.pattern()
                );
            }
        }
    }

    #[test]
    fn find_is_deterministic() {
        let m = all(&[]).unwrap();
        let f = Finder::new(m["source"].clone());
        let a = f.find("web-dl").map(|i| i.tag().to_string());
        let b = f.find("web-dl").map(|i| i.tag().to_string());
        assert!(a.is_some());
        assert_eq!(a, b);
    }

    #[test]
    fn finder_is_case_insensitive() {
        let m = all(&[]).unwrap();
        let f = Finder::new(m["genre"].clone());
        for s in ["anime", "Anime", "ANIME", "ANiME"] {
            let info = f.find(s).expect("genre should resolve");
            assert_eq!(info.tag(), "Anime");
        }
    }

    #[test]
    fn rejects_missing_header() {
        let err = load_str("source,WEB,,,,,\n").unwrap_err();
        assert!(matches!(err, KiriwakeError::InvalidHeader));
    }

    #[test]
    fn rejects_empty_input() {
        assert!(matches!(load_str(""), Err(KiriwakeError::EmptyCsv)));
        let header = "Type,Tag,Title,Regexp,Other,ReleaseType,TypeExclusive\n";
        assert!(matches!(load_str(header), Err(KiriwakeError::EmptyCsv)));
    }

    #[test]
    fn rejects_wrong_column_count() {
        let csv = "Type,Tag,Title,Regexp,Other,ReleaseType,TypeExclusive\nsource,WEB\n";
        match load_str(csv) {
            Err(KiriwakeError::InvalidColumns { line: 1, got: 2, .. }) => {}
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn rejects_duplicate_tag() {
        let csv = "Type,Tag,Title,Regexp,Other,ReleaseType,TypeExclusive\n\
                   source,WEB,,,,,\n\
                   source,WEB,,,,,\n";
        match load_str(csv) {
            Err(KiriwakeError::DuplicateTag { line: 2, prev: 1, .. }) => {}
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn rejects_invalid_release_type() {
        let csv = "Type,Tag,Title,Regexp,Other,ReleaseType,TypeExclusive\n\
                   source,WEB,,,,bogus,\n";
        match load_str(csv) {
            Err(KiriwakeError::InvalidReleaseType { line: 1, value }) => {
                assert_eq!(value, "bogus");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn rejects_invalid_pattern() {
        let csv = "Type,Tag,Title,Regexp,Other,ReleaseType,TypeExclusive\n\
                   source,WEB,,([unclosed,,,\n";
        match load_str(csv) {
            Err(KiriwakeError::InvalidPattern { line: 1, tag, .. }) => {
                assert_eq!(tag, "WEB");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn quoted_fields_parse() {
        let csv = "Type,Tag,Title,Regexp,Other,ReleaseType,TypeExclusive\n\
                   edition,\"Big, Fancy\",,big[-._ ]fancy,,,\n";
        let m = load_str(csv).unwrap();
        assert_eq!(m["edition"][0].tag(), "Big, Fancy");
    }

    #[test]
    fn title_falls_back_to_tag() {
        let csv = "Type,Tag,Title,Regexp,Other,ReleaseType,TypeExclusive\n\
                   source,WEB-DL,Web Download,,,,\n\
                   source,HDTV,,,,,\n";
        let m = load_str(csv).unwrap();
        assert_eq!(m["source"][0].title(), "Web Download");
        assert_eq!(m["source"][1].title(), "HDTV");
    }
}
