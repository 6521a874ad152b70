//! The lexer set.
//!
//! Lexers come in two flavors. *Once* lexers run exactly once, anchored at
//! the edges of the input: whitespace trim, file extension, bracketed
//! metadata and the release group. *Multi* lexers are tried in a fixed order
//! at the current cursor while the parser scans left to right.
//!
//! Lexers match either against `src` (the raw bytes) or `buf` (a working
//! copy with `_`, `,` and `+` replaced by spaces so `\b` behaves), but every
//! emitted tag stores its original `src` span, which keeps the token
//! sequence loss-free.

use std::collections::HashMap;

use regex::bytes::Regex;

use crate::error::Result;
use crate::taginfo::{Finder, Taginfo, TaginfoMap, pattern};
use crate::types::{Tag, TagType};

/// A pattern that can never match.
const NEVER: &str = "[^\\s\\S]";

/// Context shared by all lexers, built once at parser construction.
pub(crate) struct LexContext {
    /// Single-delimiter-run matcher, anchored at the cursor.
    pub delim: Regex,
    /// Upper-cased short registry tag fragments, rejected as groups and
    /// bracket contents.
    pub short: HashMap<String, bool>,
}

/// The lexer interface: inspect `src`/`buf` at `i..n`, append tags to
/// `start` or `end`, advance `i` or retreat `n`. Returns whether anything
/// matched.
pub(crate) trait Lex: Send + Sync {
    fn lex(
        &self,
        src: &[u8],
        buf: &[u8],
        start: &mut Vec<Tag>,
        end: &mut Vec<Tag>,
        i: &mut usize,
        n: &mut usize,
    ) -> bool;
}

fn finder(infos: &TaginfoMap, key: &str) -> Finder {
    Finder::new(infos.get(key).cloned().unwrap_or_default())
}

fn category(infos: &TaginfoMap, key: &str) -> Vec<Taginfo> {
    infos.get(key).cloned().unwrap_or_default()
}

fn vec2(a: &[u8], b: &[u8]) -> Vec<Vec<u8>> {
    vec![a.to_vec(), b.to_vec()]
}

fn contains_any(hay: &[u8], set: &[u8]) -> bool {
    hay.iter().any(|b| set.contains(b))
}

// ---------------------------------------------------------------- whitespace

/// Trims leading and trailing whitespace, including decorative runes
/// (U+2B50) and the variation selector U+FE0F.
pub(crate) struct TrimWhitespaceLexer {
    prefix: Regex,
    suffix: Regex,
}

impl TrimWhitespaceLexer {
    pub fn new() -> Result<Self> {
        let s = "(?:\\t|\\n|\\x0c|\\r| |\u{2b50}|\u{fe0f})+";
        Ok(TrimWhitespaceLexer {
            prefix: Regex::new(&format!("^({s})"))?,
            suffix: Regex::new(&format!("({s})$"))?,
        })
    }
}

impl Lex for TrimWhitespaceLexer {
    fn lex(
        &self,
        src: &[u8],
        _buf: &[u8],
        start: &mut Vec<Tag>,
        end: &mut Vec<Tag>,
        i: &mut usize,
        n: &mut usize,
    ) -> bool {
        if let Some(m) = self.prefix.find(&src[*i..*n]) {
            start.push(Tag::new(
                TagType::Whitespace,
                None,
                vec2(m.as_bytes(), m.as_bytes()),
            ));
            *i += m.len();
        }
        if let Some(m) = self.suffix.find(&src[*i..*n]) {
            end.push(Tag::new(
                TagType::Whitespace,
                None,
                vec2(m.as_bytes(), m.as_bytes()),
            ));
            *n -= m.len();
        }
        true
    }
}

// ----------------------------------------------------------------- extension

/// Matches a known file extension at the very end.
pub(crate) struct ExtLexer {
    re: Regex,
    f: Finder,
}

impl ExtLexer {
    pub fn new(infos: &TaginfoMap) -> Result<Self> {
        let ext = category(infos, "ext");
        Ok(ExtLexer {
            re: Regex::new(&format!(r"(?i)\.{}", pattern::taginfo("$", &ext)))?,
            f: finder(infos, "ext"),
        })
    }
}

impl Lex for ExtLexer {
    fn lex(
        &self,
        src: &[u8],
        _buf: &[u8],
        _start: &mut Vec<Tag>,
        end: &mut Vec<Tag>,
        i: &mut usize,
        n: &mut usize,
    ) -> bool {
        if let Some(caps) = self.re.captures(&src[*i..*n]) {
            let m0 = caps.get(0).map(|m| m.as_bytes()).unwrap_or_default();
            let m1 = caps.get(1).map(|m| m.as_bytes()).unwrap_or_default();
            end.push(Tag::new(TagType::Ext, Some(self.f.clone()), vec2(m0, m1)));
            *n -= m0.len();
            return true;
        }
        false
    }
}

// ---------------------------------------------------------------------- meta

struct MetaForm {
    key: String,
    prefix: Regex,
    suffix: Regex,
    has_two: bool,
    short_open: bool,
}

/// Scans both edges for bracketed metadata: `[[ key:value ]]`, `[REQ]`,
/// `(REQ)`, `{REQ}`, 8-hex-digit checksums, `[site]`, `-={site}=-` and
/// `{{pass}}`. Alternates between bracket forms and single delimiter runs;
/// a key cannot match twice on the same side, and short registry tags are
/// rejected inside single-character brackets.
pub(crate) struct MetaLexer {
    forms: Vec<MetaForm>,
    delim: Regex,
    short: HashMap<String, bool>,
}

impl MetaLexer {
    pub fn new(ctx: &LexContext) -> Result<Self> {
        // (key, open, close, inner); an empty key takes the key from the
        // first capture group
        let specs: [(&str, &str, &str, &str); 8] = [
            ("", "[[", "]]", r"([a-zA-Z][a-zA-Z0-9_]{0,15}):\s*([^ \t\]]{1,32})"),
            ("req", "[", "]", r"(REQ(?:UEST)?)"),
            ("req", "(", ")", r"(REQ(?:UEST)?)"),
            ("req", "{", "}", r"(REQ(?:UEST)?)"),
            ("sum", "[", "]", r"([0-9A-F]{8})"),
            ("site", "[", "]", r"([^ \t\]]{1,32})"),
            ("site", "-={", "}=-", r"([^ \t\}]{1,32})"),
            ("pass", "{{", "}}", r"([^ \t\}]{1,32})"),
        ];
        let mut forms = Vec::with_capacity(specs.len());
        for (key, open, close, inner) in specs {
            let s = format!(
                r"\s*{}\s*{}\s*{}\s*",
                regex::escape(open),
                inner,
                regex::escape(close)
            );
            let prefix = Regex::new(&format!("^{s}"))?;
            let suffix = Regex::new(&format!("{s}$"))?;
            let has_two = prefix.captures_len() == 3;
            forms.push(MetaForm {
                key: key.to_string(),
                prefix,
                suffix,
                has_two,
                short_open: open.len() == 1,
            });
        }
        Ok(MetaLexer {
            forms,
            delim: ctx.delim.clone(),
            short: ctx.short.clone(),
        })
    }

    /// Tries the forms in order against `hay`, returning the first accepted
    /// match as (matched-length, key, value). A form whose key was already
    /// seen on this side, whose value is a short registry tag inside a
    /// single-character bracket, or whose value contains whitespace is
    /// rejected, and the remaining forms still get a chance.
    fn try_forms(
        &self,
        hay: &[u8],
        suffix: bool,
        prev: &mut HashMap<String, bool>,
    ) -> Option<(usize, String, Vec<u8>)> {
        for form in &self.forms {
            let re = if suffix { &form.suffix } else { &form.prefix };
            let Some(caps) = re.captures(hay) else {
                continue;
            };
            let m0 = caps.get(0).map(|m| m.len()).unwrap_or_default();
            let (k, v) = if form.has_two {
                (
                    String::from_utf8_lossy(caps.get(1).map(|m| m.as_bytes()).unwrap_or_default())
                        .into_owned(),
                    caps.get(2).map(|m| m.as_bytes().to_vec()).unwrap_or_default(),
                )
            } else {
                (
                    form.key.clone(),
                    caps.get(1).map(|m| m.as_bytes().to_vec()).unwrap_or_default(),
                )
            };
            let short = form.short_open
                && self
                    .short
                    .contains_key(&String::from_utf8_lossy(&v).to_uppercase());
            let seen = prev.insert(k.clone(), true).unwrap_or(false);
            if !seen && !short && !contains_any(&v, b"\t\r\n\x0c +") {
                return Some((m0, k, v));
            }
        }
        None
    }
}

impl Lex for MetaLexer {
    fn lex(
        &self,
        src: &[u8],
        _buf: &[u8],
        start: &mut Vec<Tag>,
        end: &mut Vec<Tag>,
        i: &mut usize,
        n: &mut usize,
    ) -> bool {
        let mut prev: HashMap<String, bool> = HashMap::new();
        let mut d: Vec<u8> = Vec::new();
        // prefixes
        while *i < *n {
            match self.try_forms(&src[*i..*n], false, &mut prev) {
                Some((m0, k, v)) => {
                    if !d.is_empty() {
                        start.push(Tag::new(TagType::Delim, None, vec2(&d, &d)));
                        d.clear();
                    }
                    start.push(Tag::new(
                        TagType::Meta,
                        None,
                        vec![src[*i..*i + m0].to_vec(), k.into_bytes(), v],
                    ));
                    *i += m0;
                }
                _ if self.delim.is_match(&src[*i..*i + 1]) => {
                    d.push(src[*i]);
                    *i += 1;
                }
                _ => break,
            }
        }
        // backtrack unconsumed delimiters
        if !d.is_empty() {
            *i -= d.len();
            d.clear();
        }
        // suffixes
        while *i < *n {
            match self.try_forms(&src[*i..*n], true, &mut prev) {
                Some((m0, k, v)) => {
                    if !d.is_empty() {
                        end.push(Tag::new(TagType::Delim, None, vec2(&d, &d)));
                        d.clear();
                    }
                    end.push(Tag::new(
                        TagType::Meta,
                        None,
                        vec![src[*n - m0..*n].to_vec(), k.into_bytes(), v],
                    ));
                    *n -= m0;
                }
                _ if self.delim.is_match(&src[*n - 1..*n]) => {
                    d.insert(0, src[*n - 1]);
                    *n -= 1;
                }
                _ => break,
            }
        }
        if !d.is_empty() {
            end.push(Tag::new(TagType::Delim, None, vec2(&d, &d)));
        }
        true
    }
}

// --------------------------------------------------------------------- group

/// Matches the release group at the right end: first rare other-suffix
/// aliases, then known registry groups after a delimiter run, then the
/// heuristic "text after the last dash after the last year" rule.
pub(crate) struct GroupLexer {
    special: Regex,
    known: Regex,
    year: Regex,
    lax: Regex,
    groupf: Finder,
    otherf: Finder,
    short: HashMap<String, bool>,
}

impl GroupLexer {
    pub fn new(infos: &TaginfoMap, ctx: &LexContext) -> Result<Self> {
        let group = category(infos, "group");
        let other = category(infos, "other");
        let aliases: Vec<&str> = other
            .iter()
            .map(Taginfo::other)
            .filter(|s| !s.is_empty())
            .collect();
        let special = if aliases.is_empty() {
            NEVER.to_string()
        } else {
            format!("(?i)_({})$", aliases.join("|"))
        };
        let known = if group.is_empty() {
            NEVER.to_string()
        } else {
            format!(r"(?i)[\-\._ ]+{}", pattern::taginfo("$", &group))
        };
        Ok(GroupLexer {
            special: Regex::new(&special)?,
            known: Regex::new(&known)?,
            year: Regex::new(r"\b(?:19|20)\d{2}\b")?,
            lax: Regex::new(r"(?i)^[a-z_ ]{4,10}$")?,
            groupf: finder(infos, "group"),
            otherf: finder(infos, "other"),
            short: ctx.short.clone(),
        })
    }
}

impl Lex for GroupLexer {
    fn lex(
        &self,
        src: &[u8],
        buf: &[u8],
        _start: &mut Vec<Tag>,
        end: &mut Vec<Tag>,
        i: &mut usize,
        n: &mut usize,
    ) -> bool {
        // special end tags riding on groups
        if let Some(caps) = self.special.captures(&src[*i..*n]) {
            let m0 = caps.get(0).map(|m| m.as_bytes()).unwrap_or_default();
            let m1 = caps.get(1).map(|m| m.as_bytes()).unwrap_or_default();
            end.push(Tag::new(TagType::Other, Some(self.otherf.clone()), vec2(m0, m1)));
            *n -= m0.len();
        }
        // known groups
        if let Some(caps) = self.known.captures(&src[*i..*n]) {
            let m0 = caps.get(0).map(|m| m.as_bytes()).unwrap_or_default();
            let m1 = caps.get(1).map(|m| m.as_bytes()).unwrap_or_default();
            end.push(Tag::new(TagType::Group, Some(self.groupf.clone()), vec2(m0, m1)));
            *n -= m0.len();
            return true;
        }
        // clamp the search to after the last year
        let mut l = *i;
        if let Some(m) = self.year.find(&buf[l..*n]) {
            l += m.end();
        }
        // locate the final dash and validate the candidate
        if let Some(j) = buf[l..*n].iter().rposition(|&b| b == b'-') {
            let s = &src[l + j + 1..*n];
            let grp: &[u8] = {
                let start = s.iter().position(|&b| !b" \t_".contains(&b));
                let stop = s.iter().rposition(|&b| !b" \t_".contains(&b));
                match (start, stop) {
                    (Some(a), Some(b)) => &s[a..=b],
                    _ => &[],
                }
            };
            let lax_ok = s.len() <= 14 && self.lax.is_match(grp);
            if !grp.is_empty()
                && (!contains_any(s, b" _.()[]+") || lax_ok)
                && !self
                    .short
                    .contains_key(String::from_utf8_lossy(grp).as_ref())
            {
                end.push(Tag::new(TagType::Group, None, vec2(s, grp)));
                end.push(Tag::new(
                    TagType::Delim,
                    None,
                    vec2(&src[l + j..l + j + 1], b"-"),
                ));
                *n = l + j;
            }
        }
        false
    }
}

// ------------------------------------------------------------ named captures

/// A set of alternative patterns with named capture groups, tried in order
/// against `buf`. The first regex match wins; its named, non-empty captures
/// are returned as name/value pairs along with the matched `src` span.
pub(crate) struct NamedPatterns {
    regexps: Vec<Regex>,
    names: Vec<Vec<(usize, String)>>,
}

pub(crate) struct NamedMatch {
    /// The matched original span.
    pub orig: Vec<u8>,
    /// Named non-empty captures, in group order.
    pub pairs: Vec<(String, Vec<u8>)>,
}

impl NamedPatterns {
    pub fn new(patterns: &[&str]) -> Result<Self> {
        let mut regexps = Vec::with_capacity(patterns.len());
        let mut names = Vec::with_capacity(patterns.len());
        for p in patterns {
            let re = Regex::new(p)?;
            let idx: Vec<(usize, String)> = re
                .capture_names()
                .enumerate()
                .filter_map(|(j, name)| name.map(|s| (j, s.to_string())))
                .collect();
            if !idx.is_empty() {
                regexps.push(re);
                names.push(idx);
            }
        }
        Ok(NamedPatterns { regexps, names })
    }

    /// Finds the first pattern matching at the cursor.
    pub fn find(&self, src: &[u8], buf: &[u8], i: usize, n: usize) -> Option<NamedMatch> {
        for (re, names) in self.regexps.iter().zip(&self.names) {
            if let Some(caps) = re.captures(&buf[i..n]) {
                let m0 = caps.get(0).map(|m| m.len()).unwrap_or_default();
                let mut pairs = Vec::new();
                for (j, name) in names {
                    if let Some(m) = caps.get(*j) {
                        if !m.is_empty() {
                            pairs.push((name.clone(), m.as_bytes().to_vec()));
                        }
                    }
                }
                if !pairs.is_empty() {
                    return Some(NamedMatch {
                        orig: src[i..i + m0].to_vec(),
                        pairs,
                    });
                }
            }
        }
        None
    }

    /// Like [`find`](Self::find), but validated matches only: `accept`
    /// rejects a candidate and the search continues with the next pattern.
    pub fn find_where<F>(&self, src: &[u8], buf: &[u8], i: usize, n: usize, accept: F) -> Option<NamedMatch>
    where
        F: Fn(&NamedMatch) -> bool,
    {
        for (re, names) in self.regexps.iter().zip(&self.names) {
            if let Some(caps) = re.captures(&buf[i..n]) {
                let m0 = caps.get(0).map(|m| m.len()).unwrap_or_default();
                let mut pairs = Vec::new();
                for (j, name) in names {
                    if let Some(m) = caps.get(*j) {
                        if !m.is_empty() {
                            pairs.push((name.clone(), m.as_bytes().to_vec()));
                        }
                    }
                }
                if pairs.is_empty() {
                    continue;
                }
                let m = NamedMatch {
                    orig: src[i..i + m0].to_vec(),
                    pairs,
                };
                if accept(&m) {
                    return Some(m);
                }
            }
        }
        None
    }
}

fn pair<'a>(m: &'a NamedMatch, name: &str) -> Option<&'a [u8]> {
    m.pairs
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_slice())
}

// -------------------------------------------------------------------- series

/// Lexes season/episode markers in their many shapes, plus the ride-along
/// version and disc captures.
pub(crate) struct SeriesLexer {
    caps: NamedPatterns,
    many: Regex,
    disc_typ: Regex,
    sourcef: Finder,
}

impl SeriesLexer {
    pub fn new(infos: &TaginfoMap) -> Result<Self> {
        Ok(SeriesLexer {
            caps: NamedPatterns::new(&[
                // s02, S01E01
                r"(?i)^s(?P<s>[0-8]?\d)[\-\._ ]?(?:e(?P<e>\d{1,3}))?\b",
                // S01S02S03
                r"(?i)^(?P<S>(?:s[0-8]?\d){2,4})\b",
                // 2x1, 1x01
                r"(?i)^(?P<s>[0-8]?\d)x(?P<e>\d{1,3})\b",
                // S01 - 02v3, S07-06, s03-5v.9
                r"(?i)^s(?P<s>[0-8]?\d)[\-\._ ]{1,3}(?P<e>\d{1,3})(?:[\-\._ ]{1,3}(?P<v>v\d+(?:\.\d+){0,2}))?\b",
                // Season.01.Episode.02, Series.01.Ep.02, Series.01, Season.01
                r"(?i)^(?:series|season|s)[\-\._ ]?(?P<s>[0-8]?\d)(?:[\-\._ ]?(?:episode|ep)(?P<e>\d{1,3}))?\b",
                // Vol.1.No.2, vol1no2
                r"(?i)^vol(?:ume)?[\-\._ ]?(?P<s>\d{1,3})(?:[\-\._ ]?(?:number|no)[\-\._ ]?(?P<e>\d{1,3}))\b",
                // Episode 15, E009, Ep. 007, Ep.05-07
                r"(?i)^e(?:p(?:isode)?[\-\._ ]{1,3})?(?P<e>\d{1,3})(?:[\-\._ ]{1,3}\d{1,3})?\b",
                // 10v1.7, 13v2
                r"(?i)^(?P<e>\d{1,3})(?P<v>v[\-\._ ]?\d+(?:\.\d){0,2})\b",
                // S01.Disc02, s01D3, Series.01.Disc.02, S02DVD3
                r"(?i)^(?:series|season|s)[\-\._ ]?(?P<s>[0-8]?\d)[\-\._ ]?(?P<d>(?:disc|disk|dvd|d)[\-\._ ]?\d{1,3})\b",
            ])?,
            many: Regex::new(r"(?i)s(\d?\d)")?,
            disc_typ: Regex::new(r"(?i)^(?:disc|disk|dvd|d)")?,
            sourcef: finder(infos, "source"),
        })
    }
}

impl Lex for SeriesLexer {
    fn lex(
        &self,
        src: &[u8],
        buf: &[u8],
        start: &mut Vec<Tag>,
        _end: &mut Vec<Tag>,
        i: &mut usize,
        n: &mut usize,
    ) -> bool {
        let Some(m) = self.caps.find(src, buf, *i, *n) else {
            return false;
        };
        let series = pair(&m, "s");
        let episode = pair(&m, "e");
        let version = pair(&m, "v");
        let disc = pair(&m, "d");
        let many = pair(&m, "S");
        let vlen = version.map(<[u8]>::len).unwrap_or(0);
        let dlen = disc.map(<[u8]>::len).unwrap_or(0);
        let cut = m.orig.len() - vlen - dlen;
        let mut tags = Vec::new();
        if series.is_some() || episode.is_some() {
            tags.push(Tag::new(
                TagType::Series,
                None,
                vec![
                    m.orig[..cut].to_vec(),
                    series.unwrap_or_default().to_vec(),
                    episode.unwrap_or_default().to_vec(),
                ],
            ));
        }
        if let Some(version) = version {
            let orig = &m.orig[cut..cut + vlen];
            tags.push(Tag::new(TagType::Version, None, vec2(orig, version)));
        }
        if let Some(disc) = disc {
            let orig = &m.orig[m.orig.len() - dlen..];
            let typ_len = self
                .disc_typ
                .find(disc)
                .map(|m| m.len())
                .unwrap_or_default();
            let disctyp = disc[..typ_len].to_ascii_uppercase();
            let num: Vec<u8> = disc[typ_len..]
                .iter()
                .copied()
                .filter(u8::is_ascii_digit)
                .collect();
            if disctyp == b"DVD" {
                tags.push(Tag::new(
                    TagType::Source,
                    Some(self.sourcef.clone()),
                    vec2(&orig[..typ_len], &disctyp),
                ));
                tags.push(Tag::new(
                    TagType::Disc,
                    None,
                    vec![orig[typ_len..].to_vec(), disctyp, num],
                ));
            } else {
                tags.push(Tag::new(
                    TagType::Disc,
                    None,
                    vec![orig.to_vec(), disctyp, num],
                ));
            }
        }
        if let Some(many) = many {
            for caps in self.many.captures_iter(many) {
                let m0 = caps.get(0).map(|m| m.as_bytes()).unwrap_or_default();
                let m1 = caps.get(1).map(|m| m.as_bytes()).unwrap_or_default();
                tags.push(Tag::new(
                    TagType::Series,
                    None,
                    vec![m0.to_vec(), m1.to_vec(), Vec::new()],
                ));
            }
        }
        if tags.is_empty() {
            return false;
        }
        *i += m.orig.len();
        start.extend(tags);
        true
    }
}

// ------------------------------------------------------------------- version

/// Lexes version markers (`v2`, `v1.17`, `v20120803`).
pub(crate) struct VersionLexer {
    caps: NamedPatterns,
}

impl VersionLexer {
    pub fn new() -> Result<Self> {
        Ok(VersionLexer {
            caps: NamedPatterns::new(&[
                // v1.17, v1, v1.2a, v1b
                r"(?i)^(?P<v>v[\-\._ ]?\d{1,2}(?:[\._ ]\d{1,2}[a-z]?\d*){0,3})\b",
                // v2012, v20120803, v1999.08.08
                r"(?i)^(?P<v>v[\-\._ ]?(?:19|20)\d\d(?:[\-\._ ]?\d\d?){0,2})\b",
                // v60009
                r"(?i)^(?P<v>v[\-\._ ]?\d{4,10})\b",
            ])?,
        })
    }
}

impl Lex for VersionLexer {
    fn lex(
        &self,
        src: &[u8],
        buf: &[u8],
        start: &mut Vec<Tag>,
        _end: &mut Vec<Tag>,
        i: &mut usize,
        n: &mut usize,
    ) -> bool {
        let Some(m) = self.caps.find(src, buf, *i, *n) else {
            return false;
        };
        let version = m.orig.to_ascii_lowercase();
        start.push(Tag::new(
            TagType::Version,
            None,
            vec![m.orig.clone(), version],
        ));
        *i += m.orig.len();
        true
    }
}

// ---------------------------------------------------------- disc/source/year

/// Lexes combined disc+source+year runs such as `2DVD1999` or `WEB2007`.
pub(crate) struct DiscSourceYearLexer {
    caps: NamedPatterns,
    sourcef: Finder,
}

impl DiscSourceYearLexer {
    pub fn new(infos: &TaginfoMap) -> Result<Self> {
        Ok(DiscSourceYearLexer {
            caps: NamedPatterns::new(&[
                // VLS2004, 2DVD1999, 4CD2003
                r"(?i)^(?P<d>[2-9])?(?P<s>cd|ep|lp|dvd|vls|vinyl)(?P<y>(?:19|20)\d\d)\b",
                // WEB2007
                r"(?i)^(?P<s>web)(?P<y>20\d\d)\b",
            ])?,
            sourcef: finder(infos, "source"),
        })
    }
}

impl Lex for DiscSourceYearLexer {
    fn lex(
        &self,
        src: &[u8],
        buf: &[u8],
        start: &mut Vec<Tag>,
        _end: &mut Vec<Tag>,
        i: &mut usize,
        n: &mut usize,
    ) -> bool {
        let Some(m) = self.caps.find(src, buf, *i, *n) else {
            return false;
        };
        let disc = pair(&m, "d");
        let source = pair(&m, "s");
        let year = pair(&m, "y");
        let dlen = disc.map(<[u8]>::len).unwrap_or(0);
        let slen = source.map(<[u8]>::len).unwrap_or(0);
        if let Some(disc) = disc {
            start.push(Tag::new(
                TagType::Disc,
                None,
                vec![m.orig[..dlen].to_vec(), b"X".to_vec(), disc.to_vec()],
            ));
        }
        start.push(Tag::new(
            TagType::Source,
            Some(self.sourcef.clone()),
            vec2(&m.orig[dlen..dlen + slen], source.unwrap_or_default()),
        ));
        start.push(Tag::new(
            TagType::Date,
            None,
            vec![
                m.orig[dlen + slen..].to_vec(),
                year.unwrap_or_default().to_vec(),
                Vec::new(),
                Vec::new(),
            ],
        ));
        *i += m.orig.len();
        true
    }
}

// ---------------------------------------------------------------------- disc

/// Lexes disc markers (`D01`, `CD1`, `DVD2`, `12DiSCS`, `2xVinyl`, `6DVD`,
/// `CDS3`). Media-bearing shapes additionally emit a source tag.
pub(crate) struct DiscLexer {
    caps: NamedPatterns,
    typ: Regex,
    sourcef: Finder,
}

impl DiscLexer {
    pub fn new(infos: &TaginfoMap) -> Result<Self> {
        Ok(DiscLexer {
            caps: NamedPatterns::new(&[
                // D01, Disc.1
                r"(?i)^(?P<t>d)(?:is[ck][\-\._ ])?(?P<c>\d{1,3})\b",
                // 12DiSCS
                r"(?i)^(?P<c>\d{1,3})[\-\._ ]?di(?P<t>s)[ck]s?\b",
                // CD1, CD30
                r"(?i)^(?P<t>cd)[\-\._ ]?(?P<c>\d{1,2})\b",
                // DVD2, DVD24 -- does not match DVD5/DVD9
                r"(?i)^(?P<t>dvd)[\-\._ ]?(?P<c>[1-46-8]|[12]\d)\b",
                // 2xVinyl, 3xDVD, 4xCD
                r"(?i)^(?P<c>\d{1,2})(?P<t>x(?:cd|ep|lp|dvd|vls|vinyl))\b",
                // 2Vinyl, 6DVD
                r"(?i)^(?P<c>\d{1,2})(?P<x>(?:cd|ep|lp|dvd|vls|vinyl))\b",
                // CDS3
                r"(?i)^(?:(?P<x>cd)s)(?P<c>\d{1,2})\b",
            ])?,
            typ: Regex::new(r"(?i)dvd|cd|d|s|x")?,
            sourcef: finder(infos, "source"),
        })
    }
}

impl Lex for DiscLexer {
    fn lex(
        &self,
        src: &[u8],
        buf: &[u8],
        start: &mut Vec<Tag>,
        _end: &mut Vec<Tag>,
        i: &mut usize,
        n: &mut usize,
    ) -> bool {
        let Some(m) = self.caps.find(src, buf, *i, *n) else {
            return false;
        };
        let c = pair(&m, "c").unwrap_or_default().to_vec();
        let t = pair(&m, "t").map(<[u8]>::to_ascii_uppercase);
        let x = pair(&m, "x").map(<[u8]>::to_ascii_uppercase);
        let s = &m.orig;
        let typ = match &t {
            Some(t) => {
                let l = self.typ.find(s).map(|m| m.len()).unwrap_or(t.len());
                t[..l.min(t.len())].to_vec()
            }
            None => Vec::new(),
        };
        match typ.as_slice() {
            b"D" | b"S" => {
                start.push(Tag::new(
                    TagType::Disc,
                    None,
                    vec![s.clone(), typ, c],
                ));
            }
            b"DVD" | b"CD" => {
                start.push(Tag::new(
                    TagType::Source,
                    Some(self.sourcef.clone()),
                    vec![s[..typ.len()].to_vec(), typ.clone(), typ.clone()],
                ));
                start.push(Tag::new(
                    TagType::Disc,
                    None,
                    vec![s[typ.len()..].to_vec(), typ, c],
                ));
            }
            b"X" => {
                start.push(Tag::new(
                    TagType::Disc,
                    None,
                    vec![s[..c.len() + 1].to_vec(), typ, c.clone()],
                ));
                start.push(Tag::new(
                    TagType::Source,
                    Some(self.sourcef.clone()),
                    vec2(&s[c.len() + 1..], &s[c.len() + 1..]),
                ));
            }
            _ => {
                start.push(Tag::new(
                    TagType::Disc,
                    None,
                    vec![s[..c.len() + 1].to_vec(), b"X".to_vec(), c.clone()],
                ));
                start.push(Tag::new(
                    TagType::Source,
                    Some(self.sourcef.clone()),
                    vec![s[c.len() + 1..].to_vec(), x.unwrap_or_default()],
                ));
            }
        }
        *i += m.orig.len();
        true
    }
}

// ---------------------------------------------------------------------- date

const MONTHS_SHORT: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];
const MONTHS_FULL: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Resolves an English month name, short or full.
pub(crate) fn month_from_name(s: &str) -> Option<u8> {
    let s = s.to_lowercase();
    MONTHS_FULL
        .iter()
        .position(|&m| m == s)
        .or_else(|| MONTHS_SHORT.iter().position(|&m| m == s))
        .map(|i| (i + 1) as u8)
}

/// Resolves a full English month name only.
pub(crate) fn full_month_from_name(s: &str) -> Option<u8> {
    let s = s.to_lowercase();
    MONTHS_FULL
        .iter()
        .position(|&m| m == s)
        .map(|i| (i + 1) as u8)
}

/// Lexes the nine supported date shapes. Captures that do not form a real
/// calendar date fall through to the next shape.
pub(crate) struct DateLexer {
    caps: NamedPatterns,
}

impl DateLexer {
    pub fn new() -> Result<Self> {
        Ok(DateLexer {
            caps: NamedPatterns::new(&[
                // 2006-01-02
                r"(?i)^(?P<y>(?:19|20)\d{2})[\-\._ ](?P<m>\d{2})[\-\._ ](?P<d>\d{2})\b",
                // 2006-01
                r"(?i)^(?P<y>(?:19|20)\d{2})[\-\._ ](?P<m>\d{2})\b",
                // 2006
                r"(?i)^(?P<y>(?:19|20)\d{2})\b",
                // 02-13-2006
                r"(?i)^(?P<m>\d{2})[\-\._ ](?P<d>\d{2})[\-\._ ](?P<y>(?:19|20)\d{2})\b",
                // 13-02-2006
                r"(?i)^(?P<d>\d{2})[\-\._ ](?P<m>\d{2})[\-\._ ](?P<y>(?:19|20)\d{2})\b",
                // 2nd Jan 2006, 13 Dec 2011, Nov 1999
                r"(?i)^(?:(?P<d>\d{1,2})(?:th|st|nd|rd)?[\-\._ ])?(?P<nm>Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[\-\._ ](?P<y>(?:19|20)\d{2})\b",
                // 01-August-1998
                r"(?i)^(?P<d>\d{1,2})[\-\._ ](?P<nf>January|February|March|April|May|June|July|August|September|October|November|December)[\-\._ ](?P<y>(?:19|20)\d{2})\b",
                // MAY-30-1992
                r"(?i)^(?P<nm>Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[\-\._ ](?P<d>\d{1,2})[\-\._ ](?P<y>(?:19|20)\d{2})\b",
                // 17.12.15, 20-9-9
                r"(?i)^(?P<yy>[12]\d)[\-\._ ](?P<m>\d\d?)[\-\._ ](?P<d>\d\d?)\b",
            ])?,
        })
    }

    /// Validates captures as a calendar date, returning (year, month, day).
    fn fields(m: &NamedMatch) -> Option<(u16, u8, u8)> {
        let mut year: u16 = 0;
        let mut month: u8 = 0;
        let mut day: u8 = 0;
        for (name, v) in &m.pairs {
            let v = String::from_utf8_lossy(v);
            match name.as_str() {
                "y" => year = v.parse().ok()?,
                "yy" => year = 2000 + v.parse::<u16>().ok()?,
                "m" => month = v.parse().ok()?,
                "d" => day = v.parse().ok()?,
                "nm" | "nf" => month = month_from_name(&v)?,
                _ => return None,
            }
        }
        if year == 0 {
            return None;
        }
        if m.pairs.iter().any(|(k, _)| k == "m") && !(1..=12).contains(&month) {
            return None;
        }
        if m.pairs.iter().any(|(k, _)| k == "d") && !(1..=31).contains(&day) {
            return None;
        }
        Some((year, month, day))
    }
}

impl Lex for DateLexer {
    fn lex(
        &self,
        src: &[u8],
        buf: &[u8],
        start: &mut Vec<Tag>,
        _end: &mut Vec<Tag>,
        i: &mut usize,
        n: &mut usize,
    ) -> bool {
        let Some(m) = self
            .caps
            .find_where(src, buf, *i, *n, |m| Self::fields(m).is_some())
        else {
            return false;
        };
        let Some((year, month, day)) = Self::fields(&m) else {
            return false;
        };
        let month = if month != 0 {
            format!("{month:02}").into_bytes()
        } else {
            Vec::new()
        };
        let day = if day != 0 {
            format!("{day:02}").into_bytes()
        } else {
            Vec::new()
        };
        start.push(Tag::new(
            TagType::Date,
            None,
            vec![m.orig.clone(), year.to_string().into_bytes(), month, day],
        ));
        *i += m.orig.len();
        true
    }
}

// --------------------------------------------------------------------- audio

/// Lexes audio markers, merging an optional trailing channel layout into a
/// separate channels tag.
pub(crate) struct AudioLexer {
    re: Regex,
    audiof: Finder,
    channelsf: Finder,
}

impl AudioLexer {
    pub fn new(infos: &TaginfoMap) -> Result<Self> {
        let audio = category(infos, "audio");
        let channels = category(infos, "channels");
        let v: Vec<String> = channels
            .iter()
            .map(|info| info.tag().replace('.', r"[\._ ]?"))
            .collect();
        let channel_alt = if v.is_empty() {
            NEVER.to_string()
        } else {
            v.join("|")
        };
        Ok(AudioLexer {
            re: Regex::new(&format!(
                r"{}(?:[\-\._ ]?({channel_alt}))?(?:\b|[\-\._ ])",
                pattern::taginfo("^i", &audio)
            ))?,
            audiof: finder(infos, "audio"),
            channelsf: finder(infos, "channels"),
        })
    }
}

impl Lex for AudioLexer {
    fn lex(
        &self,
        src: &[u8],
        _buf: &[u8],
        start: &mut Vec<Tag>,
        _end: &mut Vec<Tag>,
        i: &mut usize,
        n: &mut usize,
    ) -> bool {
        let Some(caps) = self.re.captures(&src[*i..*n]) else {
            return false;
        };
        let m0 = caps.get(0).map(|m| m.as_bytes()).unwrap_or_default();
        let m1 = caps.get(1).map(|m| m.as_bytes()).unwrap_or_default();
        let m2 = caps.get(2).map(|m| m.as_bytes()).unwrap_or_default();
        let l = m0.len();
        let audio_orig = if !m2.is_empty() && m0.ends_with(m2) {
            &m0[..m0.len() - m2.len()]
        } else {
            m0
        };
        start.push(Tag::new(
            TagType::Audio,
            Some(self.audiof.clone()),
            vec2(audio_orig, m1),
        ));
        if !m2.is_empty() {
            start.push(Tag::new(
                TagType::Channels,
                Some(self.channelsf.clone()),
                vec2(m2, m2),
            ));
        }
        *i += l;
        true
    }
}

// --------------------------------------------------------------------- genre

/// Lexes a parenthesized genre (with an open-paren lookbehind) or a
/// back-of-name genre alias.
pub(crate) struct GenreLexer {
    re: Regex,
    lb: Regex,
    other: Regex,
    f: Finder,
}

impl GenreLexer {
    pub fn new(infos: &TaginfoMap) -> Result<Self> {
        let genre = category(infos, "genre");
        let v: Vec<String> = genre.iter().map(|info| info.pattern().into_owned()).collect();
        let aliases: Vec<&str> = genre
            .iter()
            .map(Taginfo::other)
            .filter(|s| !s.is_empty())
            .collect();
        let alt = if v.is_empty() { NEVER.to_string() } else { v.join("|") };
        let s = format!(r"\(?({alt})\s*\)");
        let other = if aliases.is_empty() {
            NEVER.to_string()
        } else {
            format!(r"(?i)^({})\b", aliases.join("|"))
        };
        Ok(GenreLexer {
            re: Regex::new(&format!("(?i)^{s}"))?,
            lb: Regex::new(&format!(r"(?i)\(\s*{s}$"))?,
            other: Regex::new(&other)?,
            f: finder(infos, "genre"),
        })
    }
}

impl Lex for GenreLexer {
    fn lex(
        &self,
        src: &[u8],
        buf: &[u8],
        start: &mut Vec<Tag>,
        _end: &mut Vec<Tag>,
        i: &mut usize,
        n: &mut usize,
    ) -> bool {
        if let Some(caps) = self.re.captures(&src[*i..*n]) {
            let m0 = caps.get(0).map(|m| m.as_bytes()).unwrap_or_default();
            let m1 = caps.get(1).map(|m| m.as_bytes()).unwrap_or_default();
            if self.lb.is_match(&src[..*i + m0.len()]) {
                start.push(Tag::new(TagType::Genre, Some(self.f.clone()), vec2(m0, m1)));
                *i += m0.len();
                return true;
            }
        }
        if let Some(caps) = self.other.captures(&buf[*i..*n]) {
            let m0 = caps.get(0).map(|m| m.len()).unwrap_or_default();
            let m1 = caps.get(1).map(|m| m.as_bytes()).unwrap_or_default();
            start.push(Tag::new(
                TagType::Genre,
                Some(self.f.clone()),
                vec2(&src[*i..*i + m0], m1),
            ));
            *i += m0;
            return true;
        }
        false
    }
}

// ------------------------------------------------------------------------ id

/// Lexes a parenthesized catalog identifier with alphanumeric balance
/// constraints and an open-paren lookbehind.
pub(crate) struct IdLexer {
    re: Regex,
    lb: Regex,
    alpha: Regex,
    digit: Regex,
    ws: Regex,
}

impl IdLexer {
    pub fn new() -> Result<Self> {
        Ok(IdLexer {
            re: Regex::new(r"^([A-Z\d\-\_\. ]{2,24})\)")?,
            lb: Regex::new(r"\([\._ ]{0,2}$")?,
            alpha: Regex::new(r"[A-Z]")?,
            digit: Regex::new(r"\d")?,
            ws: Regex::new(r"[\-\._ ]")?,
        })
    }
}

impl Lex for IdLexer {
    fn lex(
        &self,
        src: &[u8],
        buf: &[u8],
        start: &mut Vec<Tag>,
        _end: &mut Vec<Tag>,
        i: &mut usize,
        n: &mut usize,
    ) -> bool {
        if !self.lb.is_match(&src[..*i]) {
            return false;
        }
        let Some(caps) = self.re.captures(&buf[*i..*n]) else {
            return false;
        };
        let m0 = caps.get(0).map(|m| m.len()).unwrap_or_default();
        let m1 = caps.get(1).map(|m| m.as_bytes()).unwrap_or_default();
        let a = self.alpha.find_iter(m1).count();
        let d = self.digit.find_iter(m1).count();
        let w = self.ws.find_iter(m1).count();
        let ok = (a == 0 && d > 4 && w < 4) || (a > 1 && d > 1 && a + d > 4 && w < 4);
        if !ok {
            return false;
        }
        start.push(Tag::new(
            TagType::Id,
            None,
            vec2(&src[*i..*i + m0], m1),
        ));
        *i += m0;
        true
    }
}

// ------------------------------------------------------------------- episode

/// Lexes a bare episode number preceded by a `- ` style delimiter, emitted
/// as a series tag with only the episode value set.
pub(crate) struct EpisodeLexer {
    re: Regex,
    lb: Regex,
}

impl EpisodeLexer {
    pub fn new() -> Result<Self> {
        Ok(EpisodeLexer {
            re: Regex::new(r"^(\d{1,3})(\b|[\._ ]?[\-\[\]\(\)\{\}])")?,
            lb: Regex::new(r"-[\-\._ ]{1,3}$")?,
        })
    }
}

impl Lex for EpisodeLexer {
    fn lex(
        &self,
        src: &[u8],
        _buf: &[u8],
        start: &mut Vec<Tag>,
        _end: &mut Vec<Tag>,
        i: &mut usize,
        n: &mut usize,
    ) -> bool {
        if !self.lb.is_match(&src[..*i]) {
            return false;
        }
        let Some(caps) = self.re.captures(&src[*i..*n]) else {
            return false;
        };
        let m0 = caps.get(0).map(|m| m.len()).unwrap_or_default();
        let m1 = caps.get(1).map(|m| m.as_bytes()).unwrap_or_default();
        let m2 = caps.get(2).map(|m| m.as_bytes()).unwrap_or_default();
        start.push(Tag::new(
            TagType::Series,
            None,
            vec![m1.to_vec(), Vec::new(), m1.to_vec(), Vec::new()],
        ));
        if !m2.is_empty() {
            start.push(Tag::new(TagType::Delim, None, vec2(m2, m2)));
        }
        *i += m0;
        true
    }
}

// ----------------------------------------------------------- registry-driven

/// A registry-category lexer matching against the working buffer, so word
/// boundaries see through underscores.
pub(crate) struct RegexpLexer {
    typ: TagType,
    re: Regex,
    f: Finder,
}

impl RegexpLexer {
    pub fn new(typ: TagType, infos: &TaginfoMap) -> Result<Self> {
        let info = category(infos, typ.category());
        Ok(RegexpLexer {
            typ,
            re: Regex::new(&pattern::taginfo("^ib", &info))?,
            f: finder(infos, typ.category()),
        })
    }
}

impl Lex for RegexpLexer {
    fn lex(
        &self,
        src: &[u8],
        buf: &[u8],
        start: &mut Vec<Tag>,
        _end: &mut Vec<Tag>,
        i: &mut usize,
        n: &mut usize,
    ) -> bool {
        let Some(caps) = self.re.captures(&buf[*i..*n]) else {
            return false;
        };
        let m0 = caps.get(0).map(|m| m.len()).unwrap_or_default();
        let mut values = vec![src[*i..*i + m0].to_vec()];
        for j in 1..caps.len() {
            values.push(
                caps.get(j)
                    .map(|m| m.as_bytes().to_vec())
                    .unwrap_or_default(),
            );
        }
        start.push(Tag::new(self.typ, Some(self.f.clone()), values));
        *i += m0;
        true
    }
}

/// A registry-category lexer matching against the raw bytes, splitting a
/// captured trailing delimiter into its own tag. Used where the original
/// casing matters downstream (collections, codecs).
pub(crate) struct RegexpSourceLexer {
    typ: TagType,
    re: Regex,
    f: Finder,
}

impl RegexpSourceLexer {
    pub fn new(typ: TagType, infos: &TaginfoMap) -> Result<Self> {
        let info = category(infos, typ.category());
        Ok(RegexpSourceLexer {
            typ,
            re: Regex::new(&format!(
                r"{}(?:\b|[\-\._ ])",
                pattern::taginfo("^i", &info)
            ))?,
            f: finder(infos, typ.category()),
        })
    }
}

impl Lex for RegexpSourceLexer {
    fn lex(
        &self,
        src: &[u8],
        _buf: &[u8],
        start: &mut Vec<Tag>,
        _end: &mut Vec<Tag>,
        i: &mut usize,
        n: &mut usize,
    ) -> bool {
        let Some(caps) = self.re.captures(&src[*i..*n]) else {
            return false;
        };
        let m0 = caps.get(0).map(|m| m.len()).unwrap_or_default();
        let m1 = caps.get(1).map(|m| m.len()).unwrap_or_default();
        if m0 != m1 {
            let v = &src[*i..*i + m1];
            let delim = &src[*i + m1..*i + m0];
            start.push(Tag::new(self.typ, Some(self.f.clone()), vec2(v, v)));
            start.push(Tag::new(TagType::Delim, None, vec2(delim, delim)));
            *i += m0;
            return true;
        }
        let mut values = vec![src[*i..*i + m0].to_vec()];
        for j in 1..caps.len() {
            values.push(
                caps.get(j)
                    .map(|m| m.as_bytes().to_vec())
                    .unwrap_or_default(),
            );
        }
        start.push(Tag::new(self.typ, Some(self.f.clone()), values));
        *i += m0;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_names_resolve() {
        assert_eq!(month_from_name("Jan"), Some(1));
        assert_eq!(month_from_name("august"), Some(8));
        assert_eq!(month_from_name("DEC"), Some(12));
        assert_eq!(month_from_name("December"), Some(12));
        assert_eq!(month_from_name("smarch"), None);
    }

    #[test]
    fn named_patterns_collect_nonempty_captures() {
        let p = NamedPatterns::new(&[r"(?i)^s(?P<s>\d\d)(?:e(?P<e>\d\d))?\b"]).unwrap();
        let src = b"S03E02.rest";
        let m = p.find(src, src, 0, src.len()).unwrap();
        assert_eq!(m.orig, b"S03E02");
        assert_eq!(m.pairs.len(), 2);
        let m = p.find(b"S03.rest", b"S03.rest", 0, 8).unwrap();
        assert_eq!(m.orig, b"S03");
        assert_eq!(m.pairs.len(), 1);
    }
}
