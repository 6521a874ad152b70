//! Release assembly.
//!
//! The builder consumes the frozen token sequence in stages: local tag
//! fixups driven by global cues, a single collection pass into the release
//! slots, type classification, exclusive-tag unsetting, title extraction
//! (see `titles.rs`) and the unused-text finalizer.

use std::collections::HashMap;

use regex::Regex;

use crate::error::Result;
use crate::parser::lexers::full_month_from_name;
use crate::taginfo::{Finder, TaginfoMap};
use crate::types::{Release, Tag, TagType, Type};

/// Builds a [`Release`] from a parsed tag sequence.
pub struct TagBuilder {
    /// Acronyms missing their periods (`U S A`).
    pub(crate) missing: Regex,
    /// Lone letters that picked up a stray period.
    pub(crate) bad: Regex,
    /// Strips the stray period found by `bad`.
    pub(crate) fix: Regex,
    /// Runs of spaces.
    pub(crate) spaces: Regex,
    /// Three or more periods.
    pub(crate) ellips: Regex,
    /// Plus signs.
    pub(crate) plus: Regex,
    /// 8-hex-digit checksum.
    pub(crate) sum: Regex,
    /// All digits.
    pub(crate) digits: Regex,
    /// Digit prefix.
    pub(crate) digpre: Regex,
    /// Digit suffix.
    pub(crate) digsuf: Regex,
    /// Freestanding `aka` inside an extracted title.
    pub(crate) aka: Regex,
    pub(crate) containerf: Finder,
}

impl TagBuilder {
    /// Creates a builder bound to the given registry.
    pub fn new(infos: &TaginfoMap) -> Result<Self> {
        Ok(TagBuilder {
            missing: Regex::new(r"\b[A-Z][\. ][A-Z](?:[\. ][A-Z])*[\. ]?\b")?,
            bad: Regex::new(r"[^A-Z][-\. ][A-Z]\.($|[^A-Z])")?,
            fix: Regex::new(r"([A-Z])\.")?,
            spaces: Regex::new(r"\s+")?,
            ellips: Regex::new(r"\.{3,}")?,
            plus: Regex::new(r"\+")?,
            sum: Regex::new(r"(?i)^[a-f0-9]{8}$")?,
            digits: Regex::new(r"^\d+$")?,
            digpre: Regex::new(r"^\d+")?,
            digsuf: Regex::new(r"\d+$")?,
            aka: Regex::new(r"(?i) aka ")?,
            containerf: Finder::new(infos.get("container").cloned().unwrap_or_default()),
        })
    }

    /// Builds a release from tags; `end` is the cutoff between front and
    /// back tags.
    pub fn build(&self, tags: Vec<Tag>, end: usize) -> Release {
        let mut r = Release {
            tags,
            end,
            ..Release::default()
        };
        self.init(&mut r);
        self.collect(&mut r);
        r.typ = self.inspect(&r);
        self.special_date(&mut r);
        self.unset(&mut r);
        let i = self.titles(&mut r);
        self.finish_unused(&mut r, i);
        r
    }

    /// Fixes the initial tag set.
    fn init(&self, r: &mut Release) {
        let (m, pivot) = self.pivots(
            r,
            &[
                TagType::Date,
                TagType::Source,
                TagType::Series,
                TagType::Resolution,
                TagType::Version,
            ],
        );
        let date = m.get(&TagType::Date).copied().flatten();
        let series = m.get(&TagType::Series).copied().flatten();
        // collect the surviving date, demote any earlier ones
        if let Some(date) = date {
            r.dates.push(date);
            let extra = self.reset(r, date, &[TagType::Date]);
            r.dates.extend(extra);
        }
        // false-positive collection/source/cut/other matches inside titles
        if date.is_some() || series.is_some() {
            let i = match (date, series) {
                (Some(d), Some(s)) => d.min(s),
                (Some(d), None) => d,
                (None, Some(s)) => s,
                (None, None) => unreachable!(),
            };
            self.fix_special(r, i);
        }
        let end = self.text_before(r, pivot);
        self.reset(
            r,
            end,
            &[
                TagType::Language,
                TagType::Other,
                TagType::Arch,
                TagType::Platform,
            ],
        );
        self.fix_first(r);
        let start = self.text_after(r, 0);
        self.fix_bad(r, start, end);
        self.fix_no_text(r, end);
        self.fix_isolated(r);
        self.fix_music(r);
    }

    /// Finds the last position of each given type and the earliest among
    /// them; when none is present the earliest defaults to the cutoff.
    fn pivots(
        &self,
        r: &Release,
        types: &[TagType],
    ) -> (HashMap<TagType, Option<usize>>, usize) {
        let mut m: HashMap<TagType, Option<usize>> =
            types.iter().map(|&t| (t, None)).collect();
        let mut j = None;
        for i in (0..r.end).rev() {
            let typ = r.tags[i].tag_type();
            if typ.is(types) && m.get(&typ) == Some(&None) {
                m.insert(typ, Some(i));
                j = Some(i);
            }
        }
        (m, j.unwrap_or(r.end))
    }

    /// Demotes tags of the given types before `upto`, returning their
    /// indexes in descending order.
    fn reset(&self, r: &mut Release, upto: usize, types: &[TagType]) -> Vec<usize> {
        let mut v = Vec::new();
        for i in (0..upto).rev() {
            if r.tags[i].is(types) {
                r.tags[i] = r.tags[i].as_type(TagType::Text, None);
                v.push(i);
            }
        }
        v
    }

    /// First text tag at or after `i`, bounded by the cutoff.
    pub(crate) fn text_after(&self, r: &Release, mut i: usize) -> usize {
        while i < r.end && !r.tags[i].is(&[TagType::Text]) {
            i += 1;
        }
        i
    }

    /// Position one past the last text tag before `i`.
    fn text_before(&self, r: &Release, mut i: usize) -> usize {
        while i > 0 && !r.tags[i - 1].is(&[TagType::Text]) {
            i -= 1;
        }
        i
    }

    /// The title cannot start with a cut/edition/other/source/platform/arch
    /// marker; demote a first tag that matched as one.
    fn fix_first(&self, r: &mut Release) {
        let mut i = 0;
        while i < r.end && r.tags[i].is(&[TagType::Whitespace, TagType::Delim]) {
            i += 1;
        }
        if i != r.end
            && r.tags[i].is(&[
                TagType::Cut,
                TagType::Edition,
                TagType::Other,
                TagType::Source,
                TagType::Platform,
                TagType::Arch,
            ])
        {
            r.tags[i] = r.tags[i].as_type(TagType::Text, None);
        }
    }

    /// Demotes collection/language/other/arch/platform tags stranded in the
    /// title window.
    fn fix_bad(&self, r: &mut Release, start: usize, mut i: usize) {
        while i > start
            && r.tags[i - 1].is(&[
                TagType::Language,
                TagType::Edition,
                TagType::Cut,
                TagType::Other,
                TagType::Collection,
                TagType::Delim,
                TagType::Source,
            ])
        {
            i -= 1;
        }
        while i > start {
            let tag = &r.tags[i - 1];
            if tag.is(&[TagType::Collection]) && tag.collection() == "IMAX" {
                // imax reads fine inside a title
            } else if tag.is(&[
                TagType::Collection,
                TagType::Language,
                TagType::Other,
                TagType::Arch,
                TagType::Platform,
            ]) {
                r.tags[i - 1] = r.tags[i - 1].as_type(TagType::Text, None);
            }
            i -= 1;
        }
    }

    /// Demotes notorious false-positive matches occurring before the first
    /// date/series marker ("amazon" the film vs AMZN, "Web" the word,
    /// "Uncut" inside a title, the MD other alias).
    fn fix_special(&self, r: &mut Release, upto: usize) {
        for i in (0..upto).rev() {
            let tag = &r.tags[i];
            let demote = match tag.tag_type() {
                TagType::Collection => {
                    let c = tag.collection();
                    (c == "AMZN" && tag.text().to_lowercase() == "amazon")
                        || c == "CC"
                        || c == "RED"
                }
                TagType::Source => tag.text() == "Web",
                TagType::Cut => tag.text() == "Uncut",
                TagType::Other => tag.other() == "MD",
                _ => false,
            };
            if demote {
                r.tags[i] = r.tags[i].as_type(TagType::Text, None);
            }
        }
    }

    /// A title window with no text but a collection tag means the
    /// collection match swallowed the title; demote it back.
    fn fix_no_text(&self, r: &mut Release, end: usize) {
        let n = (end + 1).min(r.tags.len());
        if r.tags[..n].iter().any(|t| t.is(&[TagType::Text])) {
            return;
        }
        for i in 0..n {
            if r.tags[i].is(&[TagType::Collection]) {
                r.tags[i] = r.tags[i].as_type(TagType::Text, None);
            }
        }
    }

    /// Demotes collection/language/other/arch/platform tags that sit with
    /// text on both sides.
    fn fix_isolated(&self, r: &mut Release) {
        for i in (1..r.end.saturating_sub(1)).rev() {
            if r.tags[i].is(&[
                TagType::Collection,
                TagType::Language,
                TagType::Other,
                TagType::Arch,
                TagType::Platform,
            ]) && isolated(&r.tags[..r.end], i, -1)
                && isolated(&r.tags[..r.end], i, 1)
            {
                r.tags[i] = r.tags[i].as_type(TagType::Text, None);
            }
        }
    }

    /// Music-specific quirks: a lone CBR audio tag is really the comic-book
    /// container, and a BOOTLEG marker only counts when wrapped in dashes
    /// or parens.
    fn fix_music(&self, r: &mut Release) {
        let mut count = 0;
        let mut cbr_pos = None;
        for i in 0..r.end {
            if r.tags[i].is(&[TagType::Audio]) {
                if r.tags[i].audio() == "CBR" {
                    cbr_pos = Some(i);
                }
                count += 1;
            }
            if i != 0 && r.tags[i].is(&[TagType::Other]) && r.tags[i].other() == "BOOTLEG" {
                let before = peek(&r.tags, i as isize - 1, &[TagType::Delim])
                    && r.tags[i - 1].delim().ends_with('-');
                let after = peek(&r.tags, i as isize + 1, &[TagType::Delim])
                    && r.tags[i + 1].delim().starts_with('-');
                let paren_before = peek(&r.tags, i as isize - 1, &[TagType::Delim])
                    && r.tags[i - 1].delim().ends_with('(');
                let paren_after = peek(&r.tags, i as isize + 1, &[TagType::Delim])
                    && r.tags[i + 1].delim().starts_with(')');
                if !((before && after) || (paren_before && paren_after)) {
                    r.tags[i] = r.tags[i].as_type(TagType::Text, None);
                }
            }
        }
        if count == 1 {
            if let Some(pos) = cbr_pos {
                r.tags[pos] =
                    r.tags[pos].as_type(TagType::Container, Some(self.containerf.clone()));
            }
        }
    }

    /// Collects the tags into the release slots.
    fn collect(&self, r: &mut Release) {
        for i in 0..r.tags.len() {
            let tag = r.tags[i].clone();
            match tag.tag_type() {
                TagType::Whitespace | TagType::Delim | TagType::Text => {}
                TagType::Platform => {
                    if r.platform.is_none() {
                        r.platform = Some(tag.platform());
                    }
                }
                TagType::Arch => {
                    if r.arch.is_none() {
                        r.arch = Some(tag.arch());
                    }
                }
                TagType::Source => {
                    // stomping allowed when a more precise source shows up
                    let s = tag.source();
                    let cur = r.source.as_deref();
                    if cur.is_none()
                        || cur == Some("CD")
                        || (cur == Some("DVD") && s != "CD")
                    {
                        r.source = Some(s);
                    }
                }
                TagType::Resolution => {
                    if r.resolution.is_none() {
                        r.resolution = Some(tag.resolution());
                    }
                }
                TagType::Collection => {
                    if r.collection.is_none() {
                        r.collection = Some(tag.collection());
                    }
                }
                TagType::Date => {
                    let (year, month, day) = tag.date();
                    r.year = (year != 0).then_some(year);
                    r.month = (month != 0).then_some(month);
                    r.day = (day != 0).then_some(day);
                }
                TagType::Series => {
                    let (series, episode) = tag.series();
                    if r.series.is_none() && series != 0 {
                        r.series = Some(series);
                    }
                    if r.episode.is_none() && episode != 0 {
                        r.episode = Some(episode);
                    }
                }
                TagType::Version => {
                    if r.version.is_none() {
                        r.version = Some(tag.version());
                    }
                }
                TagType::Disc => {
                    if r.disc.is_none() {
                        r.disc = Some(tag.disc());
                    }
                }
                TagType::Codec => r.codec.push(tag.codec()),
                TagType::Hdr => r.hdr.push(tag.hdr()),
                TagType::Audio => r.audio.push(tag.audio()),
                TagType::Channels => {
                    if r.channels.is_none() {
                        r.channels = Some(tag.channels());
                    }
                }
                TagType::Other => r.other.push(tag.other()),
                TagType::Cut => r.cut.push(tag.cut()),
                TagType::Edition => r.edition.push(tag.edition()),
                TagType::Language => r.language.push(tag.language()),
                TagType::Size => {
                    if r.size.is_none() {
                        r.size = Some(tag.size());
                    }
                }
                TagType::Region => {
                    if r.region.is_none() {
                        r.region = Some(tag.region());
                    }
                }
                TagType::Container => {
                    if r.container.is_none() {
                        r.container = Some(tag.container());
                    }
                }
                TagType::Genre => {
                    if r.genre.is_none() {
                        r.genre = Some(tag.genre());
                    }
                }
                TagType::Id => {
                    if r.id.is_none() {
                        r.id = Some(tag.id());
                    }
                }
                TagType::Group => r.group = Some(tag.group()),
                TagType::Meta => {
                    let (k, v) = tag.meta();
                    match k.as_str() {
                        "site" if r.site.is_none() => r.site = Some(v),
                        "sum" if r.sum.is_none() => r.sum = Some(v),
                        "pass" if r.pass.is_none() => r.pass = Some(v),
                        "req" => r.req = true,
                        _ => r.meta.push(format!("{k}:{v}")),
                    }
                }
                TagType::Ext => r.ext = Some(tag.ext()),
            }
        }
        // demoted dates can still fill missing fields, latest capture first
        for idx in r.dates.clone().into_iter().rev() {
            let (year, month, day) = r.tags[idx].date();
            if r.year.is_none() && year != 0 {
                r.year = Some(year);
            }
            if r.month.is_none() && month != 0 {
                r.month = Some(month);
            }
            if r.day.is_none() && day != 0 {
                r.day = Some(day);
            }
        }
    }

    /// Classifies the release from registry hints and collected slots.
    fn inspect(&self, r: &Release) -> Type {
        if r.typ != Type::Unknown {
            return r.typ;
        }
        let mut app = false;
        let mut series = false;
        let mut movie = false;
        for i in (0..r.tags.len()).rev() {
            let typ = r.tags[i].info_type();
            app = app || typ == Type::App;
            series = series || r.tags[i].is(&[TagType::Series]);
            movie = movie || typ == Type::Movie;
            match typ {
                Type::Book | Type::Game => {
                    for j in (0..i).rev() {
                        let t = r.tags[j].info_type();
                        if t.is(&[Type::Comic, Type::Education, Type::Magazine]) {
                            return t;
                        }
                    }
                    return typ;
                }
                Type::Series | Type::Episode => {
                    if r.episode.is_some()
                        || (r.series.is_none()
                            && r.episode.is_none()
                            && !r.other.iter().any(|o| o == "BOXSET"))
                    {
                        return Type::Episode;
                    }
                    return Type::Series;
                }
                Type::Education => {
                    if r.series.is_none() && r.episode.is_none() {
                        return Type::Education;
                    }
                }
                Type::Music => {
                    for j in (0..i).rev() {
                        if r.tags[j].info_type() == Type::Audiobook {
                            return Type::Audiobook;
                        }
                    }
                    return Type::Music;
                }
                Type::Audiobook | Type::Comic | Type::Magazine => return typ,
                _ => {}
            }
            // exclusive tags decide outright unless superseded
            if r.tags[i].info_excl()
                && r.version.is_none()
                && r.series.is_none()
                && r.episode.is_none()
                && r.day.is_none()
                && r.month.is_none()
            {
                return typ;
            }
        }
        // technical tags wedged between dashes read as music track listings
        let mut count = 0;
        for i in (2..r.tags.len()).rev() {
            if r.tags[i - 1].is(&[
                TagType::Date,
                TagType::Codec,
                TagType::Audio,
                TagType::Resolution,
                TagType::Source,
                TagType::Language,
            ]) && peek(&r.tags, i as isize - 2, &[TagType::Delim])
                && r.tags[i - 2].delim().ends_with('-')
                && peek(&r.tags, i as isize, &[TagType::Delim])
                && r.tags[i].delim().starts_with('-')
            {
                count += 1;
                if count > 1 {
                    return Type::Music;
                }
            }
        }
        if r.episode.is_some()
            || (r.year.is_some() && r.month.is_some() && r.day.is_some())
        {
            return Type::Episode;
        }
        if r.series.is_some() || series {
            return Type::Series;
        }
        if app || (r.version.is_some() && r.resolution.is_none()) {
            return Type::App;
        }
        if movie || r.resolution.is_some() {
            return Type::Movie;
        }
        if (r.source.is_none() || r.source.as_deref() == Some("WEB"))
            && r.resolution.is_none()
            && r.year.is_some()
        {
            return Type::Music;
        }
        Type::Unknown
    }

    /// Magazines often spell the month as a word right before the year;
    /// reinterpret that text as a date.
    fn special_date(&self, r: &mut Release) {
        if r.typ != Type::Magazine || r.year.is_none() || r.month.is_some() || r.day.is_some() {
            return;
        }
        let Some(&first) = r.dates.first() else {
            return;
        };
        let mut i = first.saturating_sub(1);
        while i > 0 && r.tags[i].is(&[TagType::Delim]) {
            i -= 1;
        }
        if !r.tags[i].is(&[TagType::Text]) {
            return;
        }
        let s = r.tags[i].text();
        let Some(month) = full_month_from_name(&s) else {
            return;
        };
        r.month = Some(month);
        let year = r.year.unwrap_or_default().to_string();
        r.tags[i] = Tag::new(
            TagType::Date,
            None,
            vec![
                r.tags[i].original_bytes().to_vec(),
                year.into_bytes(),
                month.to_string().into_bytes(),
                Vec::new(),
            ],
        );
        r.dates.push(i);
    }

    /// Unsets slots fed by tags whose registry entry is exclusive to a
    /// different type, demoting those tags to text. Source tags hinting
    /// movie/series/episode are dropped outside those worlds too.
    fn unset(&self, r: &mut Release) {
        let media = r.typ.is(&[
            Type::Movie,
            Type::Series,
            Type::Episode,
            Type::Music,
            Type::Game,
        ]);
        for i in 0..r.tags.len() {
            let ityp = r.tags[i].info_type();
            let unsettable = r.tags[i].is(&[
                TagType::Platform,
                TagType::Arch,
                TagType::Source,
                TagType::Resolution,
                TagType::Collection,
                TagType::Codec,
                TagType::Hdr,
                TagType::Audio,
                TagType::Channels,
                TagType::Other,
                TagType::Cut,
                TagType::Edition,
                TagType::Language,
                TagType::Size,
                TagType::Region,
                TagType::Container,
                TagType::Genre,
                TagType::Group,
                TagType::Ext,
            ]);
            if ityp != r.typ && unsettable && r.tags[i].info_excl() {
                let typ = r.tags[i].tag_type();
                let s = r.tags[i].normalize();
                let mut demote = true;
                match typ {
                    TagType::Platform
                        if r.platform.as_deref() == Some(&s)
                            && !r.other.iter().any(|o| o == "Strategy.Guide") =>
                    {
                        r.platform = None;
                    }
                    TagType::Arch if r.arch.as_deref() == Some(&s) => r.arch = None,
                    TagType::Source if r.source.as_deref() == Some(&s) => r.source = None,
                    TagType::Resolution if r.resolution.as_deref() == Some(&s) => {
                        r.resolution = None;
                    }
                    TagType::Collection if r.collection.as_deref() == Some(&s) => {
                        r.collection = None;
                    }
                    TagType::Codec if r.codec.iter().any(|v| v == &s) => {
                        r.codec.retain(|v| v != &s);
                    }
                    TagType::Hdr if r.hdr.iter().any(|v| v == &s) => {
                        r.hdr.retain(|v| v != &s);
                    }
                    TagType::Audio if r.audio.iter().any(|v| v == &s) => {
                        r.audio.retain(|v| v != &s);
                    }
                    TagType::Channels if r.channels.as_deref() == Some(&s) => {
                        r.channels = None;
                    }
                    TagType::Other if r.other.iter().any(|v| v == &s) => {
                        r.other.retain(|v| v != &s);
                    }
                    TagType::Cut if r.cut.iter().any(|v| v == &s) => {
                        r.cut.retain(|v| v != &s);
                    }
                    TagType::Edition if r.edition.iter().any(|v| v == &s) => {
                        r.edition.retain(|v| v != &s);
                    }
                    TagType::Language if r.language.iter().any(|v| v == &s) => {
                        r.language.retain(|v| v != &s);
                    }
                    TagType::Size if r.size.as_deref() == Some(&s) => r.size = None,
                    TagType::Region if r.region.as_deref() == Some(&s) => r.region = None,
                    TagType::Container if r.container.as_deref() == Some(&s) => {
                        r.container = None;
                    }
                    TagType::Genre if r.genre.as_deref() == Some(&s) => r.genre = None,
                    TagType::Group if r.group.as_deref() == Some(&s) => r.group = None,
                    TagType::Ext if r.ext.as_deref() == Some(&s) => r.ext = None,
                    _ => demote = false,
                }
                if demote {
                    r.tags[i] = r.tags[i].as_type(TagType::Text, None);
                }
            } else if !media
                && r.tags[i].is(&[TagType::Source])
                && ityp.is(&[Type::Movie, Type::Series, Type::Episode])
            {
                if r.source.as_deref() == Some(r.tags[i].normalize().as_str()) {
                    r.source = None;
                }
                r.tags[i] = r.tags[i].as_type(TagType::Text, None);
            }
        }
    }

    /// Records leftover text and promotes a trailing candidate to group or
    /// checksum.
    fn finish_unused(&self, r: &mut Release, mut i: usize) {
        while i < r.tags.len() {
            if r.tags[i].is(&[TagType::Text]) {
                r.unused.push(i);
            }
            i += 1;
        }
        if let Some(&last) = r.unused.last() {
            let s = r.tags[last].text();
            if r.sum.is_none()
                && self.sum.is_match(&s)
                && s.bytes().any(|b| b.is_ascii_digit())
            {
                r.sum = Some(s);
                r.unused.pop();
            } else if r.group.is_none() && !self.digits.is_match(&s) {
                r.group = Some(s);
                r.unused.pop();
            }
        }
    }
}

/// Whether index `i` exists and is of one of `types`.
pub(crate) fn peek(tags: &[Tag], i: isize, types: &[TagType]) -> bool {
    0 <= i && (i as usize) < tags.len() && tags[i as usize].is(types)
}

/// Whether the nearest non-whitespace/delimiter neighbor in the given
/// direction is text (the last tag never counts).
fn isolated(tags: &[Tag], i: usize, inc: isize) -> bool {
    let len = tags.len() as isize;
    let mut i = i as isize + inc;
    while 0 < i && i < len - 1 && tags[(i + inc) as usize].is(&[TagType::Whitespace, TagType::Delim])
    {
        i += inc;
    }
    i += inc;
    0 <= i && i < len - 1 && tags[i as usize].is(&[TagType::Text])
}

/// `Some(s)` unless `s` is empty.
pub(crate) fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}
