//! Title extraction.
//!
//! The strategy depends on the classified type: movies consume the leading
//! text run and look for a subtitle between the date and the resolution;
//! series extend that with an episode title after the season marker; music
//! splits artist from title on the last separator; books accumulate text
//! runs and split author, title and subtitle. The shared `title_text`
//! helper repairs acronyms, collapses separators and trims delimiters.

use crate::compare::{is_any_delim, is_break_delim, is_title_trim_delim};
use crate::normalize::normalize;
use crate::parser::builder::{TagBuilder, non_empty, peek};
use crate::types::{Release, Tag, TagType, Type};

impl TagBuilder {
    /// Extracts the titles for the release, returning the index where title
    /// consumption stopped.
    pub(crate) fn titles(&self, r: &mut Release) -> usize {
        match r.typ {
            Type::Movie => self.movie_titles(r),
            Type::Series | Type::Episode => self.episode_titles(r),
            Type::Music => self.music_titles(r),
            Type::Book | Type::Audiobook => self.book_titles(r),
            _ => self.default_title(r),
        }
    }

    fn movie_titles(&self, r: &mut Release) -> usize {
        let pos = self.movie_titles_inner(r);
        self.split_alt(r);
        pos
    }

    fn movie_titles_inner(&self, r: &mut Release) -> usize {
        let len = r.tags.len();
        let mut pos = 0;
        while pos < len && !r.tags[pos].is(&[TagType::Text]) {
            pos += 1;
        }
        let start = pos;
        let (title, offset) = self.title_text(&r.tags[start..], &[TagType::Text]);
        r.title = non_empty(title);
        // locate date and resolution
        pos = 0;
        while pos < len && !r.tags[pos].is(&[TagType::Date]) {
            pos += 1;
        }
        let date = pos;
        if date == len {
            return self.box_title(r, start, offset);
        }
        pos = 0;
        while pos < len && !r.tags[pos].is(&[TagType::Resolution]) {
            pos += 1;
        }
        let resolution = pos;
        if resolution == len {
            return self.box_title(r, start, offset);
        }
        // a subtitle is a contiguous text/cut/edition run strictly between
        // date and resolution
        let mut has_subtitle = (date as isize) + 1 < (resolution as isize) - 1;
        if !has_subtitle {
            return self.box_title(r, start, offset);
        }
        pos = date + 1;
        while pos < len && has_subtitle && pos < resolution {
            has_subtitle = r.tags[pos].is(&[
                TagType::Delim,
                TagType::Text,
                TagType::Cut,
                TagType::Edition,
            ]);
            pos += 1;
        }
        if has_subtitle {
            pos = date + 1;
            while pos < len
                && !r.tags[pos].is(&[TagType::Text, TagType::Cut, TagType::Edition])
            {
                pos += 1;
            }
            if pos < resolution - 1 {
                let (subtitle, _) = self.title_text(
                    &r.tags[pos..resolution - 1],
                    &[TagType::Text, TagType::Cut, TagType::Edition],
                );
                r.subtitle = non_empty(subtitle);
            }
        }
        // alternate subtitle delimiter
        if r.subtitle.is_none() {
            if let Some(title) = r.title.clone() {
                if let Some(i) = title.rfind('~') {
                    r.title = non_empty(
                        title[..i].trim_end_matches(is_title_trim_delim).to_string(),
                    );
                    r.subtitle = non_empty(
                        title[i + 1..]
                            .trim_start_matches(is_title_trim_delim)
                            .to_string(),
                    );
                }
            }
        }
        (start + offset).min(resolution)
    }

    /// Splits an `aka` rename off the extracted title into the alternate
    /// title slot.
    fn split_alt(&self, r: &mut Release) {
        if r.alt.is_some() {
            return;
        }
        let Some(title) = r.title.clone() else {
            return;
        };
        if let Some(m) = self.aka.find(&title) {
            let t = title[..m.start()].trim_end_matches(is_title_trim_delim);
            let a = title[m.end()..].trim_start_matches(is_title_trim_delim);
            if !t.is_empty() && !a.is_empty() {
                r.title = Some(t.to_string());
                r.alt = Some(a.to_string());
            }
        }
    }

    /// Box sets name their disc content after the main title ("... The
    /// Fellowship Extended ..."); carve the trailing `the`-led words into
    /// the subtitle.
    fn box_title(&self, r: &mut Release, start: usize, offset: usize) -> usize {
        let len = r.tags.len();
        let n = start + offset;
        if n >= len
            || n == 0
            || r.disc.is_none()
            || !r.tags[n].is(&[TagType::Cut, TagType::Edition])
        {
            return n;
        }
        let mut pos = n.saturating_sub(1);
        while pos > start + 1 && pos > n.saturating_sub(8) {
            if normalize(&r.tags[pos - 1].text()) == "the" {
                let (prefix, _) = self.title_text(&r.tags[pos - 1..n], &[TagType::Text]);
                let (suffix, offset) = self.title_text(
                    &r.tags[n..],
                    &[TagType::Text, TagType::Cut, TagType::Edition],
                );
                let title = r.title.take().unwrap_or_default();
                let stripped = title.strip_suffix(&prefix).unwrap_or(&title);
                r.title =
                    non_empty(stripped.trim_end_matches(is_title_trim_delim).to_string());
                r.subtitle = non_empty(format!(
                    "{prefix} {}",
                    suffix.trim_end_matches(is_break_delim)
                ));
                return n + offset;
            }
            pos -= 1;
        }
        n
    }

    fn episode_titles(&self, r: &mut Release) -> usize {
        let mut pos = self.movie_titles(r);
        let len = r.tags.len();
        let typ = if r.month.is_some() && r.day.is_some() {
            TagType::Date
        } else {
            TagType::Series
        };
        // seek the series/date marker, remembering skipped text
        while pos < len && !r.tags[pos].is(&[typ]) {
            if r.tags[pos].is(&[TagType::Text]) {
                r.unused.push(pos);
            }
            pos += 1;
        }
        if pos == len {
            return pos;
        }
        // the episode title follows the technical tags after the marker and
        // must come before any codec or audio tag
        pos += 1;
        while pos < len
            && r.tags[pos].is(&[
                TagType::Delim,
                TagType::Source,
                TagType::Resolution,
                TagType::Collection,
                TagType::Date,
                TagType::Series,
                TagType::Version,
                TagType::Disc,
                TagType::Other,
                TagType::Cut,
                TagType::Edition,
                TagType::Language,
                TagType::Container,
            ])
        {
            pos += 1;
        }
        if pos == len || !r.tags[pos].is(&[TagType::Text]) {
            return pos;
        }
        let (subtitle, offset) = self.title_text(&r.tags[pos..], &[TagType::Text]);
        r.subtitle = non_empty(subtitle);
        pos + offset
    }

    fn music_titles(&self, r: &mut Release) -> usize {
        let (mut title, mut i) = self.mix_title(r, 0);
        let mut artist = String::new();
        let mut subtitle = String::new();
        // split artist from title on the last separator
        for sep in [" - ", "--", "~", "-"] {
            if let Some(j) = title.rfind(sep) {
                artist = title[..j].trim_end_matches(is_title_trim_delim).to_string();
                title = title[j + sep.len()..]
                    .trim_start_matches(is_break_delim)
                    .to_string();
                break;
            }
        }
        let (ret, bailed) = 'done: {
            let (i2, mut skipped, ok) = self.check_date(r, i);
            i = i2;
            if ok {
                let s = r.tags[i].delim();
                // Artist - (Prefix) Title
                if artist.is_empty() && s.ends_with('(') {
                    let (t, z) = self.mix_title(r, i + 1);
                    let (sub, z) = self.mix_title(r, z + 1);
                    if !t.is_empty() && !sub.is_empty() {
                        artist = std::mem::take(&mut title);
                        title = format!("({t}) {sub}");
                        let (i3, sk, ok) = self.check_date(r, z);
                        if !ok {
                            break 'done (i3, true);
                        }
                        i = i3;
                        skipped = sk;
                    }
                }
                // (Artist) - Title
                if artist.is_empty() && (skipped || s.starts_with(')')) {
                    let (t, z) = self.mix_title(r, i + 1);
                    if !t.is_empty() {
                        artist = std::mem::replace(&mut title, t);
                        i = z;
                    }
                }
                // subtitle after '(', '__', '-' or '~'
                if subtitle.is_empty()
                    && (s.ends_with('(') || s == "__" || s.contains(['-', '~']))
                    && peek(&r.tags[..r.end], i as isize + 1, &[TagType::Text])
                {
                    let (sub, z) = self.mix_title(r, i + 1);
                    subtitle = sub;
                    i = z;
                }
            }
            (i, false)
        };
        if !bailed && subtitle.is_empty() && !artist.is_empty() {
            // the artist may still carry a title split
            for sep in [" - ", "--", "~"] {
                if let Some(j) = artist.rfind(sep) {
                    let t = artist[j + sep.len()..]
                        .trim_start_matches(is_break_delim)
                        .to_string();
                    artist = artist[..j].trim_end_matches(is_title_trim_delim).to_string();
                    subtitle = std::mem::replace(&mut title, t);
                    break;
                }
            }
        }
        r.artist = non_empty(artist);
        r.title = non_empty(title);
        r.subtitle = non_empty(subtitle);
        ret
    }

    /// Consumes a text/delimiter/other run as a music mix title. `REMiX`
    /// markers stay inline with their original spelling.
    fn mix_title(&self, r: &Release, i: usize) -> (String, usize) {
        let start = self.text_after(r, i).min(r.tags.len());
        let mut j = start;
        while j < r.end
            && r.tags[j].is(&[TagType::Delim, TagType::Text, TagType::Other])
        {
            if r.tags[j].is(&[TagType::Other]) && r.tags[j].other() != "REMiX" {
                break;
            }
            j += 1;
        }
        let (title, offset) =
            self.title_text(&r.tags[start..j], &[TagType::Text, TagType::Other]);
        (title, start + offset)
    }

    /// Checks whether `i` sits before a delimiter, skipping an interleaved
    /// date tag (`Artist (2003) - Title`).
    fn check_date(&self, r: &Release, mut i: usize) -> (usize, bool, bool) {
        if i >= r.end {
            return (i, false, false);
        }
        let mut skipped = false;
        if r.tags[i].is(&[TagType::Date]) {
            i += 1;
            skipped = true;
        }
        if i >= r.end || !r.tags[i].is(&[TagType::Delim]) {
            return (i, skipped, false);
        }
        (i, skipped, true)
    }

    fn book_titles(&self, r: &mut Release) -> usize {
        let len = r.tags.len();
        let mut title = String::new();
        let mut pos = 0;
        while pos < len {
            // seek to text-like content
            while pos < len
                && !r.tags[pos].is(&[
                    TagType::Text,
                    TagType::Platform,
                    TagType::Arch,
                    TagType::Other,
                    TagType::Region,
                ])
            {
                pos += 1;
            }
            if pos == len {
                break;
            }
            let is_other = r.tags[pos].is(&[TagType::Other]);
            let (s, offset) = if is_other && r.tags[pos].info_type() != Type::Book {
                (String::new(), 1)
            } else if is_other {
                let (s, o) = self.title_text(&r.tags[pos..], &[TagType::Other]);
                (s.trim_matches(is_any_delim).to_string(), o)
            } else {
                self.title_text(
                    &r.tags[pos..],
                    &[
                        TagType::Text,
                        TagType::Platform,
                        TagType::Arch,
                        TagType::Region,
                    ],
                )
            };
            if !title.is_empty() && !s.is_empty() {
                title.push(' ');
            }
            title.push_str(&s);
            pos += offset.max(1);
        }
        let mut artist = String::new();
        let mut subtitle = String::new();
        if let Some(i) = title.rfind(';') {
            subtitle = title[i + 1..]
                .trim_start_matches(is_title_trim_delim)
                .to_string();
            title = title[..i].trim_end_matches(is_title_trim_delim).to_string();
        }
        for sep in [" - ", "--", "~"] {
            if let Some(i) = title.find(sep) {
                artist = title[..i].trim_end_matches(is_title_trim_delim).to_string();
                title = title[i + sep.len()..]
                    .trim_start_matches(is_break_delim)
                    .to_string();
                break;
            }
        }
        if subtitle.is_empty() {
            for sep in [" - ", "--", "~"] {
                if let Some(i) = title.find(sep) {
                    subtitle = title[i + sep.len()..]
                        .trim_start_matches(is_title_trim_delim)
                        .to_string();
                    title = title[..i].trim_end_matches(is_break_delim).to_string();
                    break;
                }
            }
        }
        if artist.is_empty() {
            if let Some(i) = title.rfind('-') {
                let a = title[..i].trim_end_matches(is_title_trim_delim);
                let t = title[i + 1..].trim_start_matches(is_break_delim);
                if !self.digsuf.is_match(a) && !self.digpre.is_match(t) {
                    artist = a.to_string();
                    title = t.to_string();
                }
            }
        }
        r.artist = non_empty(artist);
        r.title = non_empty(title);
        r.subtitle = non_empty(subtitle);
        pos
    }

    fn default_title(&self, r: &mut Release) -> usize {
        let len = r.tags.len();
        let mut pos = 0;
        while pos < len && !r.tags[pos].is(&[TagType::Text]) {
            pos += 1;
        }
        let (title, offset) = self.title_text(&r.tags[pos..], &[TagType::Text]);
        r.title = non_empty(title);
        pos + offset
    }

    /// Collects text from tags of the given types, stopping at the first
    /// unfriendly delimiter or foreign tag, and cleans the result: dots
    /// become spaces, acronyms get their periods back, spaces and ellipses
    /// collapse, HTML entities unescape, repeated pluses become spaces.
    pub(crate) fn title_text(&self, tags: &[Tag], types: &[TagType]) -> (String, usize) {
        let mut v: Vec<String> = Vec::new();
        let mut i = 0;
        while i < tags.len() {
            if tags[i].is(types) {
                v.push(tags[i].text().replace('.', " "));
            } else if tags[i].is(&[TagType::Delim]) {
                let s = tags[i].delim();
                if !s.contains(['(', ')', '[', ']', '{', '}', '\\', '/']) && s != "__" {
                    v.push(self.delim_text(&s, tags, i));
                } else {
                    break;
                }
            } else {
                break;
            }
            i += 1;
        }
        let s = v.concat();
        let s = self.missing.replace_all(&s, |caps: &regex::Captures<'_>| {
            let a = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
            let t = a.trim().replace(' ', ".");
            format!("{}. ", t.trim_start_matches(['.', ' ']))
        });
        let s = s.replace(". .", ". ");
        let s = self.bad.replace_all(&s, |caps: &regex::Captures<'_>| {
            let a = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
            self.fix.replace_all(a, "$1").into_owned()
        });
        let s = self.spaces.replace_all(&s, " ");
        let s = self.ellips.replace_all(&s, "...");
        let mut s = unescape_entities(&s);
        if self.plus.find_iter(&s).count() > 1 {
            s = self.plus.replace_all(&s, " ").into_owned();
        }
        (s.trim_matches(is_title_trim_delim).to_string(), i)
    }

    /// Maps a delimiter run to its title form. A lone period survives only
    /// between single uppercase letters (an acronym in the making).
    fn delim_text(&self, delim: &str, tags: &[Tag], i: usize) -> String {
        match delim {
            "..." => return "...".to_string(),
            ".." | ". " => return ". ".to_string(),
            "" => return " ".to_string(),
            _ => {}
        }
        let mapped: String = delim
            .chars()
            .filter_map(|r| match r {
                '-' | '+' | ',' | '.' | '~' => Some(r),
                '\t' | '\n' | '\u{c}' | '\r' | ' ' | '_' => Some(' '),
                _ => None,
            })
            .collect();
        let s = self.spaces.replace_all(&mapped, " ").into_owned();
        if s != "." || i == tags.len() - 1 {
            return self
                .spaces
                .replace_all(&s.replace('.', " "), " ")
                .into_owned();
        }
        let mut ante = String::new();
        if i > 2 && tags[i - 2].is(&[TagType::Delim]) {
            ante = tags[i - 2].delim();
        }
        let prev = if i != 0 && tags[i - 1].is(&[TagType::Text]) {
            tags[i - 1].text()
        } else {
            String::new()
        };
        let next = if i < tags.len() - 1 && tags[i + 1].is(&[TagType::Text]) {
            tags[i + 1].text()
        } else {
            String::new()
        };
        if is_upper_letter(&prev) && is_upper_letter(&next) && !ante.contains(['-', '~']) {
            ".".to_string()
        } else {
            " ".to_string()
        }
    }
}

/// True for the empty string or a single uppercase letter.
fn is_upper_letter(s: &str) -> bool {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (None, _) => true,
        (Some(c), None) => c.is_uppercase(),
        _ => false,
    }
}

/// Unescapes the HTML entities that show up in release names: the common
/// named ones plus numeric references.
fn unescape_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let Some(end) = tail.find(';').filter(|&e| e <= 32) else {
            out.push('&');
            rest = &tail[1..];
            continue;
        };
        let entity = &tail[1..end];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "nbsp" => Some(' '),
            _ => entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
                .and_then(|h| u32::from_str_radix(h, 16).ok())
                .or_else(|| entity.strip_prefix('#').and_then(|d| d.parse().ok()))
                .and_then(char::from_u32),
        };
        match decoded {
            Some(c) => {
                out.push(c);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upper_letter() {
        assert!(is_upper_letter(""));
        assert!(is_upper_letter("S"));
        assert!(!is_upper_letter("s"));
        assert!(!is_upper_letter("SA"));
    }

    #[test]
    fn entities_unescape() {
        assert_eq!(unescape_entities("Tom &amp; Jerry"), "Tom & Jerry");
        assert_eq!(unescape_entities("a &#38; b"), "a & b");
        assert_eq!(unescape_entities("x &#x26; y"), "x & y");
        assert_eq!(unescape_entities("no entities"), "no entities");
        assert_eq!(unescape_entities("dangling &"), "dangling &");
    }
}
