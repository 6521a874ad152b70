//! Release ordering.
//!
//! Releases order by type class, then normalized artist and title (leading
//! articles skipped, numbers and roman numerals compared numerically,
//! `&`/`and` treated as equivalent), then date, season/episode, subtitle,
//! alternate title, resolution, version, group, case-sensitive title and
//! finally the original byte representation.

use std::cmp::Ordering;

use crate::normalize::normalize;
use crate::types::Release;

/// Any delimiter rune.
pub(crate) fn is_any_delim(r: char) -> bool {
    matches!(
        r,
        '\t' | '\n'
            | '\u{c}'
            | '\r'
            | ' '
            | '('
            | ')'
            | '+'
            | ','
            | '-'
            | '.'
            | '_'
            | '['
            | '/'
            | '\\'
            | ']'
            | '{'
            | '}'
            | '~'
    )
}

/// Any delimiter rune except `-`, used to split title words.
pub(crate) fn is_break_delim(r: char) -> bool {
    r != '-' && is_any_delim(r)
}

/// Any delimiter rune except `.` and `+`, used to trim titles.
pub(crate) fn is_title_trim_delim(r: char) -> bool {
    r != '.' && r != '+' && is_any_delim(r)
}

/// Compares two releases under the published ordering contract.
pub fn compare(a: &Release, b: &Release) -> Ordering {
    a.typ
        .class()
        .cmp(&b.typ.class())
        .then_with(|| compare_title(opt(&a.artist), opt(&b.artist)))
        .then_with(|| compare_title(opt(&a.title), opt(&b.title)))
        .then_with(|| a.year.unwrap_or(0).cmp(&b.year.unwrap_or(0)))
        .then_with(|| a.month.unwrap_or(0).cmp(&b.month.unwrap_or(0)))
        .then_with(|| a.day.unwrap_or(0).cmp(&b.day.unwrap_or(0)))
        .then_with(|| a.series.unwrap_or(0).cmp(&b.series.unwrap_or(0)))
        .then_with(|| a.episode.unwrap_or(0).cmp(&b.episode.unwrap_or(0)))
        .then_with(|| compare_title(opt(&a.subtitle), opt(&b.subtitle)))
        .then_with(|| compare_title(opt(&a.alt), opt(&b.alt)))
        .then_with(|| compare_int_string(opt(&a.resolution), opt(&b.resolution)))
        .then_with(|| opt(&a.version).cmp(opt(&b.version)))
        .then_with(|| opt(&a.group).cmp(opt(&b.group)))
        .then_with(|| opt(&a.title).cmp(opt(&b.title)))
        .then_with(|| a.original().cmp(&b.original()))
}

fn opt(s: &Option<String>) -> &str {
    s.as_deref().unwrap_or("")
}

/// Title comparison over normalized, word-split values.
pub fn compare_title(a: &str, b: &str) -> Ordering {
    match (a.is_empty(), b.is_empty()) {
        _ if a == b => return Ordering::Equal,
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        _ => {}
    }
    let (a, b) = (normalize(a), normalize(b));
    // a freestanding ampersand reads as "and"; other delimiter-only tokens
    // are dropped
    let word = |s: &&str| s.bytes().any(|b| b.is_ascii_alphanumeric());
    let av: Vec<&str> = a
        .split(is_break_delim)
        .map(|w| if w == "&" { "and" } else { w })
        .filter(word)
        .collect();
    let bv: Vec<&str> = b
        .split(is_break_delim)
        .map(|w| if w == "&" { "and" } else { w })
        .filter(word)
        .collect();
    let (start, min) = if !av.is_empty()
        && !bv.is_empty()
        && av[0] == bv[0]
        && ["a", "an", "the"].contains(&av[0])
    {
        (1, 1)
    } else {
        (0, 3)
    };
    for i in start..start + min {
        let cmp = match (av.get(i), bv.get(i)) {
            (None, None) => break,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(&aw), Some(&bw)) => compare_title_number(aw, bw, i),
        };
        if cmp != Ordering::Equal {
            return cmp;
        }
    }
    Ordering::Equal
}

/// Compares two title words numerically when both read as numbers or roman
/// numerals. A leading word that is a bare I, V or L is not trusted as a
/// numeral (it is almost always a word or an initial) and compares as
/// plain text against anything but a real number.
fn compare_title_number(a: &str, b: &str, i: usize) -> Ordering {
    let (ai, arom, aok) = conv_number(a);
    let (bi, brom, bok) = conv_number(b);
    let abad = i == 0 && arom && aok && (ai == 1 || ai == 5 || ai == 50);
    let bbad = i == 0 && brom && bok && (bi == 1 || bi == 5 || bi == 50);
    if !(abad && bbad) {
        if aok && bbad {
            return Ordering::Less;
        }
        if bok && abad {
            return Ordering::Greater;
        }
        if (aok && bok && ai < bi) || (aok && !bok && !abad) {
            return Ordering::Less;
        }
        if (aok && bok && bi < ai) || (bok && !aok && !bbad) {
            return Ordering::Greater;
        }
    }
    a.cmp(b)
}

/// Attempts to read `s` as an integer or a roman numeral below 100.
/// Returns (value, was-roman, ok).
fn conv_number(s: &str) -> (i64, bool, bool) {
    if let Ok(i) = s.parse::<i64>() {
        return (i, false, true);
    }
    if let Some(i) = parse_roman(s) {
        if i < 100 {
            return (i, true, true);
        }
    }
    (0, false, false)
}

/// Parses a lowercase roman numeral, rejecting ill-formed sequences such as
/// `lcmxiv`. The empty string parses as zero.
pub fn parse_roman(s: &str) -> Option<i64> {
    let b = s.as_bytes();
    let mut i = 0i64;
    for j in 0..b.len() {
        let r = roman(b[j]);
        if r == 0 {
            return None;
        }
        if j + 2 < b.len() && r < roman(b[j + 1]) && roman(b[j + 1]) < roman(b[j + 2]) {
            return None;
        }
        if j + 1 < b.len() && r < roman(b[j + 1]) {
            i -= r;
        } else {
            i += r;
        }
    }
    Some(i)
}

fn roman(c: u8) -> i64 {
    match c {
        b'i' => 1,
        b'v' => 5,
        b'x' => 10,
        b'l' => 50,
        b'c' => 100,
        b'd' => 500,
        b'm' => 1000,
        _ => 0,
    }
}

/// Compares two strings as embedded integers, non-numeric strings first.
/// Every trailing byte contributes positionally, so `720p` < `1080p`.
fn compare_int_string(a: &str, b: &str) -> Ordering {
    match (a.is_empty(), b.is_empty()) {
        _ if a == b => return Ordering::Equal,
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        _ => {}
    }
    let digits = |s: &str| s.bytes().any(|b| b.is_ascii_digit());
    if !digits(a) {
        return Ordering::Equal;
    }
    if !digits(b) {
        return Ordering::Greater;
    }
    let value = |s: &str| -> f64 {
        let b = s.as_bytes();
        let mut v = 0.0;
        for i in (0..b.len()).rev() {
            let f = b[i].wrapping_sub(b'0') as f64;
            v += f * 10f64.powi((b.len() - 1 - i) as i32);
        }
        v
    };
    value(a).partial_cmp(&value(b)).unwrap_or(Ordering::Equal)
}
