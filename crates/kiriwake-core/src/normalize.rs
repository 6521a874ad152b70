//! Text cleaning and normalization.
//!
//! Two transforms are exposed, both running the input through an
//! NFD → collapser → NFC chain:
//!
//! - [`clean`] keeps case and most punctuation, strips diacritics and
//!   apostrophes, and collapses whitespace. Useful for display.
//! - [`normalize`] additionally lowercases, maps separator punctuation to
//!   spaces and drops the rest. Useful for matching and comparing titles.
//!
//! The collapser is a streaming transducer over the decomposed rune
//! sequence with three tunable rune sets (space, remove, custom) and an
//! optional neighbor-aware rune rewrite for the custom set.

use once_cell::sync::Lazy;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Neighbor-aware rune rewrite: previous emitted rune, current rune, next
/// rune. `None` drops the rune.
pub type RuneTransform = fn(Option<char>, char, Option<char>) -> Option<char>;

/// Collapsing rune transducer between the NFD and NFC stages.
#[derive(Debug, Clone)]
pub struct Collapser {
    lower: bool,
    space: &'static str,
    remove: &'static str,
    custom: &'static str,
    transform: Option<RuneTransform>,
}

impl Collapser {
    /// Creates a collapser. Runes in `space` map to a single space, runes in
    /// `remove` are dropped, runes in `custom` go through `transform`.
    pub fn new(
        lower: bool,
        space: &'static str,
        remove: &'static str,
        custom: &'static str,
        transform: Option<RuneTransform>,
    ) -> Self {
        Collapser {
            lower,
            space,
            remove,
            custom,
            transform,
        }
    }

    /// Applies NFD, the collapse, then NFC.
    pub fn apply(&self, s: &str) -> String {
        let decomposed: Vec<char> = s.nfd().collect();
        let mut out = String::with_capacity(decomposed.len());
        for (i, &c) in decomposed.iter().enumerate() {
            // non-spacing marks (diacritics, variation selectors) vanish
            if is_combining_mark(c) {
                continue;
            }
            let mut c = c;
            if self.space.contains(c) {
                c = ' ';
            } else if self.custom.contains(c) {
                let prev = out.chars().next_back();
                let next = decomposed.get(i + 1).copied();
                match self.transform.and_then(|f| f(prev, c, next)) {
                    Some(mapped) => c = mapped,
                    None => continue,
                }
            } else if self.remove.contains(c) {
                continue;
            }
            if self.lower {
                for l in c.to_lowercase() {
                    push_collapsed(&mut out, l);
                }
            } else {
                push_collapsed(&mut out, c);
            }
        }
        while out.ends_with(' ') {
            out.pop();
        }
        out.nfc().collect()
    }
}

/// Appends `c`, collapsing adjacent spaces and trimming the leading edge.
fn push_collapsed(out: &mut String, c: char) {
    if c == ' ' && matches!(out.chars().next_back(), None | Some(' ')) {
        return;
    }
    out.push(c);
}

/// A dollar sign sandwiched between letters reads as an S.
fn dollar(prev: Option<char>, _: char, next: Option<char>) -> Option<char> {
    if prev.is_some_and(char::is_alphabetic) || next.is_some_and(char::is_alphabetic) {
        Some('s')
    } else {
        None
    }
}

static CLEANER: Lazy<Collapser> =
    Lazy::new(|| Collapser::new(false, "\t\r\n\u{c}", "'", "", None));

static NORMALIZER: Lazy<Collapser> = Lazy::new(|| {
    Collapser::new(
        true,
        "\t\r\n\u{c} ._",
        "`':;~!@#%^*=+()[]{}<>/?|\\\",",
        "$",
        Some(dollar),
    )
});

/// Cleans `s` to its decomposed, diacritic-free, whitespace-collapsed form,
/// preserving case.
pub fn clean(s: &str) -> String {
    CLEANER.apply(s)
}

/// Normalizes `s` to the lowercased clean form used for title matching and
/// comparison.
pub fn normalize(s: &str) -> String {
    NORMALIZER.apply(s)
}
