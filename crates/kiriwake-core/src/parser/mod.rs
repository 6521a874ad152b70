//! The tag parser.
//!
//! [`TagParser`] drives the lexer cascade over the input: the once lexers
//! first (edge-anchored), then the multi lexers repeatedly at the cursor,
//! falling back to delimiter and text tokens. The result is a token
//! sequence whose original spans reproduce the input byte-for-byte, plus
//! the cutoff between front and back tokens.

pub mod builder;
pub mod lexers;
pub mod titles;

use std::collections::HashMap;

use regex::bytes::Regex;

use crate::compare::is_any_delim;
use crate::error::Result;
use crate::taginfo::{self, TaginfoMap, pattern};
use crate::types::{Release, Tag, TagType};

pub use builder::TagBuilder;

use lexers::{
    AudioLexer, DateLexer, DiscLexer, DiscSourceYearLexer, EpisodeLexer, ExtLexer, GenreLexer,
    GroupLexer, IdLexer, Lex, LexContext, MetaLexer, RegexpLexer, RegexpSourceLexer, SeriesLexer,
    TrimWhitespaceLexer, VersionLexer,
};

/// A release tag parser bound to a tag registry.
///
/// Construction compiles every lexer pattern and the registry patterns
/// once; the parser itself is immutable afterwards and safe to share
/// across threads.
pub struct TagParser {
    delim: Regex,
    work: Regex,
    once: Vec<Box<dyn Lex>>,
    multi: Vec<Box<dyn Lex>>,
    builder: TagBuilder,
}

impl TagParser {
    /// Creates a parser over the given registry.
    pub fn new(infos: TaginfoMap) -> Result<Self> {
        // single-byte delimiters, as an anchored run
        let delims: Vec<String> = (0u8..=255)
            .map(char::from)
            .filter(|&c| is_any_delim(c))
            .map(String::from)
            .collect();
        let delim = Regex::new(&format!("^((?:{})+)", pattern::join(true, &delims)))?;
        // short tag fragments, rejected as groups and bracket contents
        let mut short = HashMap::new();
        for infos in infos.values() {
            for info in infos {
                for field in info.tag().split(is_any_delim) {
                    if !field.is_empty() && field.len() < 5 && !field.contains('$') {
                        short.insert(field.to_uppercase(), true);
                    }
                }
            }
        }
        let ctx = LexContext {
            delim: delim.clone(),
            short,
        };
        let once: Vec<Box<dyn Lex>> = vec![
            Box::new(TrimWhitespaceLexer::new()?),
            Box::new(ExtLexer::new(&infos)?),
            Box::new(MetaLexer::new(&ctx)?),
            Box::new(GroupLexer::new(&infos, &ctx)?),
        ];
        let multi: Vec<Box<dyn Lex>> = vec![
            Box::new(RegexpLexer::new(TagType::Size, &infos)?),
            Box::new(RegexpLexer::new(TagType::Platform, &infos)?),
            Box::new(RegexpLexer::new(TagType::Arch, &infos)?),
            Box::new(RegexpLexer::new(TagType::Source, &infos)?),
            Box::new(RegexpLexer::new(TagType::Resolution, &infos)?),
            Box::new(RegexpSourceLexer::new(TagType::Collection, &infos)?),
            Box::new(SeriesLexer::new(&infos)?),
            Box::new(VersionLexer::new()?),
            Box::new(DiscSourceYearLexer::new(&infos)?),
            Box::new(DiscLexer::new(&infos)?),
            Box::new(DateLexer::new()?),
            Box::new(RegexpSourceLexer::new(TagType::Codec, &infos)?),
            Box::new(RegexpLexer::new(TagType::Hdr, &infos)?),
            Box::new(AudioLexer::new(&infos)?),
            Box::new(RegexpLexer::new(TagType::Channels, &infos)?),
            Box::new(RegexpLexer::new(TagType::Other, &infos)?),
            Box::new(RegexpLexer::new(TagType::Cut, &infos)?),
            Box::new(RegexpLexer::new(TagType::Edition, &infos)?),
            Box::new(RegexpLexer::new(TagType::Language, &infos)?),
            Box::new(RegexpLexer::new(TagType::Region, &infos)?),
            Box::new(RegexpLexer::new(TagType::Container, &infos)?),
            Box::new(GenreLexer::new(&infos)?),
            Box::new(IdLexer::new()?),
            Box::new(EpisodeLexer::new()?),
        ];
        let builder = TagBuilder::new(&infos)?;
        Ok(TagParser {
            delim,
            work: Regex::new(r"[_,\+]")?,
            once,
            multi,
            builder,
        })
    }

    /// Creates a parser over the embedded default registry.
    pub fn builtin() -> Result<Self> {
        Self::new(taginfo::all(&[])?)
    }

    /// Parses the input into tags and the front/back cutoff.
    pub fn parse(&self, src: &[u8]) -> (Vec<Tag>, usize) {
        let buf = self.work.replace_all(src, &b" "[..]).into_owned();
        let mut i = 0;
        let mut n = buf.len();
        let mut start = Vec::new();
        let mut end = Vec::new();
        for lexer in &self.once {
            lexer.lex(src, &buf, &mut start, &mut end, &mut i, &mut n);
        }
        while i < n {
            self.next(src, &buf, &mut start, &mut end, &mut i, &mut n);
        }
        let cutoff = start.len();
        start.extend(end.into_iter().rev());
        (start, cutoff)
    }

    /// Parses the input into a release.
    pub fn parse_release(&self, src: &[u8]) -> Release {
        let (tags, end) = self.parse(src);
        self.builder.build(tags, end)
    }

    /// The builder used to assemble releases.
    pub fn builder(&self) -> &TagBuilder {
        &self.builder
    }

    /// Reads the next token: a literal ellipsis, a delimiter run, the first
    /// matching multi lexer, or accumulated text up to the next delimiter.
    fn next(
        &self,
        src: &[u8],
        buf: &[u8],
        start: &mut Vec<Tag>,
        end: &mut Vec<Tag>,
        i: &mut usize,
        n: &mut usize,
    ) {
        if src[*i..*n].starts_with(b"...") {
            start.push(Tag::new(TagType::Delim, None, vec![b"...".to_vec(), b"...".to_vec()]));
            *i += 3;
            return;
        }
        if let Some(m) = self.delim.find(&src[*i..*n]) {
            start.push(Tag::new(
                TagType::Delim,
                None,
                vec![m.as_bytes().to_vec(), m.as_bytes().to_vec()],
            ));
            *i += m.len();
            return;
        }
        for lexer in &self.multi {
            if lexer.lex(src, buf, start, end, i, n) {
                return;
            }
        }
        let mut j = *i;
        while j < *n && !self.delim.is_match(&src[j..*n]) {
            j += 1;
        }
        start.push(Tag::new(
            TagType::Text,
            None,
            vec![src[*i..j].to_vec(), src[*i..j].to_vec()],
        ));
        *i = j;
    }
}
