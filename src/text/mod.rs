//! # Line Breaking
//!
//! Greedy line breaking under two policies: whole words separated by a
//! single ASCII space, or single Unicode scalar values.
//!
//! The breaker is deliberately literal. Words come from splitting on `' '`
//! with empty tokens kept, so runs of spaces survive into the output, and
//! a token wider than the line is never split: it overflows its line. The
//! overflow predictor and the rasterizer both consume this iterator, so
//! any change here changes both in lockstep.

use crate::font::{FontSpec, GlyphMetrics};
use std::str::{CharIndices, Split};

/// How text is divided into breakable units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapMode {
    /// Break only at ASCII spaces.
    #[default]
    Word,
    /// Break between any two characters.
    Char,
}

impl WrapMode {
    pub fn from_char_wrap(char_wrap: bool) -> Self {
        if char_wrap {
            WrapMode::Char
        } else {
            WrapMode::Word
        }
    }
}

#[derive(Clone)]
enum Tokens<'a> {
    Words(Split<'a, char>),
    Chars(&'a str, CharIndices<'a>),
}

impl<'a> Iterator for Tokens<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        match self {
            Tokens::Words(split) => split.next(),
            Tokens::Chars(text, indices) => indices
                .next()
                .map(|(i, ch)| &text[i..i + ch.len_utf8()]),
        }
    }
}

/// Lazily broken lines of a text.
///
/// Always yields at least one line: the trailing accumulator is flushed
/// even when empty. Cloning the iterator restarts nothing; call
/// [`break_lines`] again (or clone before consuming) to iterate afresh.
pub struct Lines<'a, M: GlyphMetrics + ?Sized> {
    tokens: Tokens<'a>,
    mode: WrapMode,
    line: String,
    max_width: f64,
    font: &'a FontSpec,
    metrics: &'a M,
    done: bool,
}

impl<M: GlyphMetrics + ?Sized> Clone for Lines<'_, M> {
    fn clone(&self) -> Self {
        Self {
            tokens: self.tokens.clone(),
            mode: self.mode,
            line: self.line.clone(),
            max_width: self.max_width,
            font: self.font,
            metrics: self.metrics,
            done: self.done,
        }
    }
}

impl<M: GlyphMetrics + ?Sized> Lines<'_, M> {
    /// Missing metrics count as fitting, so unmeasurable text never breaks.
    fn overflows(&self, candidate: &str) -> bool {
        match self.metrics.measure(candidate, self.font) {
            Some(width) => width > self.max_width,
            None => false,
        }
    }
}

impl<M: GlyphMetrics + ?Sized> Iterator for Lines<'_, M> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.done {
            return None;
        }

        while let Some(token) = self.tokens.next() {
            let candidate = match self.mode {
                WrapMode::Word if self.line.is_empty() => token.to_string(),
                WrapMode::Word => format!("{} {}", self.line, token),
                WrapMode::Char => format!("{}{}", self.line, token),
            };

            if !self.line.is_empty() && self.overflows(&candidate) {
                let finished = std::mem::replace(&mut self.line, token.to_string());
                return Some(finished);
            }
            self.line = candidate;
        }

        self.done = true;
        Some(std::mem::take(&mut self.line))
    }
}

/// Break `text` into lines no wider than `max_width` pixels where possible.
pub fn break_lines<'a, M: GlyphMetrics + ?Sized>(
    text: &'a str,
    max_width: f64,
    font: &'a FontSpec,
    metrics: &'a M,
    mode: WrapMode,
) -> Lines<'a, M> {
    let tokens = match mode {
        WrapMode::Word => Tokens::Words(text.split(' ')),
        WrapMode::Char => Tokens::Chars(text, text.char_indices()),
    };
    Lines {
        tokens,
        mode,
        line: String::new(),
        max_width,
        font,
        metrics,
        done: false,
    }
}
