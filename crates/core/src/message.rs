//! Splits one tokenized message into its chained command units.
//!
//! A message holds one or more command units separated by `;`. Each unit is
//! a command header (colon-separated keywords, ended by the first run of
//! whitespace) followed by comma-separated arguments. A leading `:` marks
//! the unit as root-anchored; without it a chained unit resolves relative to
//! the previous unit's parent path.

use crate::lexer::{TokKind, Token};
use crate::limits::{MAX_DEPTH, MAX_PARAMS};
use arrayvec::ArrayVec;
use scpi_toolkit_diagnostics::Span;

/// One argument of a command unit: a trimmed view into the message.
#[derive(Debug, Clone, Copy)]
pub struct Argument<'a> {
    /// Argument text with surrounding whitespace removed. May be empty for
    /// an explicitly empty slot (`SET 1,,3`).
    pub text: &'a str,
    /// Byte span of the trimmed text within the message.
    pub span: Span,
}

/// One `;`-delimited command unit of a message.
#[derive(Debug, Clone)]
pub struct CommandUnit<'a> {
    /// Whether the unit started with a leading `:` (root-anchored).
    pub absolute: bool,
    /// The header keywords, one token per tree level.
    pub header: ArrayVec<Token<'a>, MAX_DEPTH>,
    /// Arguments following the header.
    pub args: ArrayVec<Argument<'a>, MAX_PARAMS>,
    /// Byte span of the whole unit.
    pub span: Span,
}

impl<'a> CommandUnit<'a> {
    /// Whether the last header keyword carries the `?` query suffix.
    pub fn is_query(&self) -> bool {
        self.header
            .last()
            .is_some_and(|t| t.text.ends_with('?'))
    }

    /// Header keyword texts with the query suffix stripped from the last one.
    pub fn keywords(&self) -> ArrayVec<&'a str, MAX_DEPTH> {
        let mut out = ArrayVec::new();
        let last = self.header.len().saturating_sub(1);
        for (i, tok) in self.header.iter().enumerate() {
            let text = if i == last {
                tok.text.strip_suffix('?').unwrap_or(tok.text)
            } else {
                tok.text
            };
            out.push(text);
        }
        out
    }
}

/// A unit exceeded the header depth or argument-count capacity.
///
/// Classified as `ErrorCode::BufferOverflow` by the dispatcher; the
/// remaining units of the message are still produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitOverflow;

/// Iterate over the command units of a tokenized message.
///
/// `message` must be the string the tokens were lexed from. Empty units
/// (`;;`, blank lines) are skipped silently.
pub fn units<'t, 'a>(message: &'a str, toks: &'t [Token<'a>]) -> Units<'t, 'a> {
    Units {
        message,
        toks,
        pos: 0,
    }
}

/// Iterator over [`CommandUnit`]s, produced by [`units`].
pub struct Units<'t, 'a> {
    message: &'a str,
    toks: &'t [Token<'a>],
    pos: usize,
}

impl<'t, 'a> Iterator for Units<'t, 'a> {
    type Item = Result<CommandUnit<'a>, UnitOverflow>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.pos < self.toks.len() {
            let start = self.pos;
            let mut end = start;
            while end < self.toks.len() && self.toks[end].kind != TokKind::Semicolon {
                end += 1;
            }
            // Past the semicolon for the next call.
            self.pos = if end < self.toks.len() { end + 1 } else { end };

            if let Some(unit) = build_unit(self.message, &self.toks[start..end]).transpose() {
                return Some(unit);
            }
        }
        None
    }
}

/// Assemble one unit from the tokens between two semicolons.
///
/// Returns `Ok(None)` for an empty segment.
fn build_unit<'a>(
    message: &'a str,
    toks: &[Token<'a>],
) -> Result<Option<CommandUnit<'a>>, UnitOverflow> {
    // Trim surrounding whitespace tokens.
    let mut lo = 0;
    let mut hi = toks.len();
    while lo < hi && toks[lo].kind == TokKind::Whitespace {
        lo += 1;
    }
    while hi > lo && toks[hi - 1].kind == TokKind::Whitespace {
        hi -= 1;
    }
    let toks = &toks[lo..hi];
    if toks.is_empty() {
        return Ok(None);
    }

    let span = Span::new(toks[0].span.start, toks[toks.len() - 1].span.end);
    let mut i = 0;
    let absolute = toks[0].kind == TokKind::Colon;
    if absolute {
        i += 1;
    }

    // Header: Value (Colon Value)* — ends at the first whitespace.
    let mut header: ArrayVec<Token<'a>, MAX_DEPTH> = ArrayVec::new();
    if i < toks.len() && toks[i].kind == TokKind::Value {
        header.try_push(toks[i]).map_err(|_| UnitOverflow)?;
        i += 1;
        while i + 1 < toks.len()
            && toks[i].kind == TokKind::Colon
            && toks[i + 1].kind == TokKind::Value
        {
            header.try_push(toks[i + 1]).map_err(|_| UnitOverflow)?;
            i += 2;
        }
    }

    // Arguments: comma-separated runs of the remaining tokens, each trimmed.
    let mut args: ArrayVec<Argument<'a>, MAX_PARAMS> = ArrayVec::new();
    if i < toks.len() {
        if toks[i].kind == TokKind::Whitespace {
            i += 1;
        }
        let rest = &toks[i..];
        let mut slot_start = 0;
        for idx in 0..=rest.len() {
            let at_comma = idx < rest.len() && rest[idx].kind == TokKind::Comma;
            if idx == rest.len() || at_comma {
                args.try_push(argument_from(message, &rest[slot_start..idx], span.end))
                    .map_err(|_| UnitOverflow)?;
                slot_start = idx + 1;
            }
        }
        // A bare header with trailing whitespace produces one empty slot;
        // treat that as "no arguments".
        if args.len() == 1 && args[0].text.is_empty() {
            args.clear();
        }
    }

    Ok(Some(CommandUnit {
        absolute,
        header,
        args,
        span,
    }))
}

/// Build an argument from the tokens of one comma slot, trimming whitespace.
fn argument_from<'a>(message: &'a str, toks: &[Token<'a>], unit_end: usize) -> Argument<'a> {
    let mut lo = 0;
    let mut hi = toks.len();
    while lo < hi && toks[lo].kind == TokKind::Whitespace {
        lo += 1;
    }
    while hi > lo && toks[hi - 1].kind == TokKind::Whitespace {
        hi -= 1;
    }
    if lo == hi {
        return Argument {
            text: "",
            span: Span::empty(unit_end),
        };
    }
    // Slice the message across all slot tokens so multi-word or
    // colon-containing arguments survive as one value.
    let span = Span::new(toks[lo].span.start, toks[hi - 1].span.end);
    Argument {
        text: &message[span.start..span.end],
        span,
    }
}
