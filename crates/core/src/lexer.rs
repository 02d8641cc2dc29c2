use crate::limits::TOKEN_CAPACITY;
use arrayvec::ArrayVec;
use scpi_toolkit_diagnostics::Span;

/// Classification of a lexer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokKind {
    /// Command-hierarchy separator (`:`).
    Colon,
    /// Chained-command separator (`;`).
    Semicolon,
    /// Argument separator (`,`).
    Comma,
    /// A run of whitespace characters.
    Whitespace,
    /// A run of non-delimiter characters (keyword or argument text).
    Value,
}

/// A token that borrows its text directly from the input message — zero
/// allocation.
///
/// `text` is always exactly `&input[span.start..span.end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    /// The classification of this token.
    pub kind: TokKind,
    /// Borrowed slice of the input message for this token.
    pub text: &'a str,
    /// Byte span of the token within the message.
    pub span: Span,
}

/// Fixed-capacity storage of the tokens of one message.
pub type TokenBuffer<'a> = ArrayVec<Token<'a>, TOKEN_CAPACITY>;

/// The message produced more tokens than [`TOKEN_CAPACITY`].
///
/// Classified as `ErrorCode::BufferOverflow` by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenOverflow;

/// Tokenize one terminated-and-stripped input message.
///
/// Delimiter detection operates on single bytes. All delimiters and the
/// whitespace test are ASCII (0x00–0x7F); UTF-8 continuation bytes fall in
/// 0x80–0xBF and never match, so multi-byte characters pass through inside
/// `Value` runs untouched.
pub fn tokenize(input: &str) -> Result<TokenBuffer<'_>, TokenOverflow> {
    let mut toks = TokenBuffer::new();
    let b = input.as_bytes();
    let mut i = 0usize;
    while i < b.len() {
        let start = i;
        let kind = match b[i] {
            b':' => {
                i += 1;
                TokKind::Colon
            }
            b';' => {
                i += 1;
                TokKind::Semicolon
            }
            b',' => {
                i += 1;
                TokKind::Comma
            }
            c if c.is_ascii_whitespace() => {
                i += 1;
                while i < b.len() && b[i].is_ascii_whitespace() {
                    i += 1;
                }
                TokKind::Whitespace
            }
            _ => {
                i += 1;
                while i < b.len()
                    && !matches!(b[i], b':' | b';' | b',')
                    && !b[i].is_ascii_whitespace()
                {
                    i += 1;
                }
                TokKind::Value
            }
        };
        toks.try_push(Token {
            kind,
            text: &input[start..i],
            span: Span::new(start, i),
        })
        .map_err(|_| TokenOverflow)?;
    }
    Ok(toks)
}
