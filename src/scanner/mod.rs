//! SQL scanner.
//!
//! Splits text into tokens following the PostgreSQL lexical rules. Tokens do
//! not own their text: each carries the byte range it was read from, so the
//! caller can slice the original input. Comments are skipped.

mod keywords;

pub use keywords::Keyword;

use crate::error::{FormatError, FormatResult};

/// The lexical category of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Keyword(Keyword),
    Ident,
    QuotedIdent,
    String,
    Number,
    Param,
    Op,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Dot,
    Colon,
    DoubleColon,
    /// Synthetic gap between two non-contiguous tokens.
    Whitespace,
}

/// A token and the byte range it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }
}

macro_rules! bail {
    ($pos:expr, $($fmt:expr),*) => {
        return Err(FormatError::parse($pos, format!($($fmt),*)))
    }
}

/// Streaming lexer over a borrowed string.
///
/// Yields tokens lazily so callers that only need a prefix of the input do
/// not pay for lexing the rest of it.
pub struct Lexer<'a> {
    source: &'a str,
    pos: usize,
    prev: Option<TokenKind>,
    failed: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            prev: None,
            failed: false,
        }
    }

    /// Current byte offset into the source.
    pub fn offset(&self) -> usize {
        self.pos
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.source[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn consume(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if !pred(ch) {
                break;
            }
            self.pos += ch.len_utf8();
        }
        &self.source[start..self.pos]
    }

    /// Lex the next token, skipping whitespace and comments.
    pub fn next_token(&mut self) -> FormatResult<Option<Token>> {
        loop {
            let start = self.pos;
            let Some(ch) = self.bump() else {
                return Ok(None);
            };
            let kind = match ch {
                _ if ch.is_whitespace() => continue,
                '-' if self.consume('-') => {
                    self.take_while(|ch| ch != '\n');
                    continue;
                }
                '/' if self.consume('*') => {
                    self.lex_block_comment(start)?;
                    continue;
                }
                '\'' => {
                    self.lex_string(start, false)?;
                    TokenKind::String
                }
                'e' | 'E' if self.consume('\'') => {
                    self.lex_string(start, true)?;
                    TokenKind::String
                }
                'x' | 'X' | 'b' | 'B' | 'n' | 'N' if self.consume('\'') => {
                    self.lex_string(start, false)?;
                    TokenKind::String
                }
                'A'..='Z' | 'a'..='z' | '_' | '\u{80}'..=char::MAX => self.lex_word(start),
                '"' => {
                    self.lex_quoted_ident(start)?;
                    TokenKind::QuotedIdent
                }
                '0'..='9' => {
                    self.lex_number();
                    TokenKind::Number
                }
                '.' if matches!(self.peek(), Some('0'..='9')) => {
                    self.lex_number();
                    TokenKind::Number
                }
                '$' if matches!(self.peek(), Some('0'..='9')) => {
                    self.take_while(|ch| ch.is_ascii_digit());
                    TokenKind::Param
                }
                '$' => {
                    self.lex_dollar_string(start)?;
                    TokenKind::String
                }
                '(' => TokenKind::LParen,
                ')' => TokenKind::RParen,
                '[' => TokenKind::LBracket,
                ']' => TokenKind::RBracket,
                ',' => TokenKind::Comma,
                ';' => TokenKind::Semicolon,
                '.' => TokenKind::Dot,
                ':' if self.consume(':') => TokenKind::DoubleColon,
                ':' => TokenKind::Colon,
                #[rustfmt::skip]
                '+'|'-'|'*'|'/'|'<'|'>'|'='|'~'|'!'|'@'|'#'|'%'|'^'|'&'|'|'|'`'|'?' => {
                    self.lex_op(start);
                    TokenKind::Op
                }
                _ => bail!(start, "unexpected character in input: {}", ch),
            };
            self.prev = Some(kind);
            return Ok(Some(Token {
                kind,
                start,
                end: self.pos,
            }));
        }
    }

    fn lex_block_comment(&mut self, start: usize) -> FormatResult<()> {
        let mut nesting = 0;
        while let Some(ch) = self.bump() {
            match ch {
                '*' if self.consume('/') => {
                    if nesting == 0 {
                        return Ok(());
                    }
                    nesting -= 1;
                }
                '/' if self.consume('*') => nesting += 1,
                _ => (),
            }
        }
        bail!(start, "unterminated block comment")
    }

    fn lex_string(&mut self, start: usize, backslash_escapes: bool) -> FormatResult<()> {
        loop {
            match self.bump() {
                Some('\'') if self.consume('\'') => (),
                Some('\'') => return Ok(()),
                Some('\\') if backslash_escapes => {
                    self.bump();
                }
                Some(_) => (),
                None => bail!(start, "unterminated quoted string"),
            }
        }
    }

    fn lex_quoted_ident(&mut self, start: usize) -> FormatResult<()> {
        loop {
            match self.bump() {
                Some('"') if self.consume('"') => (),
                Some('"') => return Ok(()),
                Some(_) => (),
                None => bail!(start, "unterminated quoted identifier"),
            }
        }
    }

    fn lex_dollar_string(&mut self, start: usize) -> FormatResult<()> {
        let tag = self.take_while(|ch| ch.is_alphanumeric() || ch == '_');
        if !self.consume('$') {
            bail!(start, "unexpected character in input: $");
        }
        let delimiter = format!("${}$", tag);
        match self.source[self.pos..].find(&delimiter) {
            Some(offset) => {
                self.pos += offset + delimiter.len();
                Ok(())
            }
            None => bail!(start, "unterminated dollar-quoted string"),
        }
    }

    fn lex_word(&mut self, start: usize) -> TokenKind {
        self.take_while(|ch| ch.is_alphanumeric() || ch == '_' || ch == '$');
        let word = &self.source[start..self.pos];
        // A word on either side of a `.` is always part of a qualified name.
        let rest = self.source[self.pos..].trim_start();
        let qualified = self.prev == Some(TokenKind::Dot)
            || (rest.starts_with('.')
                && !rest[1..].starts_with(|ch: char| ch.is_ascii_digit()));
        match word.parse::<Keyword>() {
            Ok(kw) if !qualified => TokenKind::Keyword(kw),
            _ => TokenKind::Ident,
        }
    }

    fn lex_number(&mut self) {
        self.take_while(|ch| ch.is_ascii_digit());
        if self.peek() == Some('.') && self.peek_second() != Some('.') {
            self.bump();
            self.take_while(|ch| ch.is_ascii_digit());
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let mark = self.pos;
            self.bump();
            if !self.consume('-') {
                self.consume('+');
            }
            if self.take_while(|ch| ch.is_ascii_digit()).is_empty() {
                self.pos = mark;
            }
        }
    }

    fn lex_op(&mut self, start: usize) {
        while let Some(ch) = self.peek() {
            let next = self.peek_second();
            match ch {
                '-' if next == Some('-') => break,
                '/' if next == Some('*') => break,
                #[rustfmt::skip]
                '+'|'-'|'*'|'/'|'<'|'>'|'='|'~'|'!'|'@'|'#'|'%'|'^'|'&'|'|'|'`'|'?' => {
                    self.pos += 1;
                }
                _ => break,
            }
        }

        // A multi-character operator ending in `+` or `-` must contain a
        // nonstandard operator character, so `1+-2` lexes as `1 + -2`.
        let op = &self.source[start..self.pos];
        if op.len() > 1
            && op.ends_with(['-', '+'])
            && !op.contains(['~', '!', '@', '#', '%', '^', '&', '|', '`', '?'])
        {
            let trimmed = op.trim_end_matches(['-', '+']);
            self.pos = start + trimmed.len().max(1);
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = FormatResult<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.next_token() {
            Ok(token) => token.map(Ok),
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

/// Scan a complete string into tokens.
pub fn scan(source: &str) -> FormatResult<Vec<Token>> {
    Lexer::new(source).collect()
}

/// Value of a fragment that consists of exactly one plain string literal.
pub fn string_literal(fragment: &str) -> Option<String> {
    let tokens = scan(fragment).ok()?;
    let [token] = tokens.as_slice() else {
        return None;
    };
    let text = token.text(fragment);
    if token.kind != TokenKind::String || !text.starts_with('\'') {
        return None;
    }
    Some(text[1..text.len() - 1].replace("''", "'"))
}
