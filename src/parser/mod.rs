//! Schema dump parser using nom.
//!
//! Parsing runs in two steps:
//!
//! 1. The scanner splits the dump on top-level `;`. Semicolons inside
//!    strings, dollar quotes, comments and parentheses never split.
//! 2. Each statement is parsed with case-insensitive keyword combinators
//!    into a typed [`Statement`]. A statement the grammar does not cover
//!    is kept as [`Statement::Other`] in canonical text form.
//!
//! Only lexical errors and a trailing unterminated statement are fatal.

mod statements;


use std::ops::Range;

use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, tag_no_case, take_while},
    character::complete::{char, satisfy},
    combinator::{map, opt, recognize},
    error::{Error, ErrorKind},
    multi::{many0, separated_list1},
    sequence::{delimited, pair, preceded},
    IResult,
};
use tracing::trace;

use crate::ast::*;
use crate::deparser::normalize;
use crate::error::{FormatError, FormatResult};
use crate::scanner::{Keyword, Lexer, TokenKind};

type PResult<'a, T> = IResult<&'a str, T>;

/// Parse a complete dump into its statements.
pub fn parse(source: &str) -> FormatResult<Vec<RawStatement>> {
    let spans = split_statements(source)?;
    let statements: Vec<RawStatement> = spans
        .into_iter()
        .map(|span| {
            let stmt = parse_statement(&source[span.clone()]);
            RawStatement::new(span.start, span.len(), stmt)
        })
        .collect();
    trace!(count = statements.len(), "parsed statements");
    Ok(statements)
}

/// Parse the text of one statement, without its terminating `;`.
pub fn parse_statement(text: &str) -> Statement {
    match statements::statement(text.trim()) {
        Ok((_, stmt)) => stmt,
        Err(_) => {
            trace!(statement = %first_words(text), "keeping statement as opaque text");
            Statement::Other(Other {
                text: normalize(text),
            })
        }
    }
}

fn first_words(text: &str) -> String {
    text.split_whitespace().take(3).collect::<Vec<_>>().join(" ")
}

/// Byte ranges of the statements in `source`, excluding the `;`.
pub fn split_statements(source: &str) -> FormatResult<Vec<Range<usize>>> {
    let mut spans = Vec::new();
    let mut start: Option<usize> = None;
    let mut depth = 0usize;
    for token in Lexer::new(source) {
        let token = token?;
        match token.kind {
            TokenKind::Semicolon if depth == 0 => {
                if let Some(begin) = start.take() {
                    spans.push(begin..token.start);
                }
                continue;
            }
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => depth = depth.saturating_sub(1),
            _ => {}
        }
        start.get_or_insert(token.start);
    }
    if let Some(begin) = start {
        return Err(FormatError::parse(begin, "unterminated statement"));
    }
    Ok(spans)
}

fn fail<T>(input: &str) -> PResult<'_, T> {
    Err(nom::Err::Error(Error::new(input, ErrorKind::Verify)))
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Skip whitespace and comments.
fn sp(mut input: &str) -> PResult<'_, ()> {
    loop {
        input = input.trim_start();
        if let Some(rest) = input.strip_prefix("--") {
            input = rest.find('\n').map_or("", |i| &rest[i..]);
        } else if let Some(rest) = input.strip_prefix("/*") {
            match rest.find("*/") {
                Some(i) => input = &rest[i + 2..],
                None => return fail(input),
            }
        } else {
            return Ok((input, ()));
        }
    }
}

/// Succeeds only at the end of the statement.
fn end(input: &str) -> PResult<'_, ()> {
    let (input, _) = sp(input)?;
    if input.is_empty() {
        Ok((input, ()))
    } else {
        fail(input)
    }
}

/// Match one keyword, case-insensitively, on a word boundary.
fn kw<'a>(word: &'static str) -> impl FnMut(&'a str) -> PResult<'a, &'a str> {
    move |input: &'a str| {
        let (rest, matched) = tag_no_case(word)(input)?;
        if rest.starts_with(is_word_char) {
            return fail(input);
        }
        let (rest, _) = sp(rest)?;
        Ok((rest, matched))
    }
}

/// Match a sequence of keywords.
fn kws<'a>(words: &'static [&'static str]) -> impl FnMut(&'a str) -> PResult<'a, ()> {
    move |mut input: &'a str| {
        for &word in words {
            input = kw(word)(input)?.0;
        }
        Ok((input, ()))
    }
}

fn symbol<'a>(c: char) -> impl FnMut(&'a str) -> PResult<'a, char> {
    move |input: &'a str| {
        let (rest, matched) = char(c)(input)?;
        let (rest, _) = sp(rest)?;
        Ok((rest, matched))
    }
}

/// Whether an optional clause is present.
fn flag<'a, O>(
    parser: impl FnMut(&'a str) -> PResult<'a, O>,
) -> impl FnMut(&'a str) -> PResult<'a, bool> {
    map(opt(parser), |matched| matched.is_some())
}

/// Any word, reserved or not, as written.
fn word(input: &str) -> PResult<'_, &str> {
    let (rest, matched) = recognize(pair(
        satisfy(|c| c.is_alphabetic() || c == '_'),
        take_while(is_word_char),
    ))(input)?;
    let (rest, _) = sp(rest)?;
    Ok((rest, matched))
}

fn bare_ident(input: &str) -> PResult<'_, String> {
    let (rest, matched) = recognize(pair(
        satisfy(|c| c.is_alphabetic() || c == '_'),
        take_while(is_word_char),
    ))(input)?;
    if matched.parse::<Keyword>().is_ok_and(Keyword::is_reserved) {
        return fail(input);
    }
    Ok((rest, matched.to_lowercase()))
}

fn quoted_ident(input: &str) -> PResult<'_, String> {
    let (rest, body) = delimited(
        char('"'),
        recognize(many0(alt((tag("\"\""), is_not("\""))))),
        char('"'),
    )(input)?;
    Ok((rest, body.replace("\"\"", "\"")))
}

/// An identifier, normalized: unquoted names fold to lower case.
fn ident(input: &str) -> PResult<'_, String> {
    let (rest, name) = alt((quoted_ident, bare_ident))(input)?;
    let (rest, _) = sp(rest)?;
    Ok((rest, name))
}

/// `name`, `schema.name` or `database.schema.name`.
fn qualified_name(input: &str) -> PResult<'_, RelationKey> {
    let (input, first) = ident(input)?;
    let (input, second) = opt(preceded(symbol('.'), ident))(input)?;
    let (input, third) = opt(preceded(symbol('.'), ident))(input)?;
    let key = match (second, third) {
        (None, _) => RelationKey::new(first),
        (Some(name), None) => RelationKey::qualified(first, name),
        (Some(schema), Some(name)) => RelationKey::qualified(schema, name),
    };
    Ok((input, key))
}

/// `( a, b, ... )`
fn ident_list(input: &str) -> PResult<'_, Vec<String>> {
    delimited(symbol('('), separated_list1(symbol(','), ident), symbol(')'))(input)
}

/// `'...'` with `''` escapes, unescaped.
fn string_literal(input: &str) -> PResult<'_, String> {
    let (rest, body) = delimited(
        char('\''),
        recognize(many0(alt((tag("''"), is_not("'"))))),
        char('\''),
    )(input)?;
    let (rest, _) = sp(rest)?;
    Ok((rest, body.replace("''", "'")))
}

/// A balanced run of tokens.
///
/// Stops before a top-level `)`, `]` or `;`, before a top-level `,` when
/// `stop_at_comma` is set, and before any of `stop_words` at the top level
/// (never on the first token). Parentheses, brackets and `CASE ... END`
/// nest. Fails when nothing was consumed.
fn fragment<'a>(
    stop_at_comma: bool,
    stop_words: &'static [&'static str],
) -> impl FnMut(&'a str) -> PResult<'a, &'a str> {
    move |input: &'a str| {
        let mut lexer = Lexer::new(input);
        let mut depth = 0usize;
        let mut end_of_fragment = 0;
        let mut first = true;
        loop {
            let token = match lexer.next_token() {
                Ok(Some(token)) => token,
                Ok(None) => break,
                Err(_) => return fail(input),
            };
            let at_top = depth == 0;
            match token.kind {
                TokenKind::LParen | TokenKind::LBracket => depth += 1,
                TokenKind::Keyword(Keyword::Case) => depth += 1,
                TokenKind::RParen | TokenKind::RBracket if at_top => break,
                TokenKind::Semicolon if at_top => break,
                TokenKind::Comma if at_top && stop_at_comma => break,
                TokenKind::RParen | TokenKind::RBracket => depth -= 1,
                TokenKind::Keyword(Keyword::End) if !at_top => depth -= 1,
                TokenKind::Keyword(_) | TokenKind::Ident
                    if at_top
                        && !first
                        && stop_words
                            .iter()
                            .any(|w| token.text(input).eq_ignore_ascii_case(w)) =>
                {
                    break;
                }
                _ => {}
            }
            end_of_fragment = token.end;
            first = false;
        }
        if end_of_fragment == 0 {
            return fail(input);
        }
        let (rest, _) = sp(&input[end_of_fragment..])?;
        Ok((rest, &input[..end_of_fragment]))
    }
}

/// `( fragment )`, returning the inner text.
fn parenthesized(input: &str) -> PResult<'_, &str> {
    delimited(symbol('('), fragment(false, &[]), symbol(')'))(input)
}

/// Drop parentheses that wrap a whole canonical query.
fn strip_outer_parens(query: String) -> String {
    let mut text = query.as_str();
    loop {
        let Ok(tokens) = crate::scanner::scan(text) else {
            break;
        };
        let (Some(first), Some(last)) = (tokens.first(), tokens.last()) else {
            break;
        };
        if first.kind != TokenKind::LParen || last.kind != TokenKind::RParen {
            break;
        }
        let mut depth = 0usize;
        let closes_at_end = tokens.iter().enumerate().all(|(i, token)| {
            match token.kind {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => depth -= 1,
                _ => {}
            }
            depth > 0 || i == tokens.len() - 1
        });
        if !closes_at_end {
            break;
        }
        text = text[first.end..last.start].trim();
    }
    text.to_string()
}
