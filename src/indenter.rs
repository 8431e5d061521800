//! Multi-line layout for canonical single-line SQL.
//!
//! The text is re-scanned and a synthetic whitespace token is inserted
//! wherever two tokens are not contiguous. One left-to-right pass then
//! decides, from the current token, the previous token and the innermost
//! open scope, whether to break the line, open or close a scope, or just
//! emit the token.
//!
//! Newlines are only ever inserted between tokens, so string literals and
//! dollar-quoted bodies come out exactly as they went in.

use tracing::trace;

use crate::error::{FormatError, FormatResult};
use crate::scanner::{Keyword, Token, TokenKind, scan};

const INDENT: &str = "  ";
const SELECT_PADDING: &str = "   ";

/// What opened a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScopeKind {
    Root,
    Create,
    Alter,
    Insert,
    View,
    With,
    Select,
    Case,
    /// `FROM`, `WHERE` and the other clause keywords.
    Clause(Keyword),
    /// `CROSS`, `INNER`, `LEFT`, `RIGHT` or `JOIN`.
    Join(Keyword),
    TableElements,
    /// A breaking parenthesis puts its contents on their own lines.
    Parens { breaking: bool },
}

impl ScopeKind {
    fn is_paren(self) -> bool {
        matches!(self, ScopeKind::TableElements | ScopeKind::Parens { .. })
    }
}

#[derive(Debug, Clone, Copy)]
struct Scope {
    kind: ScopeKind,
    indent: usize,
    padding: &'static str,
}

/// Output buffer that checks every token is appended exactly once.
#[derive(Debug)]
struct Output<'a> {
    text: String,
    scopes: Vec<Scope>,
    current: Option<&'a str>,
}

impl<'a> Output<'a> {
    fn new() -> Self {
        Self {
            text: String::new(),
            scopes: vec![Scope {
                kind: ScopeKind::Root,
                indent: 0,
                padding: "",
            }],
            current: None,
        }
    }

    fn set_current(&mut self, token: &'a str) -> FormatResult<()> {
        if self.current.is_some() {
            return Err(FormatError::invariant("previous token was not appended"));
        }
        self.current = Some(token);
        Ok(())
    }

    fn append_token(&mut self) -> FormatResult<()> {
        self.append_token_rjust(0)
    }

    fn append_token_rjust(&mut self, width: usize) -> FormatResult<()> {
        let token = self
            .current
            .take()
            .ok_or_else(|| FormatError::invariant("token was already appended"))?;
        self.text.push_str(&format!("{:>width$}", token, width = width));
        Ok(())
    }

    fn scope(&self) -> Scope {
        self.scopes.last().copied().unwrap_or(Scope {
            kind: ScopeKind::Root,
            indent: 0,
            padding: "",
        })
    }

    fn push_scope(&mut self, kind: ScopeKind, indent: usize, padding: &'static str) {
        self.scopes.push(Scope {
            kind,
            indent,
            padding,
        });
    }

    /// Close the innermost scope. The root scope stays open.
    fn pop_scope(&mut self) -> ScopeKind {
        if self.scopes.len() > 1 {
            self.scopes.pop().map_or(ScopeKind::Root, |scope| scope.kind)
        } else {
            ScopeKind::Root
        }
    }

    /// Close scopes up to and including the innermost parenthesis.
    fn close_parens(&mut self) -> FormatResult<()> {
        loop {
            if self.scopes.len() <= 1 {
                return Err(FormatError::invariant("unbalanced closing parenthesis"));
            }
            if self.pop_scope().is_paren() {
                return Ok(());
            }
        }
    }

    fn newline(&mut self) {
        let len = self.text.trim_end_matches(' ').len();
        self.text.truncate(len);
        self.text.push('\n');
    }

    fn append_whitespace(&mut self) {
        self.text.push(' ');
    }

    fn apply_indent(&mut self) {
        let depth: usize = self.scopes.iter().map(|scope| scope.indent).sum();
        self.text.push_str(&INDENT.repeat(depth));
        self.text.push_str(self.scope().padding);
    }

    fn finish(self) -> FormatResult<String> {
        if self.current.is_some() {
            return Err(FormatError::invariant("previous token was not appended"));
        }
        if let Some(scope) = self.scopes.iter().find(|scope| scope.kind.is_paren()) {
            return Err(FormatError::invariant(format!(
                "unclosed {:?} scope at end of statement",
                scope.kind
            )));
        }
        Ok(self.text)
    }
}

fn is_join(keyword: Keyword) -> bool {
    matches!(
        keyword,
        Keyword::Cross | Keyword::Inner | Keyword::Left | Keyword::Right | Keyword::Join
    )
}

fn is_clause(keyword: Keyword) -> bool {
    matches!(
        keyword,
        Keyword::From
            | Keyword::Where
            | Keyword::Group
            | Keyword::Order
            | Keyword::Window
            | Keyword::Having
            | Keyword::Limit
            | Keyword::Offset
            | Keyword::Fetch
            | Keyword::For
            | Keyword::Union
            | Keyword::Intersect
            | Keyword::Except
    )
}

/// Scanned tokens plus a `Whitespace` token in every gap.
fn with_whitespace(tokens: Vec<Token>) -> Vec<Token> {
    let mut out = Vec::with_capacity(tokens.len() * 2);
    let mut last_end = None;
    for token in tokens {
        if let Some(end) = last_end
            && end != token.start
        {
            out.push(Token {
                kind: TokenKind::Whitespace,
                start: end,
                end: token.start,
            });
        }
        last_end = Some(token.end);
        out.push(token);
    }
    out
}

/// Lay out one canonical statement over multiple lines.
pub fn indent(text: &str) -> FormatResult<String> {
    let tokens = with_whitespace(scan(text)?);
    trace!(tokens = tokens.len(), "indenting statement");

    let mut output = Output::new();
    let mut prev: Option<TokenKind> = None;
    for (i, token) in tokens.iter().enumerate() {
        let raw = match token.kind {
            TokenKind::Whitespace => " ",
            _ => token.text(text),
        };
        output.set_current(raw)?;
        let next = tokens.get(i + 1).map(|t| t.kind);
        step(&mut output, token.kind, prev, next)?;
        prev = Some(token.kind);
    }
    output.finish()
}

fn step(
    out: &mut Output<'_>,
    kind: TokenKind,
    prev: Option<TokenKind>,
    next: Option<TokenKind>,
) -> FormatResult<()> {
    use ScopeKind as S;
    use TokenKind::{Comma, LParen, RParen, Whitespace};

    let inside = out.scope().kind;
    match kind {
        TokenKind::Keyword(Keyword::Create) if inside == S::Root => {
            out.push_scope(S::Create, 0, "");
            out.append_token()
        }
        TokenKind::Keyword(Keyword::Alter) if inside == S::Root => {
            out.push_scope(S::Alter, 1, "");
            out.append_token()
        }
        TokenKind::Keyword(Keyword::Insert) if inside == S::Root => {
            out.push_scope(S::Insert, 0, "");
            out.append_token()
        }
        TokenKind::Keyword(Keyword::View) if inside == S::Create => {
            out.push_scope(S::View, 2, "");
            out.append_token()
        }
        TokenKind::Keyword(Keyword::With) if matches!(inside, S::Root | S::Create | S::View) => {
            out.push_scope(S::With, 0, "");
            out.append_token()
        }
        Whitespace if inside == S::View && prev == Some(TokenKind::Keyword(Keyword::As)) => {
            out.append_token()?;
            out.newline();
            out.apply_indent();
            Ok(())
        }
        Whitespace
            if prev == Some(Comma) && matches!(inside, S::With | S::Select | S::TableElements) =>
        {
            out.append_token()?;
            out.newline();
            out.apply_indent();
            Ok(())
        }
        Comma if inside == S::Insert => {
            out.newline();
            out.apply_indent();
            out.append_token()
        }
        TokenKind::Keyword(Keyword::Select) if matches!(inside, S::With | S::Insert) => {
            out.pop_scope();
            out.newline();
            out.apply_indent();
            out.append_token()?;
            out.push_scope(S::Select, 2, SELECT_PADDING);
            Ok(())
        }
        TokenKind::Keyword(Keyword::Select) => {
            out.append_token()?;
            out.push_scope(S::Select, 2, SELECT_PADDING);
            Ok(())
        }
        TokenKind::Keyword(Keyword::Alter | Keyword::Add | Keyword::Drop) if inside == S::Alter => {
            out.newline();
            out.apply_indent();
            out.append_token()
        }
        // left(...) and right(...) are function calls
        TokenKind::Keyword(Keyword::Left | Keyword::Right) if next == Some(LParen) => {
            out.append_token()
        }
        TokenKind::Keyword(keyword)
            if is_join(keyword)
                && matches!(
                    inside,
                    S::Select | S::Clause(Keyword::From) | S::Join(Keyword::Join)
                ) =>
        {
            out.pop_scope();
            out.newline();
            out.apply_indent();
            out.append_token()?;
            out.push_scope(S::Join(keyword), 0, "");
            Ok(())
        }
        TokenKind::Keyword(keyword)
            if is_join(keyword)
                && matches!(
                    inside,
                    S::Join(Keyword::Cross | Keyword::Inner | Keyword::Left | Keyword::Right)
                ) =>
        {
            out.append_token()?;
            out.pop_scope();
            out.push_scope(S::Join(keyword), 0, "");
            Ok(())
        }
        TokenKind::Keyword(keyword) if is_clause(keyword) && !inside.is_paren() => {
            out.pop_scope();
            out.newline();
            out.apply_indent();
            out.append_token()?;
            out.push_scope(S::Clause(keyword), 1, "");
            Ok(())
        }
        TokenKind::Keyword(Keyword::Or | Keyword::And) if inside == S::Clause(Keyword::Where) => {
            out.newline();
            out.apply_indent();
            out.append_token_rjust(3)
        }
        TokenKind::Keyword(Keyword::Case) => {
            let padding = out.scope().padding;
            out.append_token()?;
            out.push_scope(S::Case, 1, padding);
            Ok(())
        }
        TokenKind::Keyword(Keyword::When | Keyword::Else) if inside == S::Case => {
            out.newline();
            out.apply_indent();
            out.append_token()
        }
        TokenKind::Keyword(Keyword::End) if inside == S::Case => {
            out.pop_scope();
            out.newline();
            out.apply_indent();
            out.append_token()
        }
        TokenKind::Keyword(Keyword::Values) if inside == S::Insert => {
            out.append_token()?;
            out.newline();
            out.append_whitespace();
            Ok(())
        }
        LParen if inside == S::Create && prev == Some(Whitespace) => {
            out.append_token()?;
            out.newline();
            out.push_scope(S::TableElements, 2, "");
            out.apply_indent();
            Ok(())
        }
        LParen if matches!(inside, S::With | S::Join(Keyword::Join)) => {
            out.append_token()?;
            out.newline();
            out.push_scope(S::Parens { breaking: true }, 2, "");
            out.apply_indent();
            Ok(())
        }
        LParen => {
            out.push_scope(S::Parens { breaking: false }, 0, "");
            out.append_token()
        }
        RParen if inside == S::TableElements => {
            out.pop_scope();
            out.newline();
            out.apply_indent();
            out.append_token()
        }
        RParen if inside == (S::Parens { breaking: false }) => {
            out.pop_scope();
            out.append_token()
        }
        RParen => {
            out.close_parens()?;
            out.newline();
            out.apply_indent();
            out.append_token()
        }
        _ => out.append_token(),
    }
}
