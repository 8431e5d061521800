//! Canonical SQL rendering for the statement model.
//!
//! Every node renders to a single line. Opaque fragments (defaults, checks,
//! view queries, options) were stored in canonical form by the parser, so
//! rendering is plain concatenation.

use crate::ast::*;
use crate::scanner::{Keyword, Lexer, Token, TokenKind};

/// Trait for converting AST nodes to SQL.
pub trait ToSql {
    /// Convert this node to a single-line SQL string.
    fn to_sql(&self) -> String;
}

/// Quote an identifier unless it can be written bare.
pub fn quote_ident(name: &str) -> String {
    if is_plain_ident(name) && !is_reserved(name) {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}

fn is_plain_ident(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some('a'..='z' | '_'))
        && chars.all(|c| matches!(c, 'a'..='z' | '0'..='9' | '_' | '$'))
}

fn is_reserved(name: &str) -> bool {
    name.parse::<Keyword>().is_ok_and(Keyword::is_reserved)
}

fn quote_list(names: &[String]) -> String {
    names
        .iter()
        .map(|name| quote_ident(name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Tokens of a fragment, stopping quietly at the first lexical error.
///
/// Fragments handed to the normalizers are slices of statements that
/// already scanned cleanly, so the error path only guards misuse.
fn fragment_tokens(text: &str) -> (Vec<Token>, &str) {
    let mut lexer = Lexer::new(text);
    let mut tokens = Vec::new();
    while let Ok(Some(token)) = lexer.next_token() {
        tokens.push(token);
    }
    let rest = match tokens.last() {
        Some(last) if lexer.offset() < text.len() => text[last.end..].trim(),
        None => text.trim(),
        _ => "",
    };
    (tokens, rest)
}

/// Re-tokenize a fragment and join it with canonical spacing and casing.
pub fn normalize(text: &str) -> String {
    render_tokens(text, |token, raw| match token.kind {
        TokenKind::Keyword(kw) => kw.as_str().to_string(),
        TokenKind::Ident => raw.to_lowercase(),
        TokenKind::QuotedIdent => requote(raw),
        _ => raw.to_string(),
    })
}

/// Canonical spelling of a type name: lower case, single spaces, and no
/// redundant `without time zone`.
pub fn normalize_type(text: &str) -> String {
    let rendered = render_tokens(text, |token, raw| match token.kind {
        TokenKind::QuotedIdent => raw.to_string(),
        _ => raw.to_lowercase(),
    });
    rendered.replace(" without time zone", "")
}

/// Canonical text of a quoted identifier: bare when that reads the same.
fn requote(raw: &str) -> String {
    let inner = raw[1..raw.len() - 1].replace("\"\"", "\"");
    if is_plain_ident(&inner) && inner.parse::<Keyword>().is_err() {
        inner
    } else {
        raw.to_string()
    }
}

fn render_tokens(text: &str, spell: impl Fn(&Token, &str) -> String) -> String {
    let (tokens, rest) = fragment_tokens(text);
    let mut out = String::with_capacity(text.len());
    let mut unary = false;
    for (i, token) in tokens.iter().enumerate() {
        let raw = token.text(text);
        if i > 0 && needs_space(&tokens[i - 1], token, unary) {
            out.push(' ');
        }
        out.push_str(&spell(token, raw));
        unary = token.kind == TokenKind::Op
            && matches!(raw, "-" | "+")
            && is_operand_start(i.checked_sub(1).map(|j| &tokens[j]));
    }
    if !rest.is_empty() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(rest);
    }
    out
}

/// Whether an operator after `prev` sits in prefix position.
fn is_operand_start(prev: Option<&Token>) -> bool {
    match prev.map(|t| t.kind) {
        None => true,
        Some(
            TokenKind::LParen
            | TokenKind::LBracket
            | TokenKind::Comma
            | TokenKind::Op
            | TokenKind::Colon,
        ) => true,
        Some(TokenKind::Keyword(kw)) => !matches!(
            kw,
            Keyword::Null
                | Keyword::True
                | Keyword::False
                | Keyword::End
                | Keyword::CurrentDate
                | Keyword::CurrentTime
                | Keyword::CurrentTimestamp
                | Keyword::CurrentUser
                | Keyword::CurrentSchema
                | Keyword::SessionUser
                | Keyword::User
                | Keyword::LocalTime
                | Keyword::LocalTimestamp
        ),
        _ => false,
    }
}

fn needs_space(prev: &Token, cur: &Token, prev_unary: bool) -> bool {
    use TokenKind::*;

    match cur.kind {
        Comma | RParen | RBracket | Semicolon | Dot | DoubleColon | Colon => return false,
        _ => {}
    }
    match prev.kind {
        LParen | LBracket | Dot | DoubleColon | Colon => return false,
        Op if prev_unary => return false,
        _ => {}
    }
    match cur.kind {
        LParen => match prev.kind {
            Ident | QuotedIdent => false,
            Keyword(kw) => !kw.is_function_like(),
            _ => true,
        },
        LBracket => !matches!(
            prev.kind,
            Ident | QuotedIdent | RParen | RBracket | Keyword(self::Keyword::Array)
        ),
        _ => true,
    }
}

impl ToSql for RelationKey {
    fn to_sql(&self) -> String {
        self.to_string()
    }
}

impl ToSql for Constraint {
    fn to_sql(&self) -> String {
        let mut sql = String::new();
        if let Some(name) = &self.name {
            sql.push_str("CONSTRAINT ");
            sql.push_str(&quote_ident(name));
            sql.push(' ');
        }
        sql.push_str(&self.kind.to_sql());
        if let Some(attributes) = &self.attributes {
            sql.push(' ');
            sql.push_str(attributes);
        }
        sql
    }
}

impl ToSql for ConstraintKind {
    fn to_sql(&self) -> String {
        match self {
            ConstraintKind::NotNull => "NOT NULL".to_string(),
            ConstraintKind::Null => "NULL".to_string(),
            ConstraintKind::Default { expr } => format!("DEFAULT {}", expr),
            ConstraintKind::Check { expr } => format!("CHECK ({})", expr),
            ConstraintKind::PrimaryKey { columns } if columns.is_empty() => {
                "PRIMARY KEY".to_string()
            }
            ConstraintKind::PrimaryKey { columns } => {
                format!("PRIMARY KEY ({})", quote_list(columns))
            }
            ConstraintKind::Unique {
                columns,
                nulls_not_distinct,
            } => {
                let mut sql = String::from("UNIQUE");
                if *nulls_not_distinct {
                    sql.push_str(" NULLS NOT DISTINCT");
                }
                if !columns.is_empty() {
                    sql.push_str(&format!(" ({})", quote_list(columns)));
                }
                sql
            }
            ConstraintKind::ForeignKey {
                columns,
                references,
                ref_columns,
            } => {
                let mut sql = String::new();
                if !columns.is_empty() {
                    sql.push_str(&format!("FOREIGN KEY ({}) ", quote_list(columns)));
                }
                sql.push_str("REFERENCES ");
                sql.push_str(&references.to_sql());
                if !ref_columns.is_empty() {
                    sql.push_str(&format!(" ({})", quote_list(ref_columns)));
                }
                sql
            }
            ConstraintKind::Generated { text } => text.clone(),
            ConstraintKind::Collate { collation } => format!("COLLATE {}", collation),
            ConstraintKind::Other { text } => text.clone(),
        }
    }
}

impl ToSql for ColumnDef {
    fn to_sql(&self) -> String {
        let mut sql = format!("{} {}", quote_ident(&self.name), self.type_name.as_str());
        for constraint in &self.constraints {
            sql.push(' ');
            sql.push_str(&constraint.to_sql());
        }
        sql
    }
}

impl ToSql for TableElement {
    fn to_sql(&self) -> String {
        match self {
            TableElement::Column(column) => column.to_sql(),
            TableElement::Constraint(constraint) => constraint.to_sql(),
        }
    }
}

impl ToSql for CreateTable {
    fn to_sql(&self) -> String {
        let mut sql = String::from("CREATE ");
        if let Some(persistence) = &self.persistence {
            sql.push_str(persistence);
            sql.push(' ');
        }
        sql.push_str("TABLE ");
        if self.if_not_exists {
            sql.push_str("IF NOT EXISTS ");
        }
        sql.push_str(&self.relation.to_sql());
        let elements: Vec<String> = self.elements.iter().map(|e| e.to_sql()).collect();
        sql.push_str(" (");
        sql.push_str(&elements.join(", "));
        sql.push(')');
        if let Some(tail) = &self.tail {
            sql.push(' ');
            sql.push_str(tail);
        }
        sql
    }
}

impl ToSql for AlterTableCmd {
    fn to_sql(&self) -> String {
        match self {
            AlterTableCmd::AddConstraint(constraint) => format!("ADD {}", constraint.to_sql()),
            AlterTableCmd::ColumnDefault {
                column,
                default: Some(expr),
            } => format!("ALTER COLUMN {} SET DEFAULT {}", quote_ident(column), expr),
            AlterTableCmd::ColumnDefault {
                column,
                default: None,
            } => format!("ALTER COLUMN {} DROP DEFAULT", quote_ident(column)),
            AlterTableCmd::AlterColumnType {
                column,
                type_name,
                using,
            } => {
                let mut sql = format!(
                    "ALTER COLUMN {} TYPE {}",
                    quote_ident(column),
                    type_name.as_str()
                );
                if let Some(using) = using {
                    sql.push_str(" USING ");
                    sql.push_str(using);
                }
                sql
            }
            AlterTableCmd::Other { text } => text.clone(),
        }
    }
}

impl ToSql for AlterTable {
    fn to_sql(&self) -> String {
        let mut sql = format!("ALTER {} ", self.object_type.as_str());
        if self.if_exists {
            sql.push_str("IF EXISTS ");
        }
        if self.only {
            sql.push_str("ONLY ");
        }
        sql.push_str(&self.relation.to_sql());
        let commands: Vec<String> = self.commands.iter().map(|c| c.to_sql()).collect();
        sql.push(' ');
        sql.push_str(&commands.join(", "));
        sql
    }
}

impl ToSql for CreateIndex {
    fn to_sql(&self) -> String {
        let mut sql = String::from("CREATE ");
        if self.unique {
            sql.push_str("UNIQUE ");
        }
        sql.push_str("INDEX ");
        if self.concurrently {
            sql.push_str("CONCURRENTLY ");
        }
        if self.if_not_exists {
            sql.push_str("IF NOT EXISTS ");
        }
        if let Some(name) = &self.name {
            sql.push_str(&quote_ident(name));
            sql.push(' ');
        }
        sql.push_str("ON ");
        if self.only {
            sql.push_str("ONLY ");
        }
        sql.push_str(&self.relation.to_sql());
        if let Some(method) = &self.method {
            sql.push_str(" USING ");
            sql.push_str(method);
        }
        sql.push(' ');
        sql.push_str(&self.definition);
        sql
    }
}

impl ToSql for CreateSequence {
    fn to_sql(&self) -> String {
        let mut sql = String::from("CREATE SEQUENCE ");
        if self.if_not_exists {
            sql.push_str("IF NOT EXISTS ");
        }
        sql.push_str(&self.relation.to_sql());
        if let Some(options) = &self.options {
            sql.push(' ');
            sql.push_str(options);
        }
        sql
    }
}

impl ToSql for AlterSequence {
    fn to_sql(&self) -> String {
        let mut sql = String::from("ALTER SEQUENCE ");
        if self.if_exists {
            sql.push_str("IF EXISTS ");
        }
        sql.push_str(&self.relation.to_sql());
        sql.push(' ');
        sql.push_str(&self.rest);
        sql
    }
}

impl ToSql for Insert {
    fn to_sql(&self) -> String {
        let mut sql = format!("INSERT INTO {}", self.relation.to_sql());
        if !self.columns.is_empty() {
            sql.push_str(&format!(" ({})", quote_list(&self.columns)));
        }
        match &self.source {
            InsertSource::Values(rows) => {
                let rows: Vec<String> = rows
                    .iter()
                    .map(|row| format!("({})", row.join(", ")))
                    .collect();
                sql.push_str(" VALUES ");
                sql.push_str(&rows.join(", "));
            }
            InsertSource::Query(query) => {
                sql.push(' ');
                sql.push_str(query);
            }
            InsertSource::DefaultValues => sql.push_str(" DEFAULT VALUES"),
        }
        if let Some(tail) = &self.tail {
            sql.push(' ');
            sql.push_str(tail);
        }
        sql
    }
}

impl ToSql for View {
    fn to_sql(&self) -> String {
        let mut sql = String::from("CREATE ");
        if self.or_replace {
            sql.push_str("OR REPLACE ");
        }
        if self.temporary {
            sql.push_str("TEMPORARY ");
        }
        if self.recursive {
            sql.push_str("RECURSIVE ");
        }
        sql.push_str("VIEW ");
        sql.push_str(&self.relation.to_sql());
        if !self.columns.is_empty() {
            sql.push_str(&format!(" ({})", quote_list(&self.columns)));
        }
        if let Some(options) = &self.options {
            sql.push(' ');
            sql.push_str(options);
        }
        sql.push_str(" AS ");
        sql.push_str(&self.query);
        if let Some(check_option) = &self.check_option {
            sql.push(' ');
            sql.push_str(check_option);
        }
        sql
    }
}

impl ToSql for CreateTableAs {
    fn to_sql(&self) -> String {
        let mut sql = String::from("CREATE ");
        match self.object {
            TableAsObject::MaterializedView => sql.push_str("MATERIALIZED VIEW "),
            TableAsObject::Table => {
                if let Some(persistence) = &self.persistence {
                    sql.push_str(persistence);
                    sql.push(' ');
                }
                sql.push_str("TABLE ");
            }
        }
        if self.if_not_exists {
            sql.push_str("IF NOT EXISTS ");
        }
        sql.push_str(&self.relation.to_sql());
        if !self.columns.is_empty() {
            sql.push_str(&format!(" ({})", quote_list(&self.columns)));
        }
        if let Some(options) = &self.options {
            sql.push(' ');
            sql.push_str(options);
        }
        sql.push_str(" AS ");
        sql.push_str(&self.query);
        if !self.with_data {
            sql.push_str(" WITH NO DATA");
        }
        sql
    }
}

impl ToSql for CommentObject {
    fn to_sql(&self) -> String {
        match self {
            CommentObject::Extension => "EXTENSION".to_string(),
            CommentObject::Table => "TABLE".to_string(),
            CommentObject::Column => "COLUMN".to_string(),
            CommentObject::Index => "INDEX".to_string(),
            CommentObject::View => "VIEW".to_string(),
            CommentObject::MaterializedView => "MATERIALIZED VIEW".to_string(),
            CommentObject::Schema => "SCHEMA".to_string(),
            CommentObject::Other(word) => word.to_uppercase(),
        }
    }
}

impl ToSql for CommentOn {
    fn to_sql(&self) -> String {
        format!("COMMENT ON {} {}", self.object.to_sql(), self.rest)
    }
}

impl ToSql for SetValue {
    fn to_sql(&self) -> String {
        match self {
            SetValue::Integer(n) => n.to_string(),
            SetValue::Numeric(text) => text.clone(),
            SetValue::Str(s) => format!("'{}'", s.replace('\'', "''")),
            SetValue::Word(word) => match word.as_str() {
                "true" | "false" | "on" | "off" => word.to_uppercase(),
                _ => word.clone(),
            },
            SetValue::Default => "DEFAULT".to_string(),
        }
    }
}

impl ToSql for VariableSet {
    fn to_sql(&self) -> String {
        let mut sql = String::from("SET ");
        match self.scope {
            Some(SetScope::Session) => sql.push_str("SESSION "),
            Some(SetScope::Local) => sql.push_str("LOCAL "),
            None => {}
        }
        let args: Vec<String> = self.args.iter().map(|a| a.to_sql()).collect();
        sql.push_str(&self.name);
        sql.push_str(" TO ");
        sql.push_str(&args.join(", "));
        sql
    }
}

impl ToSql for Statement {
    fn to_sql(&self) -> String {
        match self {
            Statement::CreateTable(stmt) => stmt.to_sql(),
            Statement::AlterTable(stmt) => stmt.to_sql(),
            Statement::CreateIndex(stmt) => stmt.to_sql(),
            Statement::CreateSequence(stmt) => stmt.to_sql(),
            Statement::AlterSequence(stmt) => stmt.to_sql(),
            Statement::Insert(stmt) => stmt.to_sql(),
            Statement::Select(stmt) => stmt.query.clone(),
            Statement::View(stmt) => stmt.to_sql(),
            Statement::CreateTableAs(stmt) => stmt.to_sql(),
            Statement::CommentOn(stmt) => stmt.to_sql(),
            Statement::VariableSet(stmt) => stmt.to_sql(),
            Statement::Other(stmt) => stmt.text.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("comments"), "comments");
        assert_eq!(quote_ident("type"), "type");
        assert_eq!(quote_ident("order"), "\"order\"");
        assert_eq!(quote_ident("UserId"), "\"UserId\"");
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_normalize_spacing() {
        assert_eq!(
            normalize("nextval( 'public.posts_id_seq'::regclass )"),
            "nextval('public.posts_id_seq'::regclass)"
        );
        assert_eq!(normalize("(score<10)"), "(score < 10)");
        assert_eq!(normalize("ARRAY[ 1,2 ]"), "ARRAY[1, 2]");
        assert_eq!(normalize("x = -1"), "x = -1");
        assert_eq!(normalize("a  -  b"), "a - b");
        assert_eq!(normalize("tags [1]"), "tags[1]");
    }

    #[test]
    fn test_normalize_casing() {
        assert_eq!(
            normalize("select Posts.ID from public.\"posts\" where x is not null"),
            "SELECT posts.id FROM public.posts WHERE x IS NOT NULL"
        );
        assert_eq!(normalize("\"Users\".\"key\""), "\"Users\".\"key\"");
        assert_eq!(normalize("count(*) filter (where ok)"), "count(*) FILTER (WHERE ok)");
    }

    #[test]
    fn test_normalize_drops_comments() {
        assert_eq!(normalize("1 -- one\n + 2 /* two */"), "1 + 2");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let inputs = [
            "SELECT a,b FROM t WHERE a<>b AND NOT (b=-1)",
            "CASE WHEN x THEN 'a' ELSE 'b' END",
            "(lower((email)::text)) WHERE (deleted_at IS NULL)",
            "START WITH 1 INCREMENT BY 1 NO MINVALUE NO MAXVALUE CACHE 1",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "input: {}", input);
        }
    }

    #[test]
    fn test_normalize_type() {
        assert_eq!(normalize_type("\"char\""), "\"char\"");
        assert_eq!(normalize_type("time without time zone"), "time");
        assert_eq!(
            normalize_type("TIMESTAMP WITH TIME ZONE"),
            "timestamp with time zone"
        );
    }

    #[test]
    fn test_set_rendering() {
        let set = VariableSet {
            scope: None,
            name: "default_with_oids".into(),
            args: vec![SetValue::Word("true".into())],
        };
        assert_eq!(set.to_sql(), "SET default_with_oids TO TRUE");

        let set = VariableSet {
            scope: None,
            name: "search_path".into(),
            args: vec![SetValue::Str(String::new()), SetValue::Word("public".into())],
        };
        assert_eq!(set.to_sql(), "SET search_path TO '', public");
    }

    #[test]
    fn test_constraint_rendering() {
        let mut fk = Constraint::new(ConstraintKind::ForeignKey {
            columns: vec!["post_id".into()],
            references: RelationKey::qualified("public", "posts"),
            ref_columns: vec!["id".into()],
        });
        fk.name = Some("fk_rails_1".into());
        fk.attributes = Some("ON DELETE CASCADE".into());
        assert_eq!(
            fk.to_sql(),
            "CONSTRAINT fk_rails_1 FOREIGN KEY (post_id) REFERENCES public.posts (id) ON DELETE CASCADE"
        );
        assert_eq!(Constraint::primary_key_marker().to_sql(), "PRIMARY KEY");
    }
}
