use serde::Serialize;

use super::{AlterTable, CreateTable, RelationKey};

/// One parsed statement together with the byte range it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawStatement {
    pub location: usize,
    pub len: usize,
    pub stmt: Statement,
}

impl RawStatement {
    pub fn new(location: usize, len: usize, stmt: Statement) -> Self {
        Self { location, len, stmt }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Statement {
    CreateTable(CreateTable),
    AlterTable(AlterTable),
    CreateIndex(CreateIndex),
    CreateSequence(CreateSequence),
    AlterSequence(AlterSequence),
    Insert(Insert),
    Select(Select),
    View(View),
    CreateTableAs(CreateTableAs),
    CommentOn(CommentOn),
    VariableSet(VariableSet),
    Other(Other),
}

/// Statement category used for layout decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    CreateTable,
    AlterTable,
    CreateIndex,
    CreateSequence,
    AlterSequence,
    Insert,
    Select,
    View,
    CreateTableAs,
    CommentOn,
    VariableSet,
    Other,
}

impl Statement {
    pub fn kind(&self) -> StatementKind {
        match self {
            Statement::CreateTable(_) => StatementKind::CreateTable,
            Statement::AlterTable(_) => StatementKind::AlterTable,
            Statement::CreateIndex(_) => StatementKind::CreateIndex,
            Statement::CreateSequence(_) => StatementKind::CreateSequence,
            Statement::AlterSequence(_) => StatementKind::AlterSequence,
            Statement::Insert(_) => StatementKind::Insert,
            Statement::Select(_) => StatementKind::Select,
            Statement::View(_) => StatementKind::View,
            Statement::CreateTableAs(_) => StatementKind::CreateTableAs,
            Statement::CommentOn(_) => StatementKind::CommentOn,
            Statement::VariableSet(_) => StatementKind::VariableSet,
            Statement::Other(_) => StatementKind::Other,
        }
    }

    /// Relation created by a table-like statement.
    pub fn created_relation(&self) -> Option<&RelationKey> {
        match self {
            Statement::CreateTable(table) => Some(&table.relation),
            Statement::CreateTableAs(table_as) => Some(&table_as.relation),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateIndex {
    pub unique: bool,
    pub concurrently: bool,
    pub if_not_exists: bool,
    pub name: Option<String>,
    pub only: bool,
    pub relation: RelationKey,
    pub method: Option<String>,
    /// Key list and everything after it, e.g. `(lower(email)) WHERE ...`.
    pub definition: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateSequence {
    pub if_not_exists: bool,
    pub relation: RelationKey,
    pub options: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlterSequence {
    pub if_exists: bool,
    pub relation: RelationKey,
    pub rest: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Insert {
    pub relation: RelationKey,
    pub columns: Vec<String>,
    pub source: InsertSource,
    /// `ON CONFLICT ...` / `RETURNING ...`.
    pub tail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum InsertSource {
    Values(Vec<Vec<String>>),
    Query(String),
    DefaultValues,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Select {
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct View {
    pub or_replace: bool,
    pub temporary: bool,
    pub recursive: bool,
    pub relation: RelationKey,
    pub columns: Vec<String>,
    pub options: Option<String>,
    pub query: String,
    /// `WITH [CASCADED | LOCAL] CHECK OPTION`.
    pub check_option: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableAsObject {
    Table,
    MaterializedView,
}

/// `CREATE MATERIALIZED VIEW ... AS` or `CREATE TABLE ... AS`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateTableAs {
    pub object: TableAsObject,
    pub persistence: Option<String>,
    pub if_not_exists: bool,
    pub relation: RelationKey,
    pub columns: Vec<String>,
    /// `USING method`, `WITH (...)` and `TABLESPACE` clauses.
    pub options: Option<String>,
    pub query: String,
    pub with_data: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentObject {
    Extension,
    Table,
    Column,
    Index,
    View,
    MaterializedView,
    Schema,
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentOn {
    pub object: CommentObject,
    /// Object name and the `IS ...` clause.
    pub rest: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SetScope {
    Session,
    Local,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableSet {
    pub scope: Option<SetScope>,
    pub name: String,
    pub args: Vec<SetValue>,
}

impl VariableSet {
    pub fn single_arg(&self) -> Option<&SetValue> {
        match self.args.as_slice() {
            [arg] => Some(arg),
            _ => None,
        }
    }
}

/// One argument of a `SET` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum SetValue {
    Integer(i64),
    /// Non-integer numeric literal, kept as written.
    Numeric(String),
    Str(String),
    /// A bare word such as `warning` or `off`, lower-cased.
    Word(String),
    Default,
}

/// Any statement the parser does not model, in canonical text form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Other {
    pub text: String,
}
