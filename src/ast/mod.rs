//! Statement model for one schema dump.
//!
//! Pure data: the parser builds it, transforms rewrite it, the deparser
//! renders it back to SQL.

pub mod alter;
pub mod relation;
pub mod statement;
pub mod table;

pub use self::alter::{AlterObjectType, AlterTable, AlterTableCmd};
pub use self::relation::RelationKey;
pub use self::statement::{
    AlterSequence, CommentObject, CommentOn, CreateIndex, CreateSequence, CreateTableAs, Insert,
    InsertSource, Other, RawStatement, Select, SetScope, SetValue, Statement, StatementKind,
    TableAsObject, VariableSet, View,
};
pub use self::table::{
    ColumnDef, Constraint, ConstraintKind, CreateTable, IntegerWidth, TableElement, TypeName,
};
