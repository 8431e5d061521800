use serde::Serialize;

use super::{Constraint, RelationKey, TypeName};

/// Object class named after `ALTER`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlterObjectType {
    Table,
    ForeignTable,
    Index,
    View,
    MaterializedView,
}

impl AlterObjectType {
    pub fn as_str(self) -> &'static str {
        match self {
            AlterObjectType::Table => "TABLE",
            AlterObjectType::ForeignTable => "FOREIGN TABLE",
            AlterObjectType::Index => "INDEX",
            AlterObjectType::View => "VIEW",
            AlterObjectType::MaterializedView => "MATERIALIZED VIEW",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlterTable {
    pub object_type: AlterObjectType,
    pub if_exists: bool,
    pub only: bool,
    pub relation: RelationKey,
    pub commands: Vec<AlterTableCmd>,
}

impl AlterTable {
    /// The only sub-command, when there is exactly one.
    pub fn single_command(&self) -> Option<&AlterTableCmd> {
        match self.commands.as_slice() {
            [command] => Some(command),
            _ => None,
        }
    }

    /// The constraint added by a table statement with a single
    /// `ADD CONSTRAINT` sub-command.
    pub fn single_added_constraint(&self) -> Option<&Constraint> {
        if self.object_type != AlterObjectType::Table {
            return None;
        }
        match self.single_command()? {
            AlterTableCmd::AddConstraint(constraint) => Some(constraint),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum AlterTableCmd {
    AddConstraint(Constraint),
    /// `ALTER COLUMN c SET DEFAULT e`, or `DROP DEFAULT` when `default` is
    /// `None`.
    ColumnDefault {
        column: String,
        default: Option<String>,
    },
    AlterColumnType {
        column: String,
        type_name: TypeName,
        using: Option<String>,
    },
    Other {
        text: String,
    },
}
