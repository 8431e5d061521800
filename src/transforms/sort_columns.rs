use std::collections::{BTreeMap, BTreeSet};

use tracing::trace;

use super::Transform;
use crate::ast::{AlterTableCmd, ConstraintKind, CreateTable, RawStatement, RelationKey, Statement, TableElement};

/// One table element with what is known about its key membership.
#[derive(Debug, Clone, Copy)]
pub struct SortableEntry<'a> {
    pub element: &'a TableElement,
    pub primary_key: bool,
    pub foreign_key: bool,
}

/// Sort key of a table element. Elements sort by the key, stably.
pub type PriorityMapping = fn(&SortableEntry<'_>) -> (u8, String);

/// Primary key columns, foreign key columns, plain columns, timestamps,
/// then table constraints. Ties break on name.
pub fn default_priority(entry: &SortableEntry<'_>) -> (u8, String) {
    match entry.element {
        TableElement::Constraint(constraint) => (5, constraint.name.clone().unwrap_or_default()),
        TableElement::Column(column) => {
            let class = if entry.primary_key {
                0
            } else if entry.foreign_key {
                1
            } else if column.type_name.is_timestamp() {
                3
            } else {
                2
            };
            (class, column.name.clone())
        }
    }
}

/// Reorders the elements of every `CREATE TABLE`.
pub struct SortTableColumns {
    priority: PriorityMapping,
}

impl Default for SortTableColumns {
    fn default() -> Self {
        Self::new()
    }
}

impl SortTableColumns {
    pub fn new() -> Self {
        Self::with_priority(default_priority)
    }

    pub fn with_priority(priority: PriorityMapping) -> Self {
        Self { priority }
    }
}

#[derive(Debug, Default)]
struct KeyColumns {
    primary: BTreeSet<String>,
    foreign: BTreeSet<String>,
}

impl KeyColumns {
    fn record(&mut self, kind: &ConstraintKind) {
        match kind {
            ConstraintKind::PrimaryKey { columns } => self.primary.extend(columns.iter().cloned()),
            ConstraintKind::ForeignKey { columns, .. } => {
                self.foreign.extend(columns.iter().cloned())
            }
            _ => {}
        }
    }

    fn record_table(&mut self, table: &CreateTable) {
        for element in &table.elements {
            match element {
                TableElement::Constraint(constraint) => self.record(&constraint.kind),
                TableElement::Column(column) => {
                    if column.is_primary_key() {
                        self.primary.insert(column.name.clone());
                    }
                    if column.is_foreign_key() {
                        self.foreign.insert(column.name.clone());
                    }
                }
            }
        }
    }
}

/// Keys added by `ALTER TABLE` statements, per table.
fn altered_keys(statements: &[RawStatement]) -> BTreeMap<RelationKey, KeyColumns> {
    let mut keys: BTreeMap<RelationKey, KeyColumns> = BTreeMap::new();
    for raw in statements {
        let Statement::AlterTable(alter) = &raw.stmt else {
            continue;
        };
        for command in &alter.commands {
            if let AlterTableCmd::AddConstraint(constraint) = command {
                keys.entry(alter.relation.clone())
                    .or_default()
                    .record(&constraint.kind);
            }
        }
    }
    keys
}

impl Transform for SortTableColumns {
    fn name(&self) -> &'static str {
        "sort_table_columns"
    }

    fn apply(&self, statements: &mut Vec<RawStatement>) {
        let mut altered = altered_keys(statements);
        for raw in statements.iter_mut() {
            let Statement::CreateTable(table) = &mut raw.stmt else {
                continue;
            };
            let mut keys = altered.remove(&table.relation).unwrap_or_default();
            keys.record_table(table);

            let mut keyed: Vec<((u8, String), TableElement)> = std::mem::take(&mut table.elements)
                .into_iter()
                .map(|element| {
                    let (primary_key, foreign_key) = match &element {
                        TableElement::Column(column) => (
                            keys.primary.contains(&column.name),
                            keys.foreign.contains(&column.name),
                        ),
                        TableElement::Constraint(_) => (false, false),
                    };
                    let key = (self.priority)(&SortableEntry {
                        element: &element,
                        primary_key,
                        foreign_key,
                    });
                    (key, element)
                })
                .collect();
            keyed.sort_by(|a, b| a.0.cmp(&b.0));
            table.elements = keyed.into_iter().map(|(_, element)| element).collect();
            trace!(relation = %table.relation, "sorted table elements");
        }
    }
}
