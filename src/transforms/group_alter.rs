use tracing::trace;

use super::{Transform, extract_grouped};
use crate::ast::{AlterObjectType, AlterTable, ConstraintKind, RawStatement, Statement, StatementKind};

/// Merges all remaining `ALTER TABLE` statements on one table into a
/// single statement.
///
/// Statements adding one single-column foreign key come first, ordered by
/// the referencing column, then everything else in dump order. The merged
/// statements go right after the last table, materialized view or index,
/// one per table in relation order.
pub struct GroupAlterTableStatements;

fn sort_key(raw: &RawStatement) -> (u8, &str) {
    let Statement::AlterTable(alter) = &raw.stmt else {
        return (2, "");
    };
    match alter.single_added_constraint().map(|c| &c.kind) {
        Some(ConstraintKind::ForeignKey { columns, .. }) if columns.len() == 1 => {
            (1, columns[0].as_str())
        }
        _ => (2, ""),
    }
}

fn merge(group: Vec<RawStatement>) -> Option<RawStatement> {
    let mut statements = group.into_iter();
    let mut merged = statements.next()?;
    let Statement::AlterTable(target) = &mut merged.stmt else {
        return None;
    };
    for raw in statements {
        if let Statement::AlterTable(AlterTable { commands, .. }) = raw.stmt {
            target.commands.extend(commands);
        }
    }
    Some(merged)
}

fn insert_position(statements: &[RawStatement]) -> usize {
    statements
        .iter()
        .rposition(|raw| {
            matches!(
                raw.stmt.kind(),
                StatementKind::CreateTable | StatementKind::CreateTableAs | StatementKind::CreateIndex
            )
        })
        .map_or(0, |i| i + 1)
}

impl Transform for GroupAlterTableStatements {
    fn name(&self) -> &'static str {
        "group_alter_table_statements"
    }

    fn apply(&self, statements: &mut Vec<RawStatement>) {
        let groups = extract_grouped(statements, |stmt| match stmt {
            Statement::AlterTable(alter) if alter.object_type == AlterObjectType::Table => {
                Some(alter.relation.clone())
            }
            _ => None,
        });
        if groups.is_empty() {
            return;
        }

        let mut merged = Vec::with_capacity(groups.len());
        for (relation, mut group) in groups {
            group.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));
            trace!(relation = %relation, count = group.len(), "grouped ALTER TABLE statements");
            merged.extend(merge(group));
        }

        let position = insert_position(statements);
        statements.splice(position..position, merged);
    }
}
