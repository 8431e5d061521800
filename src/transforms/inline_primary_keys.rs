use std::collections::BTreeSet;

use tracing::trace;

use super::{Transform, create_table_mut, remove_indices};
use crate::ast::{Constraint, ConstraintKind, RawStatement, RelationKey, Statement};

/// Folds `ALTER TABLE ... ADD CONSTRAINT ... PRIMARY KEY (col)` into the
/// column definition of the owning table.
///
/// The column drops its `NOT NULL` and gains a `PRIMARY KEY` marker.
/// Composite keys and keys with attributes stay where they are.
pub struct InlinePrimaryKeys;

fn primary_key_column(stmt: &Statement) -> Option<(&RelationKey, &str)> {
    let Statement::AlterTable(alter) = stmt else {
        return None;
    };
    let constraint = alter.single_added_constraint()?;
    if constraint.attributes.is_some() {
        return None;
    }
    let ConstraintKind::PrimaryKey { columns } = &constraint.kind else {
        return None;
    };
    match columns.as_slice() {
        [column] => Some((&alter.relation, column.as_str())),
        _ => None,
    }
}

impl Transform for InlinePrimaryKeys {
    fn name(&self) -> &'static str {
        "inline_primary_keys"
    }

    fn apply(&self, statements: &mut Vec<RawStatement>) {
        let candidates: Vec<(usize, RelationKey, String)> = statements
            .iter()
            .enumerate()
            .filter_map(|(i, raw)| {
                primary_key_column(&raw.stmt)
                    .map(|(relation, column)| (i, relation.clone(), column.to_string()))
            })
            .collect();

        let mut removed = BTreeSet::new();
        for (index, relation, column_name) in candidates {
            let Some(column) =
                create_table_mut(statements, &relation).and_then(|t| t.column_mut(&column_name))
            else {
                continue;
            };
            column.constraints.retain(|c| !c.is_not_null());
            column.constraints.push(Constraint::primary_key_marker());
            removed.insert(index);
            trace!(relation = %relation, column = %column_name, "inlined primary key");
        }
        remove_indices(statements, &removed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transforms::test_support::{render, statements};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_inlines_single_column_key() {
        let mut stmts = statements(
            "CREATE TABLE t (id bigint NOT NULL, name text);
             ALTER TABLE ONLY t ADD CONSTRAINT t_pkey PRIMARY KEY (id);",
        );
        InlinePrimaryKeys.apply(&mut stmts);
        assert_eq!(
            render(&stmts),
            vec!["CREATE TABLE t (id bigint PRIMARY KEY, name text)"]
        );
    }

    #[test]
    fn test_leaves_composite_and_orphan_keys() {
        let sql = "CREATE TABLE t (a integer NOT NULL, b integer NOT NULL);
                   ALTER TABLE ONLY t ADD CONSTRAINT t_pkey PRIMARY KEY (a, b);
                   ALTER TABLE ONLY public.missing ADD CONSTRAINT missing_pkey PRIMARY KEY (id);
                   ALTER TABLE ONLY t ADD CONSTRAINT t_c_pkey PRIMARY KEY (c);";
        let mut stmts = statements(sql);
        let before = render(&stmts);
        InlinePrimaryKeys.apply(&mut stmts);
        assert_eq!(render(&stmts), before);
    }

    #[test]
    fn test_relation_keys_must_match_exactly() {
        let mut stmts = statements(
            "CREATE TABLE public.t (id bigint NOT NULL);
             ALTER TABLE ONLY t ADD CONSTRAINT t_pkey PRIMARY KEY (id);",
        );
        InlinePrimaryKeys.apply(&mut stmts);
        assert_eq!(stmts.len(), 2);
    }
}
