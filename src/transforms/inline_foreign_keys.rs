use std::collections::BTreeSet;

use tracing::trace;

use super::{Transform, create_table_mut, remove_indices};
use crate::ast::{Constraint, ConstraintKind, RawStatement, RelationKey, Statement};

/// Attaches single-column foreign keys to their column as
/// `REFERENCES t (c)`.
///
/// Tables can then reference tables defined later in the dump, so the
/// output no longer loads as-is. Not part of the default pipeline.
pub struct InlineForeignKeys;

fn foreign_key(stmt: &Statement) -> Option<(&RelationKey, String, Constraint)> {
    let Statement::AlterTable(alter) = stmt else {
        return None;
    };
    let constraint = alter.single_added_constraint()?;
    let ConstraintKind::ForeignKey {
        columns,
        references,
        ref_columns,
    } = &constraint.kind
    else {
        return None;
    };
    let [column] = columns.as_slice() else {
        return None;
    };
    let inline = Constraint {
        name: constraint.name.clone(),
        kind: ConstraintKind::ForeignKey {
            columns: Vec::new(),
            references: references.clone(),
            ref_columns: ref_columns.clone(),
        },
        attributes: constraint.attributes.clone(),
    };
    Some((&alter.relation, column.clone(), inline))
}

impl Transform for InlineForeignKeys {
    fn name(&self) -> &'static str {
        "inline_foreign_keys"
    }

    fn apply(&self, statements: &mut Vec<RawStatement>) {
        let candidates: Vec<(usize, RelationKey, String, Constraint)> = statements
            .iter()
            .enumerate()
            .filter_map(|(i, raw)| {
                foreign_key(&raw.stmt)
                    .map(|(relation, column, constraint)| (i, relation.clone(), column, constraint))
            })
            .collect();

        let mut removed = BTreeSet::new();
        for (index, relation, column_name, constraint) in candidates {
            let Some(column) =
                create_table_mut(statements, &relation).and_then(|t| t.column_mut(&column_name))
            else {
                continue;
            };
            column.constraints.push(constraint);
            removed.insert(index);
            trace!(relation = %relation, column = %column_name, "inlined foreign key");
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
    fn test_inlines_single_column_foreign_key() {
        let mut stmts = statements(
            "CREATE TABLE public.comments (id bigint NOT NULL, post_id bigint);
             ALTER TABLE ONLY public.comments ADD CONSTRAINT fk_rails_1 FOREIGN KEY (post_id) REFERENCES public.posts(id) ON DELETE CASCADE;",
        );
        InlineForeignKeys.apply(&mut stmts);
        assert_eq!(
            render(&stmts),
            vec![
                "CREATE TABLE public.comments (id bigint NOT NULL, post_id bigint CONSTRAINT fk_rails_1 REFERENCES public.posts (id) ON DELETE CASCADE)"
            ]
        );
    }

    #[test]
    fn test_composite_foreign_keys_stay() {
        let mut stmts = statements(
            "CREATE TABLE t (a integer, b integer);
             ALTER TABLE t ADD CONSTRAINT t_fk FOREIGN KEY (a, b) REFERENCES u(a, b);",
        );
        InlineForeignKeys.apply(&mut stmts);
        assert_eq!(stmts.len(), 2);
    }
}
