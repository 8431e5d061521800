use std::collections::BTreeSet;

use tracing::trace;

use super::{Transform, create_table_mut, remove_indices};
use crate::ast::{Constraint, RawStatement, RelationKey, Statement, TableElement};

/// Moves `ALTER TABLE ... ADD CONSTRAINT` for anything but foreign keys
/// into the element list of the owning table.
pub struct InlineConstraints;

fn added_constraint(stmt: &Statement) -> Option<(&RelationKey, &Constraint)> {
    let Statement::AlterTable(alter) = stmt else {
        return None;
    };
    let constraint = alter.single_added_constraint()?;
    if constraint.is_foreign_key() {
        return None;
    }
    Some((&alter.relation, constraint))
}

impl Transform for InlineConstraints {
    fn name(&self) -> &'static str {
        "inline_constraints"
    }

    fn apply(&self, statements: &mut Vec<RawStatement>) {
        let candidates: Vec<(usize, RelationKey, Constraint)> = statements
            .iter()
            .enumerate()
            .filter_map(|(i, raw)| {
                added_constraint(&raw.stmt)
                    .map(|(relation, constraint)| (i, relation.clone(), constraint.clone()))
            })
            .collect();

        let mut removed = BTreeSet::new();
        for (index, relation, constraint) in candidates {
            let Some(table) = create_table_mut(statements, &relation) else {
                continue;
            };
            trace!(relation = %relation, constraint = ?constraint.name, "inlined constraint");
            table.elements.push(TableElement::Constraint(constraint));
            removed.insert(index);
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
    fn test_inlines_unique_and_check() {
        let mut stmts = statements(
            "CREATE TABLE public.users (id bigint NOT NULL, email text);
             ALTER TABLE ONLY public.users ADD CONSTRAINT users_email_key UNIQUE (email);
             ALTER TABLE ONLY public.users ADD CONSTRAINT users_pkey PRIMARY KEY (id) DEFERRABLE;",
        );
        InlineConstraints.apply(&mut stmts);
        assert_eq!(
            render(&stmts),
            vec![
                "CREATE TABLE public.users (id bigint NOT NULL, email text, CONSTRAINT users_email_key UNIQUE (email), CONSTRAINT users_pkey PRIMARY KEY (id) DEFERRABLE)"
            ]
        );
    }

    #[test]
    fn test_foreign_keys_stay() {
        let mut stmts = statements(
            "CREATE TABLE public.comments (post_id bigint);
             ALTER TABLE ONLY public.comments ADD CONSTRAINT fk_posts FOREIGN KEY (post_id) REFERENCES public.posts(id);",
        );
        InlineConstraints.apply(&mut stmts);
        assert_eq!(stmts.len(), 2);
    }
}
