use tracing::{trace, warn};

use super::{Transform, extract_grouped};
use crate::ast::{RawStatement, Statement};

/// Places every `CREATE INDEX` right after the statement that creates its
/// relation: unique indexes first, then by index name.
///
/// Indexes whose relation is not created anywhere in the dump are dropped.
pub struct MoveIndicesAfterCreateTable;

fn sort_key(raw: &RawStatement) -> (bool, Option<&str>) {
    match &raw.stmt {
        Statement::CreateIndex(index) => (!index.unique, index.name.as_deref()),
        _ => (true, None),
    }
}

impl Transform for MoveIndicesAfterCreateTable {
    fn name(&self) -> &'static str {
        "move_indices_after_create_table"
    }

    fn apply(&self, statements: &mut Vec<RawStatement>) {
        let groups = extract_grouped(statements, |stmt| match stmt {
            Statement::CreateIndex(index) => Some(index.relation.clone()),
            _ => None,
        });

        for (relation, mut indexes) in groups {
            let Some(owner) = statements
                .iter()
                .position(|raw| raw.stmt.created_relation() == Some(&relation))
            else {
                warn!(
                    relation = %relation,
                    count = indexes.len(),
                    "dropping indexes on a relation the dump never creates"
                );
                continue;
            };
            indexes.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));
            trace!(relation = %relation, count = indexes.len(), "moved indexes");
            statements.splice(owner + 1..owner + 1, indexes);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transforms::test_support::{render, statements};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_indexes_follow_their_table() {
        let mut stmts = statements(
            "CREATE TABLE public.posts (id bigint, slug text);
             CREATE TABLE public.users (id bigint, email text);
             CREATE INDEX index_users_on_id ON public.users USING btree (id);
             CREATE INDEX index_posts_on_slug ON public.posts USING btree (slug);
             CREATE UNIQUE INDEX index_users_on_email ON public.users USING btree (email);",
        );
        MoveIndicesAfterCreateTable.apply(&mut stmts);
        assert_eq!(
            render(&stmts),
            vec![
                "CREATE TABLE public.posts (id bigint, slug text)",
                "CREATE INDEX index_posts_on_slug ON public.posts USING btree (slug)",
                "CREATE TABLE public.users (id bigint, email text)",
                "CREATE UNIQUE INDEX index_users_on_email ON public.users USING btree (email)",
                "CREATE INDEX index_users_on_id ON public.users USING btree (id)",
            ]
        );
    }

    #[test]
    fn test_materialized_view_owns_indexes() {
        let mut stmts = statements(
            "CREATE INDEX index_stats ON public.stats USING btree (total);
             CREATE MATERIALIZED VIEW public.stats AS SELECT count(*) AS total FROM public.posts WITH NO DATA;",
        );
        MoveIndicesAfterCreateTable.apply(&mut stmts);
        assert_eq!(
            render(&stmts),
            vec![
                "CREATE MATERIALIZED VIEW public.stats AS SELECT count(*) AS total FROM public.posts WITH NO DATA",
                "CREATE INDEX index_stats ON public.stats USING btree (total)",
            ]
        );
    }

    #[test]
    fn test_orphan_indexes_are_dropped() {
        let mut stmts = statements(
            "SET a = 1;
             CREATE INDEX index_ghosts ON public.ghosts USING btree (id);",
        );
        MoveIndicesAfterCreateTable.apply(&mut stmts);
        assert_eq!(render(&stmts), vec!["SET a TO 1"]);
    }
}
