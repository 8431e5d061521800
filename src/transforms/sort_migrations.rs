use tracing::trace;

use super::Transform;
use crate::ast::{Insert, InsertSource, RawStatement, Statement};
use crate::scanner::string_literal;

/// Orders the `VALUES` rows of `INSERT INTO schema_migrations` by version.
///
/// Rows are compared by the value of their first string literal. An insert
/// with any first column that is not a plain string literal is left alone.
pub struct SortSchemaMigrations;

const MIGRATIONS_TABLE: &str = "schema_migrations";

fn sort_rows(insert: &mut Insert) -> bool {
    if insert.relation.name != MIGRATIONS_TABLE {
        return false;
    }
    let InsertSource::Values(rows) = &mut insert.source else {
        return false;
    };
    let Some(keys) = rows
        .iter()
        .map(|row| row.first().and_then(|value| string_literal(value)))
        .collect::<Option<Vec<String>>>()
    else {
        trace!("schema_migrations rows are not plain string literals");
        return false;
    };

    let mut keyed: Vec<(String, Vec<String>)> = keys.into_iter().zip(rows.drain(..)).collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    rows.extend(keyed.into_iter().map(|(_, row)| row));
    true
}

impl Transform for SortSchemaMigrations {
    fn name(&self) -> &'static str {
        "sort_schema_migrations"
    }

    fn apply(&self, statements: &mut Vec<RawStatement>) {
        for raw in statements.iter_mut() {
            if let Statement::Insert(insert) = &mut raw.stmt
                && sort_rows(insert)
            {
                trace!(location = raw.location, "sorted schema_migrations rows");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transforms::test_support::{render, statements};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sorts_versions() {
        let mut stmts = statements(
            "INSERT INTO \"schema_migrations\" (version) VALUES\n('20240301'),\n('20230101'),\n('20240101');",
        );
        SortSchemaMigrations.apply(&mut stmts);
        assert_eq!(
            render(&stmts),
            vec!["INSERT INTO schema_migrations (version) VALUES ('20230101'), ('20240101'), ('20240301')"]
        );
    }

    #[test]
    fn test_sort_is_stable() {
        let mut stmts = statements(
            "INSERT INTO public.schema_migrations (version, note) VALUES ('2', 'b'), ('1', 'x'), ('2', 'a');",
        );
        SortSchemaMigrations.apply(&mut stmts);
        assert_eq!(
            render(&stmts),
            vec!["INSERT INTO public.schema_migrations (version, note) VALUES ('1', 'x'), ('2', 'b'), ('2', 'a')"]
        );
    }

    #[test]
    fn test_other_tables_and_shapes_untouched() {
        let sql = "INSERT INTO public.ar_internal_metadata (key) VALUES ('b'), ('a');
                   INSERT INTO schema_migrations (version) VALUES (2), (1);";
        let mut stmts = statements(sql);
        let before = render(&stmts);
        SortSchemaMigrations.apply(&mut stmts);
        assert_eq!(render(&stmts), before);
    }
}
