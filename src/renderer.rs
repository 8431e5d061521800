//! Final text of one statement.

use crate::ast::{RelationKey, Statement, TableAsObject};
use crate::deparser::ToSql;
use crate::error::FormatResult;
use crate::indenter::indent;

fn marker(relation: &RelationKey, object: &str) -> String {
    format!("-- Name: {}; Type: {};\n\n", relation.name, object)
}

/// Render a statement as its final block, ending with `;`.
pub fn render(stmt: &Statement) -> FormatResult<String> {
    let rendered = match stmt {
        Statement::CreateTable(table) => format!(
            "{}{};",
            marker(&table.relation, "TABLE"),
            indent(&table.to_sql())?
        ),
        Statement::View(view) => format!(
            "{}{};",
            marker(&view.relation, "VIEW"),
            indent(&view.to_sql())?
        ),
        Statement::CreateTableAs(table_as) => {
            let object = match table_as.object {
                TableAsObject::MaterializedView => "MATERIALIZED VIEW",
                TableAsObject::Table => "TABLE",
            };
            let mut body = table_as.clone();
            body.with_data = true;
            let mut rendered = marker(&table_as.relation, object);
            rendered.push_str(&indent(&body.to_sql())?);
            if !table_as.with_data {
                rendered.push_str("\nWITH NO DATA");
            }
            rendered.push(';');
            rendered
        }
        Statement::Insert(insert) => format!("{}\n;", indent(&insert.to_sql())?),
        Statement::CreateIndex(index) => format!("{};", index.to_sql()),
        other => format!("{};", indent(&other.to_sql())?),
    };
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_statement;
    use pretty_assertions::assert_eq;

    fn render_sql(sql: &str) -> String {
        render(&parse_statement(sql)).unwrap()
    }

    #[test]
    fn test_create_table_has_marker() {
        assert_eq!(
            render_sql("CREATE TABLE public.posts (id bigint NOT NULL, title text)"),
            "-- Name: posts; Type: TABLE;\n\nCREATE TABLE public.posts (\n    id bigint NOT NULL,\n    title text\n);"
        );
    }

    #[test]
    fn test_materialized_view_with_no_data() {
        assert_eq!(
            render_sql("CREATE MATERIALIZED VIEW public.stats AS SELECT count(*) AS total FROM public.posts WITH NO DATA"),
            "-- Name: stats; Type: MATERIALIZED VIEW;\n\nCREATE MATERIALIZED VIEW public.stats AS\n    SELECT count(*) AS total\n    FROM public.posts\nWITH NO DATA;"
        );
    }

    #[test]
    fn test_insert_ends_on_its_own_line() {
        assert_eq!(
            render_sql("INSERT INTO schema_migrations (version) VALUES ('1'), ('2')"),
            "INSERT INTO schema_migrations (version) VALUES\n  ('1')\n, ('2')\n;"
        );
    }

    #[test]
    fn test_index_stays_on_one_line() {
        assert_eq!(
            render_sql("CREATE INDEX index_posts_on_title ON public.posts USING btree (title) WHERE (title IS NOT NULL)"),
            "CREATE INDEX index_posts_on_title ON public.posts USING btree (title) WHERE (title IS NOT NULL);"
        );
    }

    #[test]
    fn test_set_and_select() {
        assert_eq!(
            render_sql("SET client_min_messages = warning"),
            "SET client_min_messages TO warning;"
        );
        assert_eq!(
            render_sql("SELECT pg_catalog.set_config('search_path', '', false)"),
            "SELECT pg_catalog.set_config('search_path', '', FALSE);"
        );
    }
}
