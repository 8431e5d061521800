use std::collections::BTreeSet;

use tracing::trace;

use super::{Transform, create_table_mut, remove_indices};
use crate::ast::{AlterTableCmd, AlterObjectType, RawStatement, RelationKey, Statement, TypeName};

/// Turns integer columns backed by their conventional sequence into
/// `smallserial`, `serial` or `bigserial`.
///
/// The default must read exactly `nextval('<schema>.<table>_<column>_seq'::regclass)`.
/// The `SET DEFAULT` statement and the sequence's own `CREATE SEQUENCE` and
/// `ALTER SEQUENCE` statements are removed. Custom sequence names are left
/// alone.
pub struct InlineSerials;

struct SerialDefault {
    index: usize,
    table: RelationKey,
    column: String,
    sequence: RelationKey,
}

fn serial_default(index: usize, stmt: &Statement) -> Option<SerialDefault> {
    let Statement::AlterTable(alter) = stmt else {
        return None;
    };
    if alter.object_type != AlterObjectType::Table {
        return None;
    }
    let AlterTableCmd::ColumnDefault {
        column,
        default: Some(expr),
    } = alter.single_command()?
    else {
        return None;
    };
    let sequence = alter
        .relation
        .sibling(format!("{}_{}_seq", alter.relation.name, column));
    let expected = format!("nextval('{}'::regclass)", sequence_text(&sequence));
    if *expr != expected {
        return None;
    }
    Some(SerialDefault {
        index,
        table: alter.relation.clone(),
        column: column.clone(),
        sequence,
    })
}

/// Spelling of a sequence name inside a `regclass` literal.
fn sequence_text(sequence: &RelationKey) -> String {
    match &sequence.schema {
        Some(schema) => format!("{}.{}", schema, sequence.name),
        None => sequence.name.clone(),
    }
}

fn sequence_relation(stmt: &Statement) -> Option<&RelationKey> {
    match stmt {
        Statement::CreateSequence(sequence) => Some(&sequence.relation),
        Statement::AlterSequence(sequence) => Some(&sequence.relation),
        _ => None,
    }
}

impl Transform for InlineSerials {
    fn name(&self) -> &'static str {
        "inline_serials"
    }

    fn apply(&self, statements: &mut Vec<RawStatement>) {
        let candidates: Vec<SerialDefault> = statements
            .iter()
            .enumerate()
            .filter_map(|(i, raw)| serial_default(i, &raw.stmt))
            .collect();

        let mut removed = BTreeSet::new();
        let mut sequences = BTreeSet::new();
        for serial in candidates {
            let Some(column) =
                create_table_mut(statements, &serial.table).and_then(|t| t.column_mut(&serial.column))
            else {
                continue;
            };
            let Some(width) = column.type_name.integer_width() else {
                continue;
            };
            column.type_name = TypeName::new(width.serial_type());
            removed.insert(serial.index);
            trace!(
                relation = %serial.table,
                column = %serial.column,
                "inlined serial column"
            );
            sequences.insert(serial.sequence);
        }

        for (index, raw) in statements.iter().enumerate() {
            if sequence_relation(&raw.stmt).is_some_and(|seq| sequences.contains(seq)) {
                removed.insert(index);
            }
        }
        remove_indices(statements, &removed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transforms::test_support::{render, statements};
    use pretty_assertions::assert_eq;

    const POSTS: &str = "
        CREATE TABLE public.posts (id bigint NOT NULL, title text);
        CREATE SEQUENCE public.posts_id_seq START WITH 1 INCREMENT BY 1 NO MINVALUE NO MAXVALUE CACHE 1;
        ALTER SEQUENCE public.posts_id_seq OWNED BY public.posts.id;
        ALTER TABLE ONLY public.posts ALTER COLUMN id SET DEFAULT nextval('public.posts_id_seq'::regclass);
    ";

    #[test]
    fn test_inlines_conventional_serial() {
        let mut stmts = statements(POSTS);
        InlineSerials.apply(&mut stmts);
        assert_eq!(
            render(&stmts),
            vec!["CREATE TABLE public.posts (id bigserial NOT NULL, title text)"]
        );
    }

    #[test]
    fn test_integer_widths() {
        let mut stmts = statements(
            "CREATE TABLE a (id integer NOT NULL, n smallint);
             ALTER TABLE a ALTER COLUMN id SET DEFAULT nextval('a_id_seq'::regclass);
             ALTER TABLE a ALTER COLUMN n SET DEFAULT nextval('a_n_seq'::regclass);",
        );
        InlineSerials.apply(&mut stmts);
        assert_eq!(
            render(&stmts),
            vec!["CREATE TABLE a (id serial NOT NULL, n smallserial)"]
        );
    }

    #[test]
    fn test_custom_sequence_names_untouched() {
        let sql = "
            CREATE TABLE public.posts (id bigint NOT NULL);
            CREATE SEQUENCE public.post_ids;
            ALTER TABLE ONLY public.posts ALTER COLUMN id SET DEFAULT nextval('public.post_ids'::regclass);
        ";
        let mut stmts = statements(sql);
        let before = render(&stmts);
        InlineSerials.apply(&mut stmts);
        assert_eq!(render(&stmts), before);
    }

    #[test]
    fn test_non_integer_column_untouched() {
        let sql = "
            CREATE TABLE public.posts (id numeric NOT NULL);
            CREATE SEQUENCE public.posts_id_seq;
            ALTER TABLE ONLY public.posts ALTER COLUMN id SET DEFAULT nextval('public.posts_id_seq'::regclass);
        ";
        let mut stmts = statements(sql);
        InlineSerials.apply(&mut stmts);
        assert_eq!(stmts.len(), 3);
    }
}
