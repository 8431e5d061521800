//! Statement grammar.
//!
//! Every parser here must consume its statement completely; anything it
//! cannot account for makes it fail so the caller keeps the statement as
//! opaque text.

use nom::{
    branch::alt,
    character::complete::{char, digit0, digit1, one_of},
    combinator::{map, opt, peek, recognize, value},
    multi::{many0, many1, separated_list0, separated_list1},
    sequence::{delimited, pair, preceded, tuple},
};

use super::*;
use crate::deparser::quote_ident;

/// Words that end a column type or a column default.
const COLUMN_CONSTRAINT_WORDS: &[&str] = &[
    "CONSTRAINT",
    "NOT",
    "NULL",
    "DEFAULT",
    "CHECK",
    "UNIQUE",
    "PRIMARY",
    "REFERENCES",
    "GENERATED",
    "COLLATE",
    "DEFERRABLE",
    "INITIALLY",
];

/// Like [`COLUMN_CONSTRAINT_WORDS`], minus `DEFAULT` which appears inside
/// `GENERATED BY DEFAULT AS IDENTITY`.
const GENERATED_STOP_WORDS: &[&str] = &[
    "CONSTRAINT",
    "NOT",
    "NULL",
    "CHECK",
    "UNIQUE",
    "PRIMARY",
    "REFERENCES",
    "COLLATE",
];

pub(super) fn statement(input: &str) -> PResult<'_, Statement> {
    alt((
        create_table_as,
        create_table,
        create_materialized_view,
        create_view,
        create_index,
        create_sequence,
        alter_sequence,
        alter_table,
        insert,
        select,
        comment_on,
        variable_set,
    ))(input)
}

fn if_not_exists(input: &str) -> PResult<'_, bool> {
    flag(kws(&["IF", "NOT", "EXISTS"]))(input)
}

fn if_exists(input: &str) -> PResult<'_, bool> {
    flag(kws(&["IF", "EXISTS"]))(input)
}

fn persistence(input: &str) -> PResult<'_, Option<String>> {
    opt(map(
        alt((kw("UNLOGGED"), kw("TEMPORARY"), kw("TEMP"))),
        |word: &str| word.to_uppercase(),
    ))(input)
}

// CREATE TABLE

fn create_table(input: &str) -> PResult<'_, Statement> {
    let (input, _) = kw("CREATE")(input)?;
    let (input, persistence) = persistence(input)?;
    let (input, _) = kw("TABLE")(input)?;
    let (input, if_not_exists) = if_not_exists(input)?;
    let (input, relation) = qualified_name(input)?;
    let (input, _) = symbol('(')(input)?;
    let (input, elements) = separated_list0(symbol(','), table_element)(input)?;
    let (input, _) = symbol(')')(input)?;
    let (input, tail) = opt(fragment(false, &[]))(input)?;
    let (input, _) = end(input)?;

    Ok((
        input,
        Statement::CreateTable(CreateTable {
            persistence,
            if_not_exists,
            relation,
            elements,
            tail: tail.map(normalize),
        }),
    ))
}

fn table_element(input: &str) -> PResult<'_, TableElement> {
    alt((
        map(table_constraint, TableElement::Constraint),
        map(column_def, TableElement::Column),
    ))(input)
}

fn column_def(input: &str) -> PResult<'_, ColumnDef> {
    let (input, name) = ident(input)?;
    let (input, type_text) = fragment(true, COLUMN_CONSTRAINT_WORDS)(input)?;
    let (input, constraints) = many0(column_constraint)(input)?;

    Ok((
        input,
        ColumnDef {
            name,
            type_name: TypeName::new(type_text),
            constraints,
        },
    ))
}

fn constraint_name(input: &str) -> PResult<'_, Option<String>> {
    opt(preceded(kw("CONSTRAINT"), ident))(input)
}

fn nulls_not_distinct(input: &str) -> PResult<'_, bool> {
    flag(kws(&["NULLS", "NOT", "DISTINCT"]))(input)
}

/// `PRIMARY KEY (...)`, `UNIQUE (...)`, `FOREIGN KEY (...) REFERENCES ...`,
/// `CHECK (...)` or `EXCLUDE ...`, followed by free-form attributes.
fn table_constraint(input: &str) -> PResult<'_, Constraint> {
    let (input, name) = constraint_name(input)?;
    let (input, kind) = alt((
        map(preceded(kws(&["PRIMARY", "KEY"]), ident_list), |columns| {
            ConstraintKind::PrimaryKey { columns }
        }),
        map(
            preceded(kw("UNIQUE"), pair(nulls_not_distinct, ident_list)),
            |(nulls_not_distinct, columns)| ConstraintKind::Unique {
                columns,
                nulls_not_distinct,
            },
        ),
        map(
            tuple((
                kws(&["FOREIGN", "KEY"]),
                ident_list,
                kw("REFERENCES"),
                qualified_name,
                opt(ident_list),
            )),
            |(_, columns, _, references, ref_columns)| ConstraintKind::ForeignKey {
                columns,
                references,
                ref_columns: ref_columns.unwrap_or_default(),
            },
        ),
        map(preceded(kw("CHECK"), parenthesized), |expr| {
            ConstraintKind::Check {
                expr: normalize(expr),
            }
        }),
        map(recognize(pair(kw("EXCLUDE"), fragment(true, &[]))), |text| {
            ConstraintKind::Other {
                text: normalize(text),
            }
        }),
    ))(input)?;
    let (input, attributes) = opt(fragment(true, &[]))(input)?;

    Ok((
        input,
        Constraint {
            name,
            kind,
            attributes: attributes.map(normalize),
        },
    ))
}

fn column_constraint(input: &str) -> PResult<'_, Constraint> {
    let (input, name) = constraint_name(input)?;
    let (input, kind) = alt((
        value(ConstraintKind::NotNull, kws(&["NOT", "NULL"])),
        value(ConstraintKind::Null, kw("NULL")),
        map(
            preceded(kw("DEFAULT"), fragment(true, COLUMN_CONSTRAINT_WORDS)),
            |expr| ConstraintKind::Default {
                expr: normalize(expr),
            },
        ),
        map(preceded(kw("CHECK"), parenthesized), |expr| {
            ConstraintKind::Check {
                expr: normalize(expr),
            }
        }),
        map(preceded(kw("UNIQUE"), nulls_not_distinct), |nulls_not_distinct| {
            ConstraintKind::Unique {
                columns: Vec::new(),
                nulls_not_distinct,
            }
        }),
        value(
            ConstraintKind::PrimaryKey {
                columns: Vec::new(),
            },
            kws(&["PRIMARY", "KEY"]),
        ),
        map(
            preceded(kw("REFERENCES"), pair(qualified_name, opt(ident_list))),
            |(references, ref_columns)| ConstraintKind::ForeignKey {
                columns: Vec::new(),
                references,
                ref_columns: ref_columns.unwrap_or_default(),
            },
        ),
        map(
            recognize(pair(kw("GENERATED"), fragment(true, GENERATED_STOP_WORDS))),
            |text| ConstraintKind::Generated {
                text: normalize(text),
            },
        ),
        map(
            preceded(kw("COLLATE"), fragment(true, COLUMN_CONSTRAINT_WORDS)),
            |collation| ConstraintKind::Collate {
                collation: normalize(collation),
            },
        ),
    ))(input)?;
    let (input, attributes) = opt(recognize(many1(constraint_attribute)))(input)?;

    Ok((
        input,
        Constraint {
            name,
            kind,
            attributes: attributes.map(normalize),
        },
    ))
}

fn referential_action(input: &str) -> PResult<'_, ()> {
    let (input, _) = alt((
        kws(&["NO", "ACTION"]),
        kws(&["SET", "NULL"]),
        kws(&["SET", "DEFAULT"]),
        value((), kw("RESTRICT")),
        value((), kw("CASCADE")),
    ))(input)?;
    let (input, _) = opt(ident_list)(input)?;
    Ok((input, ()))
}

/// Referential actions, match type, deferrability and inheritance flags.
fn constraint_attribute(input: &str) -> PResult<'_, ()> {
    alt((
        value(
            (),
            tuple((
                kw("ON"),
                alt((kw("DELETE"), kw("UPDATE"))),
                referential_action,
            )),
        ),
        value(
            (),
            pair(
                kw("MATCH"),
                alt((kw("FULL"), kw("PARTIAL"), kw("SIMPLE"))),
            ),
        ),
        value((), pair(opt(kw("NOT")), kw("DEFERRABLE"))),
        value(
            (),
            pair(kw("INITIALLY"), alt((kw("DEFERRED"), kw("IMMEDIATE")))),
        ),
        kws(&["NO", "INHERIT"]),
        kws(&["NOT", "VALID"]),
    ))(input)
}

// ALTER TABLE

fn alter_table(input: &str) -> PResult<'_, Statement> {
    let (input, _) = kw("ALTER")(input)?;
    let (input, object_type) = alt((
        value(AlterObjectType::Table, kw("TABLE")),
        value(AlterObjectType::ForeignTable, kws(&["FOREIGN", "TABLE"])),
        value(AlterObjectType::Index, kw("INDEX")),
        value(
            AlterObjectType::MaterializedView,
            kws(&["MATERIALIZED", "VIEW"]),
        ),
        value(AlterObjectType::View, kw("VIEW")),
    ))(input)?;
    let (input, if_exists) = if_exists(input)?;
    let (input, only) = flag(kw("ONLY"))(input)?;
    let (input, relation) = qualified_name(input)?;
    let (input, commands) = separated_list1(symbol(','), alter_table_cmd)(input)?;
    let (input, _) = end(input)?;

    Ok((
        input,
        Statement::AlterTable(AlterTable {
            object_type,
            if_exists,
            only,
            relation,
            commands,
        }),
    ))
}

fn alter_table_cmd(input: &str) -> PResult<'_, AlterTableCmd> {
    alt((
        map(preceded(kw("ADD"), table_constraint), AlterTableCmd::AddConstraint),
        column_default,
        alter_column_type,
        map(fragment(true, &[]), |text| AlterTableCmd::Other {
            text: normalize(text),
        }),
    ))(input)
}

fn alter_column(input: &str) -> PResult<'_, String> {
    preceded(pair(kw("ALTER"), opt(kw("COLUMN"))), ident)(input)
}

fn column_default(input: &str) -> PResult<'_, AlterTableCmd> {
    let (input, column) = alter_column(input)?;
    let (input, default) = alt((
        map(
            preceded(kws(&["SET", "DEFAULT"]), fragment(true, &[])),
            |expr| Some(normalize(expr)),
        ),
        value(None, kws(&["DROP", "DEFAULT"])),
    ))(input)?;
    Ok((input, AlterTableCmd::ColumnDefault { column, default }))
}

fn alter_column_type(input: &str) -> PResult<'_, AlterTableCmd> {
    let (input, column) = alter_column(input)?;
    let (input, _) = opt(kws(&["SET", "DATA"]))(input)?;
    let (input, _) = kw("TYPE")(input)?;
    let (input, type_text) = fragment(true, &["USING"])(input)?;
    let (input, using) = opt(preceded(kw("USING"), fragment(true, &[])))(input)?;
    Ok((
        input,
        AlterTableCmd::AlterColumnType {
            column,
            type_name: TypeName::new(type_text),
            using: using.map(normalize),
        },
    ))
}

// CREATE INDEX

fn create_index(input: &str) -> PResult<'_, Statement> {
    let (input, _) = kw("CREATE")(input)?;
    let (input, unique) = flag(kw("UNIQUE"))(input)?;
    let (input, _) = kw("INDEX")(input)?;
    let (input, concurrently) = flag(kw("CONCURRENTLY"))(input)?;
    let (input, if_not_exists) = if_not_exists(input)?;
    let (input, name) = opt(ident)(input)?;
    let (input, _) = kw("ON")(input)?;
    let (input, only) = flag(kw("ONLY"))(input)?;
    let (input, relation) = qualified_name(input)?;
    let (input, method) = opt(preceded(kw("USING"), ident))(input)?;
    let (input, definition) = fragment(false, &[])(input)?;
    let (input, _) = end(input)?;

    Ok((
        input,
        Statement::CreateIndex(CreateIndex {
            unique,
            concurrently,
            if_not_exists,
            name,
            only,
            relation,
            method,
            definition: normalize(definition),
        }),
    ))
}

// SEQUENCES

fn create_sequence(input: &str) -> PResult<'_, Statement> {
    let (input, _) = kw("CREATE")(input)?;
    let (input, _) = kw("SEQUENCE")(input)?;
    let (input, if_not_exists) = if_not_exists(input)?;
    let (input, relation) = qualified_name(input)?;
    let (input, options) = opt(fragment(false, &[]))(input)?;
    let (input, _) = end(input)?;

    Ok((
        input,
        Statement::CreateSequence(CreateSequence {
            if_not_exists,
            relation,
            options: options.map(normalize),
        }),
    ))
}

fn alter_sequence(input: &str) -> PResult<'_, Statement> {
    let (input, _) = kws(&["ALTER", "SEQUENCE"])(input)?;
    let (input, if_exists) = if_exists(input)?;
    let (input, relation) = qualified_name(input)?;
    let (input, rest) = fragment(false, &[])(input)?;
    let (input, _) = end(input)?;

    Ok((
        input,
        Statement::AlterSequence(AlterSequence {
            if_exists,
            relation,
            rest: normalize(rest),
        }),
    ))
}

// INSERT / SELECT

fn value_row(input: &str) -> PResult<'_, Vec<String>> {
    delimited(
        symbol('('),
        separated_list1(symbol(','), map(fragment(true, &[]), normalize)),
        symbol(')'),
    )(input)
}

fn insert(input: &str) -> PResult<'_, Statement> {
    let (input, _) = kws(&["INSERT", "INTO"])(input)?;
    let (input, relation) = qualified_name(input)?;
    let (input, columns) = opt(ident_list)(input)?;
    let (input, (source, tail)) = alt((
        map(kws(&["DEFAULT", "VALUES"]), |_| (InsertSource::DefaultValues, None)),
        map(
            pair(
                preceded(kw("VALUES"), separated_list1(symbol(','), value_row)),
                opt(fragment(false, &[])),
            ),
            |(rows, tail)| (InsertSource::Values(rows), tail.map(normalize)),
        ),
        map(fragment(false, &[]), |query| {
            (InsertSource::Query(normalize(query)), None)
        }),
    ))(input)?;
    let (input, _) = end(input)?;

    Ok((
        input,
        Statement::Insert(Insert {
            relation,
            columns: columns.unwrap_or_default(),
            source,
            tail,
        }),
    ))
}

fn select(input: &str) -> PResult<'_, Statement> {
    let (input, _) = peek(alt((kw("SELECT"), kw("WITH"), kw("VALUES"))))(input)?;
    let (input, query) = fragment(false, &[])(input)?;
    let (input, _) = end(input)?;
    Ok((
        input,
        Statement::Select(Select {
            query: normalize(query),
        }),
    ))
}

// VIEWS

/// A view or table-as query, up to a top-level `WITH` clause.
fn query(input: &str) -> PResult<'_, String> {
    map(fragment(false, &["WITH"]), |text| {
        strip_outer_parens(normalize(text))
    })(input)
}

fn create_view(input: &str) -> PResult<'_, Statement> {
    let (input, _) = kw("CREATE")(input)?;
    let (input, or_replace) = flag(kws(&["OR", "REPLACE"]))(input)?;
    let (input, temporary) = flag(alt((kw("TEMPORARY"), kw("TEMP"))))(input)?;
    let (input, recursive) = flag(kw("RECURSIVE"))(input)?;
    let (input, _) = kw("VIEW")(input)?;
    let (input, relation) = qualified_name(input)?;
    let (input, columns) = opt(ident_list)(input)?;
    let (input, options) = opt(recognize(preceded(kw("WITH"), parenthesized)))(input)?;
    let (input, _) = kw("AS")(input)?;
    let (input, query) = query(input)?;
    let (input, check_option) = opt(recognize(tuple((
        kw("WITH"),
        opt(alt((kw("CASCADED"), kw("LOCAL")))),
        kws(&["CHECK", "OPTION"]),
    ))))(input)?;
    let (input, _) = end(input)?;

    Ok((
        input,
        Statement::View(View {
            or_replace,
            temporary,
            recursive,
            relation,
            columns: columns.unwrap_or_default(),
            options: options.map(normalize),
            query,
            check_option: check_option.map(normalize),
        }),
    ))
}

/// `USING method`, `WITH (...)` and `TABLESPACE name` clauses.
fn storage_options(input: &str) -> PResult<'_, Option<String>> {
    map(
        opt(recognize(many1(alt((
            value((), pair(kw("USING"), ident)),
            value((), pair(kw("WITH"), parenthesized)),
            value((), pair(kw("TABLESPACE"), ident)),
        ))))),
        |options| options.map(normalize),
    )(input)
}

fn with_data(input: &str) -> PResult<'_, bool> {
    map(
        opt(alt((
            value(false, kws(&["WITH", "NO", "DATA"])),
            value(true, kws(&["WITH", "DATA"])),
        ))),
        |with_data| with_data.unwrap_or(true),
    )(input)
}

fn create_materialized_view(input: &str) -> PResult<'_, Statement> {
    let (input, _) = kws(&["CREATE", "MATERIALIZED", "VIEW"])(input)?;
    let (input, if_not_exists) = if_not_exists(input)?;
    let (input, relation) = qualified_name(input)?;
    let (input, columns) = opt(ident_list)(input)?;
    let (input, options) = storage_options(input)?;
    let (input, _) = kw("AS")(input)?;
    let (input, query) = query(input)?;
    let (input, with_data) = with_data(input)?;
    let (input, _) = end(input)?;

    Ok((
        input,
        Statement::CreateTableAs(CreateTableAs {
            object: TableAsObject::MaterializedView,
            persistence: None,
            if_not_exists,
            relation,
            columns: columns.unwrap_or_default(),
            options,
            query,
            with_data,
        }),
    ))
}

fn create_table_as(input: &str) -> PResult<'_, Statement> {
    let (input, _) = kw("CREATE")(input)?;
    let (input, persistence) = persistence(input)?;
    let (input, _) = kw("TABLE")(input)?;
    let (input, if_not_exists) = if_not_exists(input)?;
    let (input, relation) = qualified_name(input)?;
    let (input, columns) = opt(ident_list)(input)?;
    let (input, options) = storage_options(input)?;
    let (input, _) = kw("AS")(input)?;
    let (input, query) = query(input)?;
    let (input, with_data) = with_data(input)?;
    let (input, _) = end(input)?;

    Ok((
        input,
        Statement::CreateTableAs(CreateTableAs {
            object: TableAsObject::Table,
            persistence,
            if_not_exists,
            relation,
            columns: columns.unwrap_or_default(),
            options,
            query,
            with_data,
        }),
    ))
}

// COMMENT ON

fn comment_object(input: &str) -> PResult<'_, CommentObject> {
    alt((
        value(CommentObject::Extension, kw("EXTENSION")),
        value(CommentObject::Table, kw("TABLE")),
        value(CommentObject::Column, kw("COLUMN")),
        value(CommentObject::Index, kw("INDEX")),
        value(
            CommentObject::MaterializedView,
            kws(&["MATERIALIZED", "VIEW"]),
        ),
        value(CommentObject::View, kw("VIEW")),
        value(CommentObject::Schema, kw("SCHEMA")),
        map(word, |w| CommentObject::Other(w.to_lowercase())),
    ))(input)
}

fn comment_on(input: &str) -> PResult<'_, Statement> {
    let (input, _) = kws(&["COMMENT", "ON"])(input)?;
    let (input, object) = comment_object(input)?;
    let (input, rest) = fragment(false, &[])(input)?;
    let (input, _) = end(input)?;

    Ok((
        input,
        Statement::CommentOn(CommentOn {
            object,
            rest: normalize(rest),
        }),
    ))
}

// SET

fn setting_name(input: &str) -> PResult<'_, String> {
    let (input, name) = recognize(separated_list1(char('.'), word))(input)?;
    Ok((input, name.trim().to_lowercase()))
}

fn number(input: &str) -> PResult<'_, SetValue> {
    let (rest, text) = recognize(tuple((
        opt(one_of("+-")),
        digit1,
        opt(pair(char('.'), digit0)),
        opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
    )))(input)?;
    if rest.starts_with(is_word_char) {
        return fail(input);
    }
    let (rest, _) = sp(rest)?;
    let parsed = match text.parse::<i64>() {
        Ok(n) => SetValue::Integer(n),
        Err(_) => SetValue::Numeric(text.to_string()),
    };
    Ok((rest, parsed))
}

fn ident_quoted(input: &str) -> PResult<'_, String> {
    let (input, name) = quoted_ident(input)?;
    let (input, _) = sp(input)?;
    Ok((input, name))
}

fn set_value(input: &str) -> PResult<'_, SetValue> {
    alt((
        value(SetValue::Default, kw("DEFAULT")),
        map(string_literal, SetValue::Str),
        number,
        map(ident_quoted, |name| SetValue::Word(quote_ident(&name))),
        map(word, |w| SetValue::Word(w.to_lowercase())),
    ))(input)
}

fn variable_set(input: &str) -> PResult<'_, Statement> {
    let (input, _) = kw("SET")(input)?;
    let (input, scope) = opt(alt((
        value(SetScope::Session, kw("SESSION")),
        value(SetScope::Local, kw("LOCAL")),
    )))(input)?;
    let (input, name) = setting_name(input)?;
    let (input, _) = alt((map(kw("TO"), |_| ()), map(symbol('='), |_| ())))(input)?;
    let (input, args) = separated_list1(symbol(','), set_value)(input)?;
    let (input, _) = end(input)?;

    Ok((
        input,
        Statement::VariableSet(VariableSet { scope, name, args }),
    ))
}
