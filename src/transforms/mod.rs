//! Statement list rewrites.
//!
//! Each transform takes the whole statement list and may delete entries,
//! insert entries at computed positions or mutate survivors. Transforms
//! run strictly in configured order. A statement whose shape does not
//! match what a transform looks for is left alone.

mod group_alter;
mod inline_constraints;
mod inline_foreign_keys;
mod inline_primary_keys;
mod inline_serials;
mod move_indices;
mod remove_comments;
mod remove_defaults;
mod sort_columns;
mod sort_migrations;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub use self::group_alter::GroupAlterTableStatements;
pub use self::inline_constraints::InlineConstraints;
pub use self::inline_foreign_keys::InlineForeignKeys;
pub use self::inline_primary_keys::InlinePrimaryKeys;
pub use self::inline_serials::InlineSerials;
pub use self::move_indices::MoveIndicesAfterCreateTable;
pub use self::remove_comments::RemoveCommentsOnExtensions;
pub use self::remove_defaults::RemoveDefaultsSetCommands;
pub use self::sort_columns::{PriorityMapping, SortTableColumns, SortableEntry, default_priority};
pub use self::sort_migrations::SortSchemaMigrations;

use crate::ast::{CreateTable, RawStatement, RelationKey, Statement};
use crate::config::Config;
use crate::error::FormatError;

/// A rewrite over the full statement list.
pub trait Transform {
    /// Configuration name of the transform.
    fn name(&self) -> &'static str;

    /// Rewrite `statements` in place.
    fn apply(&self, statements: &mut Vec<RawStatement>);
}

/// Run transforms in order over one statement list.
pub fn run(transforms: &[Box<dyn Transform>], statements: &mut Vec<RawStatement>) {
    for transform in transforms {
        let before = statements.len();
        transform.apply(statements);
        debug!(
            transform = transform.name(),
            before,
            after = statements.len(),
            "applied transform"
        );
    }
}

/// Ordered transform list.
pub struct Pipeline {
    transforms: Vec<Box<dyn Transform>>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl Pipeline {
    /// Create an empty pipeline
    pub fn new() -> Self {
        Self {
            transforms: Vec::new(),
        }
    }

    /// Build the transforms a configuration enables, in its order.
    pub fn from_config(config: &Config) -> Self {
        let mut pipeline = Self::new();
        for kind in &config.transforms {
            pipeline.register(kind.build(config));
        }
        pipeline
    }

    /// Append a transform
    pub fn register(&mut self, transform: Box<dyn Transform>) {
        self.transforms.push(transform);
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.transforms.iter().map(|t| t.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Run every transform over `statements`.
    pub fn run(&self, statements: &mut Vec<RawStatement>) {
        run(&self.transforms, statements);
    }
}

macro_rules! transform_kinds {
    ($($variant:ident => $name:literal,)*) => {
        /// Every known transform, by configuration name.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
        #[serde(rename_all = "snake_case")]
        pub enum TransformKind {
            $($variant),*
        }

        impl TransformKind {
            /// All transforms, in recommended order.
            pub const ALL: &'static [TransformKind] = &[$(TransformKind::$variant),*];

            pub fn as_str(self) -> &'static str {
                match self {
                    $(TransformKind::$variant => $name),*
                }
            }
        }

        impl FromStr for TransformKind {
            type Err = FormatError;

            fn from_str(s: &str) -> Result<Self, FormatError> {
                match s.trim() {
                    $($name => Ok(TransformKind::$variant),)*
                    other => Err(FormatError::config(format!("unknown transform '{}'", other))),
                }
            }
        }
    };
}

transform_kinds! {
    RemoveCommentsOnExtensions => "remove_comments_on_extensions",
    RemoveDefaultsSetCommands => "remove_defaults_set_commands",
    SortSchemaMigrations => "sort_schema_migrations",
    InlinePrimaryKeys => "inline_primary_keys",
    InlineForeignKeys => "inline_foreign_keys",
    InlineSerials => "inline_serials",
    InlineConstraints => "inline_constraints",
    MoveIndicesAfterCreateTable => "move_indices_after_create_table",
    GroupAlterTableStatements => "group_alter_table_statements",
    SortTableColumns => "sort_table_columns",
}

impl TransformKind {
    /// The default pipeline. `inline_foreign_keys` produces dumps with
    /// forward references, so it only runs when asked for.
    pub const DEFAULT: &'static [TransformKind] = &[
        TransformKind::RemoveCommentsOnExtensions,
        TransformKind::RemoveDefaultsSetCommands,
        TransformKind::SortSchemaMigrations,
        TransformKind::InlinePrimaryKeys,
        TransformKind::InlineSerials,
        TransformKind::InlineConstraints,
        TransformKind::MoveIndicesAfterCreateTable,
        TransformKind::GroupAlterTableStatements,
        TransformKind::SortTableColumns,
    ];

    pub fn is_default(self) -> bool {
        Self::DEFAULT.contains(&self)
    }

    /// Instantiate the transform.
    pub fn build(self, config: &Config) -> Box<dyn Transform> {
        match self {
            TransformKind::RemoveCommentsOnExtensions => Box::new(RemoveCommentsOnExtensions),
            TransformKind::RemoveDefaultsSetCommands => Box::new(RemoveDefaultsSetCommands::new(
                config.postgres_config_defaults.clone(),
            )),
            TransformKind::SortSchemaMigrations => Box::new(SortSchemaMigrations),
            TransformKind::InlinePrimaryKeys => Box::new(InlinePrimaryKeys),
            TransformKind::InlineForeignKeys => Box::new(InlineForeignKeys),
            TransformKind::InlineSerials => Box::new(InlineSerials),
            TransformKind::InlineConstraints => Box::new(InlineConstraints),
            TransformKind::MoveIndicesAfterCreateTable => Box::new(MoveIndicesAfterCreateTable),
            TransformKind::GroupAlterTableStatements => Box::new(GroupAlterTableStatements),
            TransformKind::SortTableColumns => Box::new(SortTableColumns::new()),
        }
    }
}

impl fmt::Display for TransformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a comma-separated transform list, e.g. from the command line.
pub fn parse_list(list: &str) -> Result<Vec<TransformKind>, FormatError> {
    list.split(',')
        .filter(|name| !name.trim().is_empty())
        .map(|name| name.parse::<TransformKind>())
        .collect()
}

/// The `CREATE TABLE` statement for `relation`.
pub(crate) fn create_table_mut<'a>(
    statements: &'a mut [RawStatement],
    relation: &RelationKey,
) -> Option<&'a mut CreateTable> {
    statements.iter_mut().find_map(|raw| match &mut raw.stmt {
        Statement::CreateTable(table) if &table.relation == relation => Some(table),
        _ => None,
    })
}

/// Drop the statements at `indices`, keeping the order of the rest.
pub(crate) fn remove_indices(statements: &mut Vec<RawStatement>, indices: &BTreeSet<usize>) {
    if indices.is_empty() {
        return;
    }
    let mut index = 0;
    statements.retain(|_| {
        let keep = !indices.contains(&index);
        index += 1;
        keep
    });
}

/// Move the statements matching `extract` out of the list, grouped by key.
pub(crate) fn extract_grouped<K: Ord>(
    statements: &mut Vec<RawStatement>,
    mut extract: impl FnMut(&Statement) -> Option<K>,
) -> BTreeMap<K, Vec<RawStatement>> {
    let mut groups: BTreeMap<K, Vec<RawStatement>> = BTreeMap::new();
    let mut rest = Vec::with_capacity(statements.len());
    for raw in statements.drain(..) {
        match extract(&raw.stmt) {
            Some(key) => groups.entry(key).or_default().push(raw),
            None => rest.push(raw),
        }
    }
    *statements = rest;
    groups
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::ast::RawStatement;
    use crate::deparser::ToSql;
    use crate::parser::parse;

    pub fn statements(sql: &str) -> Vec<RawStatement> {
        parse(sql).unwrap()
    }

    pub fn render(statements: &[RawStatement]) -> Vec<String> {
        statements.iter().map(|raw| raw.stmt.to_sql()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_kind_names_round_trip() {
        for kind in TransformKind::ALL {
            assert_eq!(kind.as_str().parse::<TransformKind>().unwrap(), *kind);
        }
    }

    #[test]
    fn test_default_order() {
        let names = Pipeline::default().names();
        assert_eq!(names.first(), Some(&"remove_comments_on_extensions"));
        assert_eq!(names.last(), Some(&"sort_table_columns"));
        assert!(!names.contains(&"inline_foreign_keys"));
        assert!(!TransformKind::InlineForeignKeys.is_default());
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(
            parse_list("inline_serials, sort_table_columns").unwrap(),
            vec![TransformKind::InlineSerials, TransformKind::SortTableColumns]
        );
        assert!(parse_list("").unwrap().is_empty());
        assert!(matches!(
            parse_list("inline_serials,nope"),
            Err(FormatError::Config(_))
        ));
    }

    #[test]
    fn test_empty_input_is_untouched() {
        let mut statements = Vec::new();
        Pipeline::default().run(&mut statements);
        assert!(statements.is_empty());
    }

    #[test]
    fn test_remove_indices() {
        let mut statements = test_support::statements("SET a = 1; SET b = 2; SET c = 3;");
        remove_indices(&mut statements, &BTreeSet::from([0, 2]));
        assert_eq!(test_support::render(&statements), vec!["SET b TO 2"]);
    }
}
