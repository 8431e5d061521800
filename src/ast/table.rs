use serde::Serialize;

use super::RelationKey;
use crate::deparser::normalize_type;

/// `CREATE TABLE` with a parenthesized element list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateTable {
    /// `UNLOGGED`, `TEMPORARY` and friends.
    pub persistence: Option<String>,
    pub if_not_exists: bool,
    pub relation: RelationKey,
    pub elements: Vec<TableElement>,
    /// Everything after the element list (`PARTITION BY`, `WITH (...)`, ...).
    pub tail: Option<String>,
}

impl CreateTable {
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.elements.iter().find_map(|element| match element {
            TableElement::Column(column) if column.name == name => Some(column),
            _ => None,
        })
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut ColumnDef> {
        self.elements.iter_mut().find_map(|element| match element {
            TableElement::Column(column) if column.name == name => Some(column),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "element", rename_all = "snake_case")]
pub enum TableElement {
    Column(ColumnDef),
    Constraint(Constraint),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDef {
    pub name: String,
    pub type_name: TypeName,
    pub constraints: Vec<Constraint>,
}

impl ColumnDef {
    pub fn is_primary_key(&self) -> bool {
        self.constraints.iter().any(Constraint::is_primary_key)
    }

    pub fn is_foreign_key(&self) -> bool {
        self.constraints.iter().any(Constraint::is_foreign_key)
    }
}

/// A column or table constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Constraint {
    pub name: Option<String>,
    pub kind: ConstraintKind,
    /// Trailing attributes such as `ON DELETE CASCADE`, `DEFERRABLE` or
    /// `NOT VALID`, in canonical form.
    pub attributes: Option<String>,
}

impl Constraint {
    pub fn new(kind: ConstraintKind) -> Self {
        Self {
            name: None,
            kind,
            attributes: None,
        }
    }

    /// The bare `PRIMARY KEY` marker placed on an inlined key column.
    pub fn primary_key_marker() -> Self {
        Self::new(ConstraintKind::PrimaryKey {
            columns: Vec::new(),
        })
    }

    pub fn is_primary_key(&self) -> bool {
        matches!(self.kind, ConstraintKind::PrimaryKey { .. })
    }

    pub fn is_foreign_key(&self) -> bool {
        matches!(self.kind, ConstraintKind::ForeignKey { .. })
    }

    pub fn is_not_null(&self) -> bool {
        self.kind == ConstraintKind::NotNull
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConstraintKind {
    NotNull,
    Null,
    Default {
        expr: String,
    },
    Check {
        expr: String,
    },
    /// Empty `columns` for the column-level form.
    PrimaryKey {
        columns: Vec<String>,
    },
    Unique {
        columns: Vec<String>,
        nulls_not_distinct: bool,
    },
    ForeignKey {
        columns: Vec<String>,
        references: RelationKey,
        ref_columns: Vec<String>,
    },
    /// `GENERATED ALWAYS AS (...) STORED` or an identity clause.
    Generated {
        text: String,
    },
    Collate {
        collation: String,
    },
    /// Any other table constraint, e.g. `EXCLUDE USING gist (...)`.
    Other {
        text: String,
    },
}

/// A column type in canonical spelling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TypeName(String);

/// Storage width of the built-in integer types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegerWidth {
    Two,
    Four,
    Eight,
}

impl IntegerWidth {
    pub fn serial_type(self) -> &'static str {
        match self {
            IntegerWidth::Two => "smallserial",
            IntegerWidth::Four => "serial",
            IntegerWidth::Eight => "bigserial",
        }
    }
}

impl TypeName {
    pub fn new(raw: &str) -> Self {
        Self(normalize_type(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn base(&self) -> &str {
        self.0.strip_prefix("pg_catalog.").unwrap_or(&self.0)
    }

    pub fn integer_width(&self) -> Option<IntegerWidth> {
        match self.base() {
            "smallint" | "int2" => Some(IntegerWidth::Two),
            "integer" | "int" | "int4" => Some(IntegerWidth::Four),
            "bigint" | "int8" => Some(IntegerWidth::Eight),
            _ => None,
        }
    }

    /// `timestamp` without time zone, with any precision, or an array of it.
    pub fn is_timestamp(&self) -> bool {
        let mut base = self.base();
        while let Some(element) = base.strip_suffix(']').and_then(|b| b.rsplit_once('[')) {
            base = element.0;
        }
        let Some(precision) = base.strip_prefix("timestamp") else {
            return false;
        };
        precision.is_empty()
            || precision
                .strip_prefix('(')
                .and_then(|p| p.strip_suffix(')'))
                .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_name_canonical() {
        assert_eq!(
            TypeName::new("timestamp(6) without time zone").as_str(),
            "timestamp(6)"
        );
        assert_eq!(
            TypeName::new("CHARACTER  VARYING(255)").as_str(),
            "character varying(255)"
        );
        assert_eq!(TypeName::new("numeric(10,2)").as_str(), "numeric(10, 2)");
        assert_eq!(TypeName::new("integer[]").as_str(), "integer[]");
    }

    #[test]
    fn test_integer_width() {
        assert_eq!(
            TypeName::new("smallint").integer_width(),
            Some(IntegerWidth::Two)
        );
        assert_eq!(
            TypeName::new("pg_catalog.int4").integer_width(),
            Some(IntegerWidth::Four)
        );
        assert_eq!(
            TypeName::new("BIGINT").integer_width(),
            Some(IntegerWidth::Eight)
        );
        assert_eq!(TypeName::new("bigint[]").integer_width(), None);
        assert_eq!(TypeName::new("numeric").integer_width(), None);
    }

    #[test]
    fn test_is_timestamp() {
        assert!(TypeName::new("timestamp(6) without time zone").is_timestamp());
        assert!(TypeName::new("pg_catalog.timestamp").is_timestamp());
        assert!(TypeName::new("timestamp[]").is_timestamp());
        assert!(TypeName::new("timestamp(3)[][]").is_timestamp());
        assert!(!TypeName::new("timestamp with time zone").is_timestamp());
        assert!(!TypeName::new("timestamptz").is_timestamp());
        assert!(!TypeName::new("date").is_timestamp());
    }

    #[test]
    fn test_column_lookup() {
        let mut table = CreateTable {
            persistence: None,
            if_not_exists: false,
            relation: RelationKey::qualified("public", "posts"),
            elements: vec![TableElement::Column(ColumnDef {
                name: "id".into(),
                type_name: TypeName::new("bigint"),
                constraints: vec![Constraint::new(ConstraintKind::NotNull)],
            })],
            tail: None,
        };
        assert!(table.column("id").is_some());
        assert!(table.column("title").is_none());
        table
            .column_mut("id")
            .unwrap()
            .constraints
            .push(Constraint::primary_key_marker());
        assert!(table.column("id").unwrap().is_primary_key());
    }
}
