use serde::Serialize;
use std::fmt;

use crate::deparser::quote_ident;

/// A possibly schema-qualified relation name.
///
/// Names are stored normalized: unquoted identifiers are folded to lower
/// case at parse time, quoted identifiers keep their exact text. Two keys
/// refer to the same relation exactly when they compare equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RelationKey {
    pub schema: Option<String>,
    pub name: String,
}

impl RelationKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            name: name.into(),
        }
    }

    pub fn qualified(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: Some(schema.into()),
            name: name.into(),
        }
    }

    /// Key of a sibling relation in the same schema.
    pub fn sibling(&self, name: impl Into<String>) -> Self {
        Self {
            schema: self.schema.clone(),
            name: name.into(),
        }
    }
}

impl fmt::Display for RelationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(schema) = &self.schema {
            write!(f, "{}.", quote_ident(schema))?;
        }
        write!(f, "{}", quote_ident(&self.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_quotes_when_needed() {
        assert_eq!(
            RelationKey::qualified("public", "comments").to_string(),
            "public.comments"
        );
        assert_eq!(
            RelationKey::qualified("public", "User Events").to_string(),
            "public.\"User Events\""
        );
        assert_eq!(RelationKey::new("order").to_string(), "\"order\"");
    }

    #[test]
    fn test_ordering_schema_then_name() {
        let mut keys = vec![
            RelationKey::qualified("public", "b"),
            RelationKey::qualified("audit", "z"),
            RelationKey::qualified("public", "a"),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                RelationKey::qualified("audit", "z"),
                RelationKey::qualified("public", "a"),
                RelationKey::qualified("public", "b"),
            ]
        );
    }
}
