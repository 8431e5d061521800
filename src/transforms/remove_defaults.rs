use std::collections::BTreeMap;

use tracing::trace;

use super::Transform;
use crate::ast::{RawStatement, Statement};
use crate::config::SettingValue;

/// Drops `SET name = value` when `value` is the server default for `name`.
pub struct RemoveDefaultsSetCommands {
    defaults: BTreeMap<String, SettingValue>,
}

impl RemoveDefaultsSetCommands {
    pub fn new(defaults: BTreeMap<String, SettingValue>) -> Self {
        Self { defaults }
    }

    fn restates_default(&self, stmt: &Statement) -> bool {
        let Statement::VariableSet(set) = stmt else {
            return false;
        };
        let (Some(default), Some(value)) = (self.defaults.get(&set.name), set.single_arg()) else {
            return false;
        };
        default.matches(value)
    }
}

impl Transform for RemoveDefaultsSetCommands {
    fn name(&self) -> &'static str {
        "remove_defaults_set_commands"
    }

    fn apply(&self, statements: &mut Vec<RawStatement>) {
        statements.retain(|raw| {
            if !self.restates_default(&raw.stmt) {
                return true;
            }
            trace!(location = raw.location, "removing SET of a default value");
            false
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::transforms::test_support::{render, statements};
    use pretty_assertions::assert_eq;

    fn transform() -> RemoveDefaultsSetCommands {
        RemoveDefaultsSetCommands::new(Config::default().postgres_config_defaults)
    }

    #[test]
    fn test_removes_defaults() {
        let mut stmts = statements(
            "SET statement_timeout = 0;
             SET lock_timeout = 0;
             SET default_with_oids = false;
             SET standard_conforming_strings = on;
             SET xmloption = content;
             SET default_table_access_method = heap;",
        );
        transform().apply(&mut stmts);
        assert!(stmts.is_empty());
    }

    #[test]
    fn test_keeps_other_values() {
        let mut stmts = statements(
            "SET default_with_oids = true;
             SET statement_timeout = 10;
             SET lock_timeout = 10.0;
             SET client_encoding = 'UTF8';
             SET search_path = public, pg_catalog;",
        );
        transform().apply(&mut stmts);
        assert_eq!(
            render(&stmts),
            vec![
                "SET default_with_oids TO TRUE",
                "SET statement_timeout TO 10",
                "SET lock_timeout TO 10.0",
                "SET client_encoding TO 'UTF8'",
                "SET search_path TO public, pg_catalog",
            ]
        );
    }

    #[test]
    fn test_multi_value_set_never_matches() {
        let mut stmts = statements("SET xmloption = content, content;");
        transform().apply(&mut stmts);
        assert_eq!(stmts.len(), 1);
    }
}
