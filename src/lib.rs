//! # schemafmt
//!
//! Deterministic formatter for PostgreSQL schema dumps.
//!
//! Two dumps of the same schema taken on different machines or server
//! versions differ in statement order, constraint placement and noise
//! settings. `schemafmt` parses a dump, rewrites it into a canonical
//! statement list and prints it with a fixed layout, so that diffs only
//! show real schema changes.
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use schemafmt::prelude::*;
//!
//! let dump = std::fs::read_to_string("db/structure.sql")?;
//! let formatted = schemafmt::format(&dump)?;
//! ```
//!
//! ## Pipeline
//!
//! | Stage       | Module                     |
//! |-------------|----------------------------|
//! | Parse       | [`parser`]                 |
//! | Transform   | [`transforms`]             |
//! | Deparse     | [`deparser`]               |
//! | Indent      | [`indenter`]               |
//! | Render      | [`renderer`], [`appender`] |

pub mod appender;
pub mod ast;
pub mod config;
pub mod deparser;
pub mod error;
pub mod formatter;
pub mod indenter;
pub mod parser;
pub mod renderer;
pub mod scanner;
pub mod transforms;

pub mod prelude {
    pub use crate::ast::*;
    pub use crate::config::{Config, SettingValue};
    pub use crate::deparser::ToSql;
    pub use crate::error::*;
    pub use crate::formatter::Formatter;
    pub use crate::parser::parse;
    pub use crate::transforms::{Pipeline, Transform, TransformKind};
}

/// Format a schema dump with the default configuration.
///
/// # Example
///
/// ```
/// let formatted = schemafmt::format("SET client_min_messages = warning;").unwrap();
/// assert_eq!(formatted, "SET client_min_messages TO warning;\n");
/// ```
pub fn format(source: &str) -> error::FormatResult<String> {
    formatter::Formatter::default().format(source)
}
