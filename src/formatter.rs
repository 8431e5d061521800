//! The formatting pipeline: parse, transform, render, append.

use tracing::debug;

use crate::appender::StatementAppender;
use crate::config::Config;
use crate::error::FormatResult;
use crate::parser;
use crate::renderer::render;
use crate::transforms::Pipeline;

/// Formats schema dumps with one configured transform pipeline.
#[derive(Debug)]
pub struct Formatter {
    pipeline: Pipeline,
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl Formatter {
    pub fn new(config: &Config) -> Self {
        Self::with_pipeline(Pipeline::from_config(config))
    }

    pub fn with_pipeline(pipeline: Pipeline) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Format a complete dump.
    pub fn format(&self, source: &str) -> FormatResult<String> {
        let mut statements = parser::parse(source)?;
        debug!(statements = statements.len(), "parsed dump");

        self.pipeline.run(&mut statements);

        let mut appender = StatementAppender::new();
        for raw in &statements {
            appender.append(&render(&raw.stmt)?, raw.stmt.kind());
        }
        Ok(appender.finish())
    }

    /// Whether `source` is already in formatted form.
    pub fn is_formatted(&self, source: &str) -> FormatResult<bool> {
        Ok(self.format(source)? == source)
    }
}
