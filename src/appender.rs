//! Joins rendered statements with separators chosen by statement kind.

use crate::ast::StatementKind;

/// Newlines to put between two statements.
///
/// Tables, views, table-as statements and inserts get three blank lines
/// before them. Runs of indexes and runs of `SET` get one blank line.
/// Everything else gets two.
pub fn separator(previous: Option<StatementKind>, current: StatementKind) -> &'static str {
    use StatementKind::*;

    match (previous, current) {
        (None, _) => "",
        (_, CreateTable | View | CreateTableAs | Insert) => "\n\n\n\n",
        (Some(CreateIndex), CreateIndex) | (Some(VariableSet), VariableSet) => "\n\n",
        _ => "\n\n\n",
    }
}

#[derive(Debug, Default)]
pub struct StatementAppender {
    output: String,
    previous: Option<StatementKind>,
}

impl StatementAppender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one rendered statement.
    pub fn append(&mut self, rendered: &str, kind: StatementKind) {
        let len = self.output.trim_end().len();
        self.output.truncate(len);
        self.output.push_str(separator(self.previous, kind));
        self.output.push_str(rendered);
        self.previous = Some(kind);
    }

    /// The joined text, ending with exactly one newline unless empty.
    pub fn finish(mut self) -> String {
        let len = self.output.trim_end().len();
        self.output.truncate(len);
        if !self.output.is_empty() {
            self.output.push('\n');
        }
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_separators() {
        use StatementKind::*;
        assert_eq!(separator(None, CreateTable), "");
        assert_eq!(separator(Some(VariableSet), CreateTable), "\n\n\n\n");
        assert_eq!(separator(Some(CreateTable), CreateIndex), "\n\n\n");
        assert_eq!(separator(Some(CreateIndex), CreateIndex), "\n\n");
        assert_eq!(separator(Some(VariableSet), VariableSet), "\n\n");
        assert_eq!(separator(Some(VariableSet), Select), "\n\n\n");
    }

    #[test]
    fn test_append() {
        let mut appender = StatementAppender::new();
        appender.append("SET a TO 1;\n", StatementKind::VariableSet);
        appender.append("SET b TO 2;", StatementKind::VariableSet);
        appender.append("-- Name: t; Type: TABLE;\n\nCREATE TABLE t (\n)\n;", StatementKind::CreateTable);
        assert_eq!(
            appender.finish(),
            "SET a TO 1;\n\nSET b TO 2;\n\n\n\n-- Name: t; Type: TABLE;\n\nCREATE TABLE t (\n)\n;\n"
        );
    }

    #[test]
    fn test_empty() {
        assert_eq!(StatementAppender::new().finish(), "");
    }
}
