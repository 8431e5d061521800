//! Keywords recognized by the scanner.
//!
//! Only the words the statement parser, the canonical deparser and the
//! indenter care about are listed. Every other word lexes as an identifier.

use std::fmt;
use std::str::FromStr;

macro_rules! keywords {
    ($($ident:ident => $text:literal, $reserved:literal;)*) => {
        /// A SQL keyword.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Keyword {
            $($ident),*
        }

        impl Keyword {
            /// Upper-case spelling of the keyword.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Keyword::$ident => $text),*
                }
            }

            /// Reserved keywords can never be bare identifiers.
            pub fn is_reserved(self) -> bool {
                match self {
                    $(Keyword::$ident => $reserved),*
                }
            }
        }

        impl FromStr for Keyword {
            type Err = ();

            fn from_str(s: &str) -> Result<Keyword, ()> {
                match s.to_ascii_uppercase().as_str() {
                    $($text => Ok(Keyword::$ident),)*
                    _ => Err(()),
                }
            }
        }
    };
}

keywords! {
    Action => "ACTION", false;
    Add => "ADD", false;
    After => "AFTER", false;
    All => "ALL", true;
    Alter => "ALTER", false;
    Always => "ALWAYS", false;
    Analyze => "ANALYZE", true;
    And => "AND", true;
    Any => "ANY", true;
    Array => "ARRAY", true;
    As => "AS", true;
    Asc => "ASC", true;
    Attach => "ATTACH", false;
    Authorization => "AUTHORIZATION", true;
    Before => "BEFORE", false;
    Between => "BETWEEN", false;
    Both => "BOTH", true;
    By => "BY", false;
    Cache => "CACHE", false;
    Cascade => "CASCADE", false;
    Case => "CASE", true;
    Cast => "CAST", true;
    Check => "CHECK", true;
    Collate => "COLLATE", true;
    Column => "COLUMN", true;
    Comment => "COMMENT", false;
    Concurrently => "CONCURRENTLY", true;
    Constraint => "CONSTRAINT", true;
    Create => "CREATE", true;
    Cross => "CROSS", true;
    CurrentDate => "CURRENT_DATE", true;
    CurrentSchema => "CURRENT_SCHEMA", true;
    CurrentTime => "CURRENT_TIME", true;
    CurrentTimestamp => "CURRENT_TIMESTAMP", true;
    CurrentUser => "CURRENT_USER", true;
    Cycle => "CYCLE", false;
    Data => "DATA", false;
    Default => "DEFAULT", true;
    Deferrable => "DEFERRABLE", true;
    Deferred => "DEFERRED", false;
    Delete => "DELETE", false;
    Desc => "DESC", true;
    Detach => "DETACH", false;
    Disable => "DISABLE", false;
    Distinct => "DISTINCT", true;
    Do => "DO", true;
    Drop => "DROP", false;
    Each => "EACH", false;
    Else => "ELSE", true;
    Enable => "ENABLE", false;
    End => "END", true;
    Except => "EXCEPT", true;
    Exclude => "EXCLUDE", false;
    Execute => "EXECUTE", false;
    Exists => "EXISTS", false;
    Extension => "EXTENSION", false;
    False => "FALSE", true;
    Fetch => "FETCH", true;
    Filter => "FILTER", false;
    First => "FIRST", false;
    For => "FOR", true;
    Foreign => "FOREIGN", true;
    From => "FROM", true;
    Full => "FULL", true;
    Function => "FUNCTION", false;
    Generated => "GENERATED", false;
    Grant => "GRANT", true;
    Group => "GROUP", true;
    Having => "HAVING", true;
    Identity => "IDENTITY", false;
    If => "IF", false;
    Ilike => "ILIKE", true;
    Immediate => "IMMEDIATE", false;
    In => "IN", true;
    Include => "INCLUDE", false;
    Increment => "INCREMENT", false;
    Index => "INDEX", false;
    Inherit => "INHERIT", false;
    Initially => "INITIALLY", true;
    Inner => "INNER", true;
    Insert => "INSERT", false;
    Intersect => "INTERSECT", true;
    Into => "INTO", true;
    Is => "IS", true;
    Isnull => "ISNULL", true;
    Join => "JOIN", true;
    Key => "KEY", false;
    Last => "LAST", false;
    Lateral => "LATERAL", true;
    Leading => "LEADING", true;
    Left => "LEFT", true;
    Like => "LIKE", true;
    Limit => "LIMIT", true;
    Local => "LOCAL", false;
    LocalTime => "LOCALTIME", true;
    LocalTimestamp => "LOCALTIMESTAMP", true;
    Match => "MATCH", false;
    Materialized => "MATERIALIZED", false;
    Maxvalue => "MAXVALUE", false;
    Minvalue => "MINVALUE", false;
    Natural => "NATURAL", true;
    No => "NO", false;
    Not => "NOT", true;
    Notnull => "NOTNULL", true;
    Null => "NULL", true;
    Nulls => "NULLS", false;
    Of => "OF", false;
    Offset => "OFFSET", true;
    On => "ON", true;
    Only => "ONLY", true;
    Or => "OR", true;
    Order => "ORDER", true;
    Outer => "OUTER", true;
    Over => "OVER", false;
    Owned => "OWNED", false;
    Owner => "OWNER", false;
    Partition => "PARTITION", false;
    Primary => "PRIMARY", true;
    Procedure => "PROCEDURE", false;
    Recursive => "RECURSIVE", false;
    References => "REFERENCES", true;
    Replace => "REPLACE", false;
    Restrict => "RESTRICT", false;
    Returning => "RETURNING", true;
    Right => "RIGHT", true;
    Row => "ROW", false;
    Schema => "SCHEMA", false;
    Select => "SELECT", true;
    Sequence => "SEQUENCE", false;
    Session => "SESSION", false;
    SessionUser => "SESSION_USER", true;
    Set => "SET", false;
    Similar => "SIMILAR", true;
    Start => "START", false;
    Stored => "STORED", false;
    Symmetric => "SYMMETRIC", true;
    Table => "TABLE", true;
    Temp => "TEMP", false;
    Temporary => "TEMPORARY", false;
    Then => "THEN", true;
    To => "TO", true;
    Trailing => "TRAILING", true;
    Trigger => "TRIGGER", false;
    True => "TRUE", true;
    Type => "TYPE", false;
    Union => "UNION", true;
    Unique => "UNIQUE", true;
    Unlogged => "UNLOGGED", false;
    Update => "UPDATE", false;
    User => "USER", true;
    Using => "USING", true;
    Valid => "VALID", false;
    Values => "VALUES", false;
    Variadic => "VARIADIC", true;
    View => "VIEW", false;
    When => "WHEN", true;
    Where => "WHERE", true;
    Window => "WINDOW", true;
    With => "WITH", true;
}

impl Keyword {
    /// Keywords that read as a function name when directly followed by `(`.
    pub fn is_function_like(self) -> bool {
        matches!(
            self,
            Keyword::Any
                | Keyword::All
                | Keyword::Cast
                | Keyword::Exists
                | Keyword::Left
                | Keyword::Replace
                | Keyword::Right
        )
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
