use tracing::trace;

use super::Transform;
use crate::ast::{CommentObject, RawStatement, Statement};

/// Drops `COMMENT ON EXTENSION`. Extension comments come from the
/// extension itself and differ between server builds.
pub struct RemoveCommentsOnExtensions;

impl Transform for RemoveCommentsOnExtensions {
    fn name(&self) -> &'static str {
        "remove_comments_on_extensions"
    }

    fn apply(&self, statements: &mut Vec<RawStatement>) {
        statements.retain(|raw| {
            let Statement::CommentOn(comment) = &raw.stmt else {
                return true;
            };
            if comment.object != CommentObject::Extension {
                return true;
            }
            trace!(location = raw.location, "removing extension comment");
            false
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transforms::test_support::{render, statements};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_removes_only_extension_comments() {
        let mut stmts = statements(
            "COMMENT ON EXTENSION plpgsql IS 'PL/pgSQL procedural language';
             COMMENT ON TABLE public.posts IS 'blog posts';
             CREATE EXTENSION IF NOT EXISTS plpgsql;",
        );
        RemoveCommentsOnExtensions.apply(&mut stmts);
        assert_eq!(
            render(&stmts),
            vec![
                "COMMENT ON TABLE public.posts IS 'blog posts'",
                "CREATE EXTENSION IF NOT EXISTS plpgsql",
            ]
        );
    }
}
