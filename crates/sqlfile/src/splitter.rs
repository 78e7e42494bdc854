//! Comment stripping and statement splitting
//!
//! The splitter works line by line with a small state machine:
//!
//! - `--` outside a quoted span starts a comment that runs to end of line
//! - `/* ... */` is dropped and may span any number of lines
//! - `'`, `"` and `` ` `` open a quoted span closed by the same character;
//!   `;` and comment markers inside it are plain text
//! - `;` outside quotes and comments ends the current statement
//!
//! Quoted spans end with their line. Block comments carry over to the next
//! line until their closer is found. Whitespace outside quoted spans,
//! including line breaks and removed block comments, collapses to one space.

/// Split SQL text into trimmed statements without comments or terminators.
///
/// Empty statements (a trailing `;`, `;;`, comment-only sections) are
/// dropped. Text after the last `;` becomes a final statement.
pub fn split_statements(sql: &str) -> Vec<String> {
    let mut splitter = Splitter::default();
    for line in sql.lines() {
        splitter.push_line(line);
    }
    splitter.finish()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Normal,
    Quoted(char),
    BlockComment,
}

/// Incremental splitter fed one line at a time.
#[derive(Debug, Default)]
pub(crate) struct Splitter {
    statements: Vec<String>,
    current: String,
    in_block_comment: bool,
    lines_seen: usize,
}

impl Splitter {
    /// Scan one source line, without its line terminator.
    pub(crate) fn push_line(&mut self, line: &str) {
        let line = if self.lines_seen == 0 {
            line.strip_prefix('\u{feff}').unwrap_or(line)
        } else {
            line
        };
        self.lines_seen += 1;

        let mut state = if self.in_block_comment {
            ScanState::BlockComment
        } else {
            ScanState::Normal
        };

        // the previous line break
        self.push_space();

        let mut chars = line.chars().peekable();
        while let Some(c) = chars.next() {
            match state {
                ScanState::BlockComment => {
                    if c == '*' && chars.peek() == Some(&'/') {
                        chars.next();
                        state = ScanState::Normal;
                        self.push_space();
                    }
                }
                ScanState::Quoted(quote) => {
                    self.current.push(c);
                    if c == '\\' && quote != '`' {
                        if let Some(escaped) = chars.next() {
                            self.current.push(escaped);
                        }
                    } else if c == quote {
                        state = ScanState::Normal;
                    }
                }
                ScanState::Normal => match c {
                    '-' if chars.peek() == Some(&'-') => break,
                    '/' if chars.peek() == Some(&'*') => {
                        chars.next();
                        state = ScanState::BlockComment;
                        self.push_space();
                    }
                    '\'' | '"' | '`' => {
                        self.current.push(c);
                        state = ScanState::Quoted(c);
                    }
                    ';' => self.end_statement(),
                    c if c.is_whitespace() => self.push_space(),
                    c => self.current.push(c),
                },
            }
        }

        self.in_block_comment = state == ScanState::BlockComment;
    }

    /// Flush the trailing statement and return everything collected.
    pub(crate) fn finish(mut self) -> Vec<String> {
        self.end_statement();
        if self.in_block_comment {
            tracing::debug!("SQL source ended inside an unterminated block comment");
        }
        self.statements
    }

    fn push_space(&mut self) {
        if !self.current.is_empty() && !self.current.ends_with(' ') {
            self.current.push(' ');
        }
    }

    fn end_statement(&mut self) {
        let statement = self.current.trim();
        if !statement.is_empty() {
            self.statements.push(statement.to_string());
        }
        self.current.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_split_one_statement_per_line() {
        let sql = indoc! {"
            DROP TABLE IF EXISTS users;
            CREATE TABLE users (id BIGINT, name VARCHAR(255));
            INSERT INTO users (id, name) VALUES (1, 'user');
        "};

        assert_eq!(
            split_statements(sql),
            vec![
                "DROP TABLE IF EXISTS users",
                "CREATE TABLE users (id BIGINT, name VARCHAR(255))",
                "INSERT INTO users (id, name) VALUES (1, 'user')",
            ]
        );
    }

    #[test]
    fn test_line_comments_and_blank_lines_are_dropped() {
        let commented = indoc! {"
            -- leading comment
            DROP TABLE IF EXISTS users;

            -- comment
            CREATE TABLE users (id BIGINT PRIMARY KEY AUTO_INCREMENT, name VARCHAR(255)); -- trailing

            INSERT INTO users (id, name) VALUES (1, 'user');
            -- final comment
        "};
        let clean = indoc! {"
            DROP TABLE IF EXISTS users;
            CREATE TABLE users (id BIGINT PRIMARY KEY AUTO_INCREMENT, name VARCHAR(255));
            INSERT INTO users (id, name) VALUES (1, 'user');
        "};

        assert_eq!(split_statements(commented), split_statements(clean));
        assert_eq!(split_statements(commented).len(), 3);
    }

    #[test]
    fn test_block_comments_are_dropped() {
        let commented = indoc! {"
            /*
             * Schema setup; run before seeding.
             * -- not a line comment, 'not a string
             */
            DROP TABLE IF EXISTS users; /* inline */
            CREATE TABLE users (id BIGINT, /* the key */ name VARCHAR(255));
            /* one-line */ INSERT INTO users (id, name) VALUES (1, 'user');
        "};
        let clean = indoc! {"
            DROP TABLE IF EXISTS users;
            CREATE TABLE users (id BIGINT, name VARCHAR(255));
            INSERT INTO users (id, name) VALUES (1, 'user');
        "};

        assert_eq!(split_statements(commented), split_statements(clean));
    }

    #[test]
    fn test_block_comment_counts_as_whitespace() {
        assert_eq!(split_statements("SELECT/*x*/1;"), vec!["SELECT 1"]);
    }

    #[test]
    fn test_block_comment_spanning_statement_lines() {
        let sql = indoc! {"
            SELECT id /* start
            ignored; still ignored
            end */ FROM users;
        "};

        assert_eq!(split_statements(sql), vec!["SELECT id FROM users"]);
    }

    #[test]
    fn test_line_marker_inside_open_block_comment() {
        let sql = indoc! {"
            SELECT 1; /* opened -- not a line comment
            SELECT 2; */ SELECT 3;
        "};

        assert_eq!(split_statements(sql), vec!["SELECT 1", "SELECT 3"]);
    }

    #[test]
    fn test_block_opener_inside_line_comment() {
        let sql = indoc! {"
            SELECT 1; -- see /* below
            SELECT 2;
        "};

        assert_eq!(split_statements(sql), vec!["SELECT 1", "SELECT 2"]);
    }

    #[test]
    fn test_terminator_and_dashes_inside_string_literal() {
        assert_eq!(
            split_statements("INSERT INTO t (s) VALUES ('a;b--c');"),
            vec!["INSERT INTO t (s) VALUES ('a;b--c')"]
        );
        assert_eq!(
            split_statements(r#"INSERT INTO t (s) VALUES ("x/*y*/;z");"#),
            vec![r#"INSERT INTO t (s) VALUES ("x/*y*/;z")"#]
        );
    }

    #[test]
    fn test_escaped_quotes() {
        assert_eq!(
            split_statements("UPDATE t SET s = 'it''s; fine'; SELECT 1;"),
            vec!["UPDATE t SET s = 'it''s; fine'", "SELECT 1"]
        );
        assert_eq!(
            split_statements(r"UPDATE t SET s = 'a\';b'; SELECT 1;"),
            vec![r"UPDATE t SET s = 'a\';b'", "SELECT 1"]
        );
    }

    #[test]
    fn test_literal_ending_in_backslash_escapes_the_quote() {
        // the backslash escapes the closing quote, so the following `;` is literal text
        let sql = indoc! {r"
            INSERT INTO t VALUES ('C:\'); INSERT INTO t VALUES ('second');
            SELECT 1;
        "};

        assert_eq!(
            split_statements(sql),
            vec![
                r"INSERT INTO t VALUES ('C:\'); INSERT INTO t VALUES ('second'); SELECT 1"
            ]
        );
    }

    #[test]
    fn test_backtick_identifiers() {
        assert_eq!(
            split_statements("SELECT `odd;name--col` FROM t;"),
            vec!["SELECT `odd;name--col` FROM t"]
        );
    }

    #[test]
    fn test_whitespace_inside_literal_is_preserved() {
        assert_eq!(
            split_statements("INSERT INTO t VALUES ('a    b');"),
            vec!["INSERT INTO t VALUES ('a    b')"]
        );
    }

    #[test]
    fn test_unterminated_quote_ends_with_line() {
        let sql = indoc! {"
            SELECT 'broken;
            SELECT 2;
        "};

        assert_eq!(split_statements(sql), vec!["SELECT 'broken; SELECT 2"]);
    }

    #[test]
    fn test_multiline_statement_is_joined() {
        let sql = indoc! {"
            CREATE TABLE users (
                id BIGINT,
                name VARCHAR(255)
            );
        "};

        assert_eq!(
            split_statements(sql),
            vec!["CREATE TABLE users ( id BIGINT, name VARCHAR(255) )"]
        );
    }

    #[test]
    fn test_empty_segments_are_dropped() {
        assert_eq!(split_statements(";;SELECT 1;; ;\n;"), vec!["SELECT 1"]);
        assert!(split_statements("").is_empty());
        assert!(split_statements("-- only a comment\n/* and a block */\n").is_empty());
    }

    #[test]
    fn test_missing_final_terminator() {
        assert_eq!(
            split_statements("SELECT 1;\nSELECT 2"),
            vec!["SELECT 1", "SELECT 2"]
        );
    }

    #[test]
    fn test_crlf_and_bom() {
        assert_eq!(
            split_statements("\u{feff}SELECT 1; -- c\r\nSELECT 2;\r\n"),
            vec!["SELECT 1", "SELECT 2"]
        );
    }

    #[test]
    fn test_unterminated_block_comment_swallows_rest() {
        assert_eq!(
            split_statements("SELECT 1; /* never closed\nSELECT 2;"),
            vec!["SELECT 1"]
        );
    }

    #[test]
    fn test_single_dash_and_slash_are_text() {
        assert_eq!(
            split_statements("SELECT 4 - 1, 8 / 2;"),
            vec!["SELECT 4 - 1, 8 / 2"]
        );
    }
}
