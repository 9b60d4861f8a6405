//! Placeholder translation between the builder's `?` style and Postgres `$N`.

use std::borrow::Cow;
use std::fmt::Write as _;

mod parsers;
mod scanner;

use parsers::{
    is_block_comment_end, is_block_comment_start, is_line_comment_start, matches_tag,
    try_start_dollar_quote,
};
use scanner::{State, scan_digits, trailing_keyword};

/// Target placeholder style for translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// PostgreSQL-style placeholders like `$1`.
    Postgres,
    /// SQLite-style placeholders like `?1`.
    Sqlite,
}

/// Rewrite placeholders for `target`.
///
/// Toward [`PlaceholderStyle::Postgres`]:
/// - bare `?` becomes `$N`, numbered left to right (a bare `?` after `?K` continues at `K + 1`,
///   the way SQLite numbers them);
/// - `?N` becomes `$N`;
/// - `IS ?` becomes `IS NOT DISTINCT FROM $N` and `IS NOT ?` becomes `IS DISTINCT FROM $N`,
///   since Postgres only accepts `IS` before a literal `NULL`.
///
/// Toward [`PlaceholderStyle::Sqlite`], `$N` becomes `?N` and bare `?` is left alone.
///
/// Quoted strings, identifiers, comments and dollar-quoted blocks are skipped. The scanner is
/// lexical only, so Postgres operators spelled with `?` (the jsonb `?`, `?|`, `?&`) are
/// rewritten too; send such statements with translation disabled.
///
/// ```rust
/// use sql_record::translation::{PlaceholderStyle, translate_placeholders};
///
/// let sql = translate_placeholders(
///     "SELECT * FROM t WHERE a IS ? AND b = ?",
///     PlaceholderStyle::Postgres,
///     true,
/// );
/// assert_eq!(sql, "SELECT * FROM t WHERE a IS NOT DISTINCT FROM $1 AND b = $2");
/// ```
///
/// Returns a borrowed `Cow` when nothing changes.
#[must_use]
pub fn translate_placeholders(sql: &str, target: PlaceholderStyle, enabled: bool) -> Cow<'_, str> {
    if !enabled {
        return Cow::Borrowed(sql);
    }

    let bytes = sql.as_bytes();
    let mut out: Option<String> = None;
    let mut flushed = 0;
    let mut next_param: u64 = 1;
    let mut state = State::Normal;
    let mut idx = 0;

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => match b {
                b'\'' => state = State::SingleQuoted,
                b'"' => state = State::DoubleQuoted,
                _ if is_line_comment_start(bytes, idx) => {
                    state = State::LineComment;
                    idx += 1;
                }
                _ if is_block_comment_start(bytes, idx) => {
                    state = State::BlockComment(1);
                    idx += 1;
                }
                b'$' => {
                    if let Some((tag, closer)) = try_start_dollar_quote(bytes, idx) {
                        state = State::DollarQuoted(tag);
                        idx = closer;
                    } else if target == PlaceholderStyle::Sqlite
                        && let Some((end, digits)) = scan_digits(bytes, idx + 1)
                    {
                        let buf = out.get_or_insert_with(|| String::with_capacity(sql.len()));
                        buf.push_str(&sql[flushed..idx]);
                        buf.push('?');
                        buf.push_str(digits);
                        flushed = end;
                        idx = end;
                        continue;
                    }
                }
                b'?' if target == PlaceholderStyle::Postgres => {
                    let buf = out.get_or_insert_with(|| String::with_capacity(sql.len() + 8));
                    buf.push_str(&sql[flushed..idx]);
                    rewrite_null_comparison(buf);
                    let end = match scan_digits(bytes, idx + 1) {
                        Some((end, digits)) => {
                            if let Ok(n) = digits.parse::<u64>() {
                                next_param = next_param.max(n.saturating_add(1));
                            }
                            buf.push('$');
                            buf.push_str(digits);
                            end
                        }
                        None => {
                            let _ = write!(buf, "${next_param}");
                            next_param += 1;
                            idx + 1
                        }
                    };
                    flushed = end;
                    idx = end;
                    continue;
                }
                _ => {}
            },
            State::SingleQuoted => {
                if b == b'\'' {
                    if bytes.get(idx + 1) == Some(&b'\'') {
                        idx += 1; // escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::DoubleQuoted => {
                if b == b'"' {
                    if bytes.get(idx + 1) == Some(&b'"') {
                        idx += 1;
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                if is_block_comment_start(bytes, idx) {
                    state = State::BlockComment(depth + 1);
                    idx += 1;
                } else if is_block_comment_end(bytes, idx) {
                    state = if depth == 1 {
                        State::Normal
                    } else {
                        State::BlockComment(depth - 1)
                    };
                    idx += 1;
                }
            }
            State::DollarQuoted(ref tag) => {
                if matches_tag(bytes, idx, tag) {
                    idx += tag.len() + 1;
                    state = State::Normal;
                }
            }
        }
        idx += 1;
    }

    match out {
        Some(mut buf) => {
            buf.push_str(&sql[flushed..]);
            Cow::Owned(buf)
        }
        None => Cow::Borrowed(sql),
    }
}

fn rewrite_null_comparison(buf: &mut String) {
    if let Some(not_at) = trailing_keyword(buf, "NOT")
        && let Some(is_at) = trailing_keyword(&buf[..not_at], "IS")
    {
        buf.truncate(is_at);
        buf.push_str("IS DISTINCT FROM ");
    } else if let Some(is_at) = trailing_keyword(buf, "IS") {
        buf.truncate(is_at);
        buf.push_str("IS NOT DISTINCT FROM ");
    }
}
