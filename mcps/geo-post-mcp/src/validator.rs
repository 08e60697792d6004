//! SQL admission gate
//!
//! Lexical check that a statement starts with `SELECT` or `WITH` once leading
//! whitespace and comments are removed. This is not a parser: it cannot see
//! writes hidden in function calls, and a `WITH` whose final statement is a
//! write (`WITH x AS (...) INSERT ...`) is admitted. The store is the last
//! line of defence for both.

use thiserror::Error;

/// Why a statement was refused admission.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RejectionReason {
    #[error("Empty SQL statement.")]
    EmptyStatement,

    #[error("Only SELECT queries are permitted. Received statement starting with: {0}")]
    NotASelect(String),
}

const ADMITTED_KEYWORDS: [&str; 2] = ["SELECT", "WITH"];

/// Admit `sql` only if its first keyword is `SELECT` or `WITH`.
pub fn validate_select_only(sql: &str) -> Result<(), RejectionReason> {
    let body = strip_leading_comments(sql);

    let first = body
        .split_whitespace()
        .next()
        .ok_or(RejectionReason::EmptyStatement)?
        .to_uppercase();

    if ADMITTED_KEYWORDS.contains(&first.as_str()) {
        Ok(())
    } else {
        Err(RejectionReason::NotASelect(first))
    }
}

/// Drop leading whitespace and any run of `-- ...` / `/* ... */` comments.
///
/// An unterminated comment swallows the rest of the input.
fn strip_leading_comments(sql: &str) -> &str {
    let mut rest = sql.trim_start();
    loop {
        if let Some(after) = rest.strip_prefix("--") {
            rest = match after.find('\n') {
                Some(end) => after[end + 1..].trim_start(),
                None => "",
            };
        } else if let Some(after) = rest.strip_prefix("/*") {
            rest = match after.find("*/") {
                Some(end) => after[end + 2..].trim_start(),
                None => "",
            };
        } else {
            return rest;
        }
    }
}
