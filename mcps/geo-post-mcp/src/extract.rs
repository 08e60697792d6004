//! Table references named by FROM / JOIN clauses
//!
//! Pattern based, not a parser. Some forms are not seen at all, and a table
//! that is not seen is never checked against the allow-list:
//!
//! - comma joins: in `FROM parcels, restricted` only `parcels` is seen
//! - quoted identifiers: `FROM "restricted"` is skipped
//! - schema-qualified names: `FROM public.restricted` yields `public`
//!
//! CTEs with a column list (`WITH x(a, b) AS (...)`) are not recognised as
//! aliases and are checked like tables. The allow-list is therefore not a
//! complete barrier: the database role must hold SELECT grants on the
//! allowed tables only.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

static TABLE_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:FROM|JOIN)\s+(\w+)").expect("Invalid table reference regex")
});

static CTE_ALIAS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\bWITH\s+(?:RECURSIVE\s+)?(\w+)\s+AS\s*(?:NOT\s+)?(?:MATERIALIZED\s*)?\(|,\s*(\w+)\s+AS\s*(?:NOT\s+)?(?:MATERIALIZED\s*)?\(",
    )
    .expect("Invalid CTE alias regex")
});

/// Names introduced by `WITH name AS (` / `, name AS (`.
///
/// The opening parenthesis of the CTE body is required, so a select-list
/// alias (`, col AS c`) is never taken for a CTE.
fn cte_aliases(sql: &str) -> HashSet<&str> {
    CTE_ALIAS
        .captures_iter(sql)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str())
        .collect()
}

/// Tables referenced by `sql`, in first-seen order without duplicates.
///
/// A name that is also a CTE alias is not a real table and is left out.
pub fn extract_table_names(sql: &str) -> Vec<String> {
    let aliases = cte_aliases(sql);
    let mut seen = HashSet::new();

    TABLE_REF
        .captures_iter(sql)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|name| !aliases.contains(name))
        .filter(|name| seen.insert(*name))
        .map(str::to_string)
        .collect()
}
