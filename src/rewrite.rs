// Pure UPDATE/DELETE -> SELECT rewrite.
//
// `rewrite()` is the only entry point and is safe to call concurrently from
// every worker: the compiled patterns are built once and shared by
// reference, and the function itself has no interior mutability.

use std::sync::LazyLock;

use regex::Regex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteResult {
    Select(String),
    Skip,
}

static UPDATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)^.*?update(?:\s+(?:low_priority|ignore))?\s+(.*?)\s+set\b(.*?)(?:\s+where\b(.*?))?(limit\s*[0-9]+(?:\s*,\s*[0-9]+)?)?$",
    )
    .expect("static UPDATE_RE is a valid pattern")
});

static DELETE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^.*?delete\s(.*?)\bfrom\b(.*)$").expect("static DELETE_RE is a valid pattern")
});

/// Step 1 of the algorithm: a coarse first-character filter that rejects
/// BEGIN/COMMIT/CREATE/INSERT (and, as an accepted side effect, CALL)
/// without running either regex. Preserved verbatim per the open question
/// in spec.md ("preserve the behavior... out of scope here").
pub(crate) fn is_convert_candidate(query: &str) -> bool {
    match query.trim_start().as_bytes().first() {
        Some(b'B') | Some(b'b') | Some(b'C') | Some(b'c') | Some(b'I') | Some(b'i') => false,
        _ => true,
    }
}

/// Rewrites a single write-statement text into an equivalent read-only
/// SELECT, or decides to skip it. Case-insensitive, anchored to the full
/// statement text. See spec.md §4.2 / §8 (R1-R7) for the exact contract.
pub fn rewrite(query: &str) -> RewriteResult {
    if !is_convert_candidate(query) {
        return RewriteResult::Skip;
    }

    if let Some(caps) = UPDATE_RE.captures(query) {
        let tables = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
        let setlist = caps.get(2).map(|m| m.as_str().trim()).unwrap_or_default();
        let mut select = format!("select isnull(coalesce({setlist})) from {tables}");
        if let Some(where_clause) = caps.get(3) {
            select.push_str(" where ");
            select.push_str(where_clause.as_str().trim());
        }
        if let Some(limit) = caps.get(4) {
            select.push(' ');
            select.push_str(limit.as_str());
        }
        return RewriteResult::Select(select);
    }

    if let Some(caps) = DELETE_RE.captures(query) {
        let rest = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
        return RewriteResult::Select(format!("select * from{rest}"));
    }

    RewriteResult::Skip
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn r1_basic_update() {
        assert_eq!(
            rewrite("UPDATE t SET a=1, b=2 WHERE id=3"),
            RewriteResult::Select("select isnull(coalesce(a=1, b=2)) from t where id=3".into())
        );
    }

    #[test]
    fn r2_low_priority_and_limit_case_insensitive() {
        assert_eq!(
            rewrite("update LOW_PRIORITY t set x=x+1 limit 10"),
            RewriteResult::Select("select isnull(coalesce(x=x+1)) from t limit 10".into())
        );
    }

    #[test]
    fn r3_delete_with_join() {
        assert_eq!(
            rewrite("DELETE a FROM t1 a JOIN t2 b ON a.id=b.id WHERE b.x>0"),
            RewriteResult::Select("select * from t1 a JOIN t2 b ON a.id=b.id WHERE b.x>0".into())
        );
    }

    #[test]
    fn r4_insert_is_skipped() {
        assert_eq!(rewrite("INSERT INTO t VALUES (1)"), RewriteResult::Skip);
    }

    #[test]
    fn r5_begin_is_skipped() {
        assert_eq!(rewrite("BEGIN"), RewriteResult::Skip);
    }

    #[test]
    fn r6_commit_is_skipped() {
        assert_eq!(rewrite("COMMIT"), RewriteResult::Skip);
    }

    #[test]
    fn r7_create_is_skipped() {
        assert_eq!(rewrite("CREATE TABLE t(x int)"), RewriteResult::Skip);
    }

    #[test]
    fn call_is_also_skipped_by_the_coarse_filter() {
        // Documented quirk (spec.md open question): the first-character
        // filter also rejects CALL, and that is intentionally preserved.
        assert_eq!(rewrite("CALL some_proc()"), RewriteResult::Skip);
    }

    #[test]
    fn plain_select_is_skipped() {
        assert_eq!(rewrite("SELECT * FROM t"), RewriteResult::Skip);
    }

    #[test]
    fn update_without_where_has_no_where_clause() {
        assert_eq!(
            rewrite("update t set a=1"),
            RewriteResult::Select("select isnull(coalesce(a=1)) from t".into())
        );
    }
}
