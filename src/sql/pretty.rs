//! Clause-per-line layout for converted SQL.
//!
//! Only whitespace changes. Clause and AND/OR breaks replace existing
//! whitespace; select-list breaks go right after each top-level comma.
//! The non-whitespace text is the same before and after.

use super::parens;
use regex::Regex;
use std::sync::LazyLock;

const INDENT: &str = "    ";

static CLAUSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:^|\s+)(SELECT|FROM|WHERE|GROUP\s+BY|HAVING|ORDER\s+BY|UNION(?:\s+ALL)?|EXCEPT|INTERSECT)\b",
    )
    .expect("clause pattern is valid")
});

static SELECT_QUANTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s+(?:DISTINCT|ALL)\b").expect("quantifier pattern is valid"));

static CONNECTIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+(AND|OR)\s+").expect("connective pattern is valid"));

static BLANK_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:[ \t]*\r?\n){3,}").expect("blank line pattern is valid"));

pub fn pretty_print(sql: &str) -> String {
    let laid_out = break_clauses(sql);
    let connected = CONNECTIVE.replace_all(&laid_out, |caps: &regex::Captures| {
        format!("\n{}{} ", INDENT, &caps[1])
    });
    let collapsed = BLANK_RUN.replace_all(&connected, "\n\n");
    collapsed.trim().to_string()
}

/// Starts every major clause on its own line and reflows SELECT lists.
fn break_clauses(sql: &str) -> String {
    // (匹配起點, 關鍵字起點, 關鍵字終點)
    let clauses: Vec<(usize, usize, usize)> = CLAUSE
        .captures_iter(sql)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let keyword = caps.get(1)?;
            Some((whole.start(), keyword.start(), keyword.end()))
        })
        .collect();

    let Some(&(first_start, _, _)) = clauses.first() else {
        return sql.to_string();
    };

    let mut out = String::with_capacity(sql.len() + clauses.len() * 8);
    out.push_str(&sql[..first_start]);

    for (i, &(_, kw_start, kw_end)) in clauses.iter().enumerate() {
        let body_end = clauses
            .get(i + 1)
            .map(|&(next_start, _, _)| next_start)
            .unwrap_or(sql.len());
        let keyword = &sql[kw_start..kw_end];
        let body = &sql[kw_end..body_end];

        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(keyword);

        if keyword.eq_ignore_ascii_case("SELECT") {
            out.push_str(&reflow_columns(body));
        } else {
            out.push_str(body);
        }
    }

    out
}

/// One select-list item per line, keeping DISTINCT/ALL on the SELECT line.
fn reflow_columns(body: &str) -> String {
    let (head, rest) = match SELECT_QUANTIFIER.find(body) {
        Some(m) => body.split_at(m.end()),
        None => ("", body),
    };

    let columns = rest.trim_start();
    let mut out = String::with_capacity(body.len() + 32);
    out.push_str(head);
    if columns.len() < rest.len() {
        out.push('\n');
        out.push_str(INDENT);
    }

    let mut last = 0;
    for (comma, ws_end) in parens::top_level_comma_breaks(columns) {
        out.push_str(&columns[last..=comma]);
        out.push('\n');
        out.push_str(INDENT);
        last = ws_end;
    }
    out.push_str(&columns[last..]);

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn non_whitespace(s: &str) -> String {
        s.chars().filter(|c| !c.is_whitespace()).collect()
    }

    #[test]
    fn test_basic_layout() {
        let sql = "SELECT a, b FROM t WHERE x = 1 AND y = 2 ORDER BY a";
        assert_eq!(
            pretty_print(sql),
            "SELECT\n    a,\n    b\nFROM t\nWHERE x = 1\n    AND y = 2\nORDER BY a"
        );
    }

    #[test]
    fn test_select_distinct_stays_on_select_line() {
        assert_eq!(
            pretty_print("select distinct a, b from t"),
            "select distinct\n    a,\n    b\nfrom t"
        );
    }

    #[test]
    fn test_set_operators() {
        assert_eq!(
            pretty_print("SELECT a FROM t UNION ALL SELECT a FROM u"),
            "SELECT\n    a\nFROM t\nUNION ALL\nSELECT\n    a\nFROM u"
        );
    }

    #[test]
    fn test_function_arguments_not_split() {
        assert_eq!(
            pretty_print("SELECT COALESCE(a, b), 'x, y' FROM t"),
            "SELECT\n    COALESCE(a, b),\n    'x, y'\nFROM t"
        );
    }

    #[test]
    fn test_compact_select_list_split() {
        assert_eq!(pretty_print("SELECT a,b FROM t"), "SELECT\n    a,\n    b\nFROM t");
        assert_eq!(
            pretty_print("SELECT a,COALESCE(b,c),'x,y' FROM t"),
            "SELECT\n    a,\n    COALESCE(b,c),\n    'x,y'\nFROM t"
        );
    }

    #[test]
    fn test_group_by_having() {
        assert_eq!(
            pretty_print("SELECT k, count(*) FROM t GROUP BY k HAVING count(*) > 1 OR k = 0"),
            "SELECT\n    k,\n    count(*)\nFROM t\nGROUP BY k\nHAVING count(*) > 1\n    OR k = 0"
        );
    }

    #[test]
    fn test_blank_lines_collapsed_and_trimmed() {
        let sql = "\n\n  UPDATE t SET a = 1\n\n\n\n  -- note\n";
        assert_eq!(pretty_print(sql), "UPDATE t SET a = 1\n\n  -- note");
    }

    #[test]
    fn test_tokens_preserved() {
        let inputs = [
            "SELECT a,b, c FROM t WHERE (SELECT max(x) FROM u) > 1 AND z OR w",
            "select * from t where a in (select b from u where c = 'FROM x')",
            "SELECT\tDISTINCT x , y\nFROM t\nEXCEPT SELECT x, y FROM v",
            "no clauses at all",
        ];
        for sql in inputs {
            assert_eq!(
                non_whitespace(&pretty_print(sql)),
                non_whitespace(sql),
                "input: {}",
                sql
            );
        }
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "SELECT a, b FROM t WHERE x = 1 AND y = 2 ORDER BY a",
            "select distinct a , b from t group by a, b having count(*) > 1",
            "SELECT a FROM t INTERSECT SELECT a FROM u",
            "SELECT x FROM t\n\n\n\nWHERE y = 1",
            "SELECT a,b,c FROM t",
        ];
        for sql in inputs {
            let once = pretty_print(sql);
            assert_eq!(pretty_print(&once), once, "input: {}", sql);
        }
    }
}
