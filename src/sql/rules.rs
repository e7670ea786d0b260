//! Ordered DB2 to PostgreSQL rewrite rules.
//!
//! Every rule sees the output of the rule before it. The order in
//! [`RuleSet::standard`] is part of the behaviour: the sign-folded date
//! offset runs before the generic offset, and `CHAR()` over dates runs
//! before the generic `CHAR()` cast.

use super::parens;
use regex::{Captures, Regex};
use std::borrow::Cow;

/// One rewrite step. Text the rule does not match must come back borrowed.
pub trait Rule: Send + Sync {
    fn name(&self) -> &'static str;
    fn apply<'a>(&self, sql: &'a str) -> Cow<'a, str>;
}

/// A regex with a replacement built from its captures.
pub struct PatternRule {
    name: &'static str,
    pattern: Regex,
    replace: fn(&Captures) -> String,
}

impl PatternRule {
    pub fn new(
        name: &'static str,
        pattern: &str,
        replace: fn(&Captures) -> String,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            name,
            pattern: Regex::new(pattern)?,
            replace,
        })
    }
}

impl Rule for PatternRule {
    fn name(&self) -> &'static str {
        self.name
    }

    fn apply<'a>(&self, sql: &'a str) -> Cow<'a, str> {
        self.pattern
            .replace_all(sql, |caps: &Captures| (self.replace)(caps))
    }
}

/// A function-call rewrite such as `DATE(expr)`.
///
/// The argument list runs to the balancing `)`, so nested calls stay
/// intact. One left-to-right pass settles each call when its `)` is
/// reached, so calls of the same function inside the arguments are
/// rewritten first. Openers inside string literals are ignored. The
/// transform receives the trimmed top-level arguments and returns `None`
/// to leave the call as written.
pub struct CallRule {
    name: &'static str,
    opener: Regex,
    transform: fn(&[&str]) -> Option<String>,
}

impl CallRule {
    pub fn new(
        name: &'static str,
        function: &str,
        transform: fn(&[&str]) -> Option<String>,
    ) -> Result<Self, regex::Error> {
        let opener = Regex::new(&format!(r"(?i)\b{}\s*\(", regex::escape(function)))?;
        Ok(Self {
            name,
            opener,
            transform,
        })
    }
}

impl Rule for CallRule {
    fn name(&self) -> &'static str {
        self.name
    }

    fn apply<'a>(&self, sql: &'a str) -> Cow<'a, str> {
        let openers: Vec<(usize, usize)> = self
            .opener
            .find_iter(sql)
            .map(|m| (m.start(), m.end()))
            .collect();
        if openers.is_empty() {
            return Cow::Borrowed(sql);
        }

        let bytes = sql.as_bytes();
        let mut out = String::with_capacity(sql.len());
        // 每個未閉合的 `(`：呼叫為 Some((輸出起點, 參數起點))，一般括號為 None
        let mut open: Vec<Option<(usize, usize)>> = Vec::new();
        let mut next = 0;
        let mut changed = false;
        let mut i = 0;

        while i < sql.len() {
            while next < openers.len() && openers[next].0 < i {
                next += 1;
            }
            if let Some(&(start, end)) = openers.get(next).filter(|(start, _)| *start == i) {
                let call_start = out.len();
                out.push_str(&sql[start..end]);
                open.push(Some((call_start, out.len())));
                next += 1;
                i = end;
                continue;
            }

            match bytes[i] {
                b'\'' => {
                    let end = parens::skip_literal(sql, i);
                    out.push_str(&sql[i..end]);
                    i = end;
                }
                b'(' => {
                    open.push(None);
                    out.push('(');
                    i += 1;
                }
                b')' => {
                    let replacement = match open.pop() {
                        Some(Some((call_start, args_start))) => {
                            let args = parens::split_args(&out[args_start..]);
                            (self.transform)(&args).map(|r| (call_start, r))
                        }
                        _ => None,
                    };
                    match replacement {
                        Some((call_start, replacement)) => {
                            out.truncate(call_start);
                            out.push_str(&replacement);
                            changed = true;
                        }
                        None => out.push(')'),
                    }
                    i += 1;
                }
                _ => {
                    let len = sql[i..].chars().next().map_or(1, char::len_utf8);
                    out.push_str(&sql[i..i + len]);
                    i += len;
                }
            }
        }

        // 未閉合的呼叫已原樣寫出
        if changed {
            Cow::Owned(out)
        } else {
            Cow::Borrowed(sql)
        }
    }
}

/// An ordered list of rules applied as a pipeline.
#[derive(Default)]
pub struct RuleSet {
    rules: Vec<Box<dyn Rule>>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule(mut self, rule: impl Rule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// The full DB2 to PostgreSQL catalog, in application order.
    pub fn standard() -> Self {
        build_standard().expect("built-in rewrite patterns are valid")
    }

    pub fn rewrite(&self, sql: &str) -> String {
        let mut current = sql.to_string();

        for rule in &self.rules {
            let next = match rule.apply(&current) {
                Cow::Borrowed(_) => None,
                Cow::Owned(rewritten) => Some(rewritten),
            };
            if let Some(next) = next {
                tracing::trace!(rule = rule.name(), "rule applied");
                current = next;
            }
        }

        current
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn build_standard() -> Result<RuleSet, regex::Error> {
    Ok(RuleSet::new()
        .with_rule(PatternRule::new(
            "isolation-hint",
            r"(?i)\s+WITH\s+(?:UR|CS|RS|RR)\b(\s*;)?\s*$",
            |caps| caps.get(1).map(|_| ";".to_string()).unwrap_or_default(),
        )?)
        .with_rule(PatternRule::new(
            "date-offset-sign-fold",
            r"(?i)\bCURRENT(?:_|\s+)DATE\s*\+\s*-\s*(\d+)\s*(DAY|MONTH|YEAR)S?\b",
            |caps| {
                format!(
                    "current_date - INTERVAL '{} {}'",
                    &caps[1],
                    caps[2].to_ascii_lowercase()
                )
            },
        )?)
        .with_rule(PatternRule::new(
            "date-offset",
            r"(?i)\bCURRENT(?:_|\s+)DATE\s*([+-])\s*(\d+)\s*(DAY|MONTH|YEAR)S?\b",
            |caps| {
                format!(
                    "current_date {} INTERVAL '{} {}'",
                    &caps[1],
                    &caps[2],
                    caps[3].to_ascii_lowercase()
                )
            },
        )?)
        .with_rule(PatternRule::new(
            "current-timestamp",
            r"(?i)\bCURRENT\s+TIMESTAMP\b",
            |_| "now()".to_string(),
        )?)
        .with_rule(CallRule::new("date-cast", "DATE", |args| {
            single(args).map(|expr| format!("({})::date", expr))
        })?)
        .with_rule(CallRule::new("timestamp-cast", "TIMESTAMP", |args| {
            single(args).map(|expr| format!("({})::timestamp", expr))
        })?)
        .with_rule(CallRule::new("integer-cast", "INTEGER", |args| {
            single(args).map(|expr| format!("CAST({} AS integer)", expr))
        })?)
        .with_rule(CallRule::new("bigint-cast", "BIGINT", |args| {
            single(args).map(|expr| format!("CAST({} AS bigint)", expr))
        })?)
        .with_rule(CallRule::new("double-cast", "DOUBLE", |args| {
            single(args).map(|expr| format!("CAST({} AS double precision)", expr))
        })?)
        .with_rule(CallRule::new("decimal-cast", "DECIMAL", decimal_cast)?)
        .with_rule(CallRule::new("varchar-format", "VARCHAR_FORMAT", varchar_format)?)
        .with_rule(CallRule::new("char-date", "CHAR", |args| {
            single(args)
                .filter(|expr| mentions_temporal(expr))
                .map(|expr| format!("to_char({}, 'YYYY-MM-DD')", expr))
        })?)
        .with_rule(CallRule::new("char-cast", "CHAR", |args| {
            single(args).map(|expr| format!("CAST({} AS char)", expr))
        })?))
}

fn single<'a>(args: &[&'a str]) -> Option<&'a str> {
    match args {
        [expr] if !expr.is_empty() => Some(*expr),
        _ => None,
    }
}

fn mentions_temporal(expr: &str) -> bool {
    let lower = expr.to_ascii_lowercase();
    lower.contains("date") || lower.contains("timestamp")
}

fn is_integer_literal(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn is_string_literal(s: &str) -> bool {
    s.len() >= 2 && s.starts_with('\'') && s.ends_with('\'')
}

fn decimal_cast(args: &[&str]) -> Option<String> {
    match args {
        [expr, precision, scale]
            if !expr.is_empty() && is_integer_literal(precision) && is_integer_literal(scale) =>
        {
            Some(format!("CAST({} AS numeric({},{}))", expr, precision, scale))
        }
        _ => None,
    }
}

fn varchar_format(args: &[&str]) -> Option<String> {
    match args {
        [expr, fmt] if !expr.is_empty() && is_string_literal(fmt) => {
            Some(format!("to_char({}, {})", expr, fmt))
        }
        _ => None,
    }
}
