//! SQL fragment conversion: the ordered rewrite rules, plus the optional
//! layout pass that runs after them.
//!
//! Both passes are total. Anything a rule does not recognise comes back
//! unchanged, so neither function can fail.

pub mod parens;
pub mod pretty;
pub mod rules;

pub use pretty::pretty_print;
pub use rules::{CallRule, PatternRule, Rule, RuleSet};

use std::sync::LazyLock;

static STANDARD_RULES: LazyLock<RuleSet> = LazyLock::new(RuleSet::standard);

/// The shared DB2 to PostgreSQL rule set.
pub fn standard_rules() -> &'static RuleSet {
    &STANDARD_RULES
}

/// Rewrites DB2 constructs in `sql` to their PostgreSQL equivalents.
///
/// ```
/// assert_eq!(
///     report_sql_migrate::sql::rewrite("SELECT * FROM t WITH UR"),
///     "SELECT * FROM t"
/// );
/// ```
pub fn rewrite(sql: &str) -> String {
    STANDARD_RULES.rewrite(sql)
}

/// Rewrite, then lay out when `format` is set.
pub fn convert(sql: &str, format: bool) -> String {
    let rewritten = rewrite(sql);
    if format {
        pretty_print(&rewritten)
    } else {
        rewritten
    }
}
