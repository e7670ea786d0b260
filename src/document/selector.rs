use crate::utils::error::{MigrateError, Result};
use quick_xml::events::BytesStart;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifies an SQL-bearing element: `queryString` or
/// `property[name=queryText]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldSelector {
    pub element: String,
    pub attribute: Option<(String, String)>,
}

impl FieldSelector {
    pub fn element(name: &str) -> Self {
        Self {
            element: name.to_string(),
            attribute: None,
        }
    }

    pub fn with_attribute(name: &str, attr: &str, value: &str) -> Self {
        Self {
            element: name.to_string(),
            attribute: Some((attr.to_string(), value.to_string())),
        }
    }

    /// 以 local name 比對，忽略 namespace prefix
    pub fn matches(&self, start: &BytesStart<'_>) -> bool {
        if start.local_name().as_ref() != self.element.as_bytes() {
            return false;
        }

        let Some((attr_name, attr_value)) = &self.attribute else {
            return true;
        };

        start.attributes().flatten().any(|attr| {
            attr.key.local_name().as_ref() == attr_name.as_bytes()
                && attr
                    .unescape_value()
                    .map(|v| v == attr_value.as_str())
                    .unwrap_or(false)
        })
    }

    pub fn defaults() -> Vec<FieldSelector> {
        vec![
            Self::element("queryString"),
            Self::with_attribute("property", "name", "queryText"),
            Self::with_attribute("xml-property", "name", "queryText"),
        ]
    }
}

fn is_name(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':'))
}

impl FromStr for FieldSelector {
    type Err = MigrateError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| MigrateError::InvalidConfigValueError {
            field: "migration.sql_fields".to_string(),
            value: s.to_string(),
            reason: reason.to_string(),
        };

        let s = s.trim();
        let (element, predicate) = match s.find('[') {
            Some(open) => {
                let rest = s[open + 1..]
                    .strip_suffix(']')
                    .ok_or_else(|| invalid("missing closing ']'"))?;
                (&s[..open], Some(rest))
            }
            None => (s, None),
        };

        if !is_name(element) {
            return Err(invalid("element name must be a non-empty XML name"));
        }

        let attribute = match predicate {
            Some(predicate) => {
                let (attr, value) = predicate
                    .split_once('=')
                    .ok_or_else(|| invalid("attribute predicate must be attr=value"))?;
                let attr = attr.trim();
                let value = value.trim().trim_matches(|c: char| c == '"' || c == '\'');
                if !is_name(attr) || value.is_empty() {
                    return Err(invalid("attribute predicate must be attr=value"));
                }
                Some((attr.to_string(), value.to_string()))
            }
            None => None,
        };

        Ok(Self {
            element: element.to_string(),
            attribute,
        })
    }
}

impl TryFrom<String> for FieldSelector {
    type Error = MigrateError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<FieldSelector> for String {
    fn from(selector: FieldSelector) -> Self {
        selector.to_string()
    }
}

impl fmt::Display for FieldSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.attribute {
            Some((attr, value)) => write!(f, "{}[{}={}]", self.element, attr, value),
            None => write!(f, "{}", self.element),
        }
    }
}
