//! SQL field rewriting inside report XML.
//!
//! The document is streamed reader-to-writer. Only the content of matched
//! fields is replaced; every other event is passed through as read.

pub mod selector;

pub use selector::FieldSelector;

use crate::domain::model::FragmentChange;
use crate::utils::error::{MigrateError, Result};
use quick_xml::escape;
use quick_xml::events::{BytesCData, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::path::Path;

const BOM: &str = "\u{feff}";

#[derive(Debug, Clone)]
pub struct FieldRewrite {
    pub content: String,
    pub changes: Vec<FragmentChange>,
}

impl FieldRewrite {
    pub fn is_changed(&self) -> bool {
        !self.changes.is_empty()
    }
}

/// Runs `transform` over every SQL field matched by `selectors`.
///
/// Leading and trailing whitespace of a field is kept outside the
/// transform. Fields holding child elements or comments are left alone.
/// A changed field stays CDATA if it was CDATA (or `prefer_cdata` is set),
/// otherwise it is written as escaped text. When nothing changes the
/// input comes back untouched.
pub fn rewrite_fields<F>(
    path: &Path,
    xml: &str,
    selectors: &[FieldSelector],
    prefer_cdata: bool,
    mut transform: F,
) -> Result<FieldRewrite>
where
    F: FnMut(&str) -> String,
{
    let (bom, body) = match xml.strip_prefix(BOM) {
        Some(rest) => (BOM, rest),
        None => ("", xml),
    };

    let mut reader = Reader::from_str(body);
    let mut writer = Writer::new(Vec::with_capacity(body.len() + 64));
    let mut changes = Vec::new();
    let mut depth = 0usize;
    let mut seen = 0usize;
    let mut open: Option<OpenField<'_>> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            MigrateError::xml(path, format!("at byte {}: {}", reader.buffer_position(), e))
        })?;

        match event {
            Event::Eof => break,
            Event::Start(ref start) => {
                depth += 1;
                match open.as_mut() {
                    Some(field) => field.make_opaque(&mut writer, path)?,
                    None => {
                        if let Some(selector) = selectors.iter().find(|s| s.matches(start)) {
                            open = Some(OpenField::new(selector.to_string(), seen, depth));
                            seen += 1;
                        }
                    }
                }
                emit(&mut writer, path, event)?;
            }
            Event::End(_) => {
                if let Some(field) = open.take() {
                    if field.depth == depth {
                        field.finish(&mut writer, path, prefer_cdata, &mut transform, &mut changes)?;
                    } else {
                        open = Some(field);
                    }
                }
                depth = depth.saturating_sub(1);
                emit(&mut writer, path, event)?;
            }
            Event::Text(_) | Event::CData(_) if open.as_ref().is_some_and(|f| !f.opaque) => {
                if let Some(field) = open.as_mut() {
                    field.parts.push(event);
                }
            }
            _ => {
                if let Some(field) = open.as_mut() {
                    field.make_opaque(&mut writer, path)?;
                }
                emit(&mut writer, path, event)?;
            }
        }
    }

    if depth != 0 {
        return Err(MigrateError::xml(
            path,
            "unexpected end of document: unclosed element",
        ));
    }

    if changes.is_empty() {
        return Ok(FieldRewrite {
            content: xml.to_string(),
            changes,
        });
    }

    let written = String::from_utf8(writer.into_inner()).map_err(|e| MigrateError::xml(path, e))?;
    Ok(FieldRewrite {
        content: format!("{}{}", bom, written),
        changes,
    })
}

struct OpenField<'a> {
    name: String,
    index: usize,
    depth: usize,
    parts: Vec<Event<'a>>,
    opaque: bool,
}

impl<'a> OpenField<'a> {
    fn new(name: String, index: usize, depth: usize) -> Self {
        Self {
            name,
            index,
            depth,
            parts: Vec::new(),
            opaque: false,
        }
    }

    /// 欄位含子元素或註解時，緩衝內容原樣寫出
    fn make_opaque(&mut self, writer: &mut Writer<Vec<u8>>, path: &Path) -> Result<()> {
        for part in self.parts.drain(..) {
            emit(writer, path, part)?;
        }
        self.opaque = true;
        Ok(())
    }

    fn finish<F>(
        mut self,
        writer: &mut Writer<Vec<u8>>,
        path: &Path,
        prefer_cdata: bool,
        transform: &mut F,
        changes: &mut Vec<FragmentChange>,
    ) -> Result<()>
    where
        F: FnMut(&str) -> String,
    {
        if self.opaque || self.parts.is_empty() {
            return Ok(());
        }

        // 前後的縮排文字節點保持原樣，只處理中間內容
        let first = self.parts.iter().position(|p| !is_blank_text(p));
        let last = self.parts.iter().rposition(|p| !is_blank_text(p));
        let (Some(first), Some(last)) = (first, last) else {
            return self.make_opaque(writer, path);
        };

        let (raw, was_cdata) = match decode(&self.parts[first..=last]) {
            Ok(decoded) => decoded,
            Err(reason) => {
                tracing::warn!(
                    "⚠️ Skipping field {} #{} in {}: {}",
                    self.name,
                    self.index,
                    path.display(),
                    reason
                );
                return self.make_opaque(writer, path);
            }
        };

        let sql = raw.trim();
        let converted = if sql.is_empty() {
            None
        } else {
            Some(transform(sql)).filter(|after| after != sql)
        };

        let Some(after) = converted else {
            return self.make_opaque(writer, path);
        };

        let lead = &raw[..raw.len() - raw.trim_start().len()];
        let trail = &raw[raw.trim_end().len()..];
        let text = format!("{}{}{}", lead, after, trail);
        let as_cdata = (was_cdata || prefer_cdata) && !text.contains("]]>");

        let mut parts = std::mem::take(&mut self.parts);
        let trailing = parts.split_off(last + 1);
        parts.truncate(first);

        for part in parts {
            emit(writer, path, part)?;
        }
        let event = if as_cdata {
            Event::CData(BytesCData::new(text.as_str()))
        } else {
            Event::Text(BytesText::from_escaped(escape::partial_escape(text.as_str())))
        };
        emit(writer, path, event)?;
        for part in trailing {
            emit(writer, path, part)?;
        }

        changes.push(FragmentChange {
            field: self.name,
            index: self.index,
            before: sql.to_string(),
            after,
            cdata: as_cdata,
        });
        Ok(())
    }
}

fn is_blank_text(event: &Event<'_>) -> bool {
    matches!(event, Event::Text(text) if text.iter().all(|b| b.is_ascii_whitespace()))
}

/// Joins the field's text and CDATA parts. Text is XML-unescaped.
fn decode(parts: &[Event<'_>]) -> std::result::Result<(String, bool), String> {
    let mut raw = String::new();
    let mut cdata = false;

    for part in parts {
        match part {
            Event::Text(text) => {
                let escaped = String::from_utf8_lossy(text);
                let unescaped = escape::unescape(&escaped).map_err(|e| e.to_string())?;
                raw.push_str(&unescaped);
            }
            Event::CData(data) => {
                cdata = true;
                raw.push_str(&String::from_utf8_lossy(data));
            }
            _ => {}
        }
    }

    Ok((raw, cdata))
}

fn emit(writer: &mut Writer<Vec<u8>>, path: &Path, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| MigrateError::xml(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upper(sql: &str) -> String {
        sql.to_uppercase()
    }

    fn run(xml: &str) -> FieldRewrite {
        rewrite_fields(
            Path::new("test.jrxml"),
            xml,
            &FieldSelector::defaults(),
            false,
            crate::sql::rewrite,
        )
        .unwrap()
    }

    #[test]
    fn test_cdata_field_stays_cdata() {
        let xml = "<jasperReport>\n  <queryString><![CDATA[\n    SELECT * FROM t WITH UR\n  ]]></queryString>\n</jasperReport>";
        let result = run(xml);

        assert_eq!(
            result.content,
            "<jasperReport>\n  <queryString><![CDATA[\n    SELECT * FROM t\n  ]]></queryString>\n</jasperReport>"
        );
        assert_eq!(result.changes.len(), 1);
        assert_eq!(result.changes[0].before, "SELECT * FROM t WITH UR");
        assert_eq!(result.changes[0].after, "SELECT * FROM t");
        assert!(result.changes[0].cdata);
    }

    #[test]
    fn test_indentation_around_cdata_kept_outside() {
        let xml = "<r>\n  <queryString>\n    <![CDATA[SELECT * FROM t WITH UR]]>\n  </queryString>\n</r>";
        let result = run(xml);

        assert_eq!(
            result.content,
            "<r>\n  <queryString>\n    <![CDATA[SELECT * FROM t]]>\n  </queryString>\n</r>"
        );
        assert!(result.changes[0].cdata);
    }

    #[test]
    fn test_text_field_is_unescaped_and_reescaped() {
        let xml = r#"<report><property name="queryText">SELECT a FROM t WHERE DATE(x) &lt; CURRENT TIMESTAMP AND b = 'y'</property></report>"#;
        let result = run(xml);

        assert_eq!(
            result.content,
            r#"<report><property name="queryText">SELECT a FROM t WHERE (x)::date &lt; now() AND b = 'y'</property></report>"#
        );
        assert!(!result.changes[0].cdata);
        assert_eq!(
            result.changes[0].after,
            "SELECT a FROM t WHERE (x)::date < now() AND b = 'y'"
        );
    }

    #[test]
    fn test_prefer_cdata_wraps_changed_text_fields() {
        let xml = "<r><queryString>SELECT CHAR(code) FROM t</queryString></r>";
        let result = rewrite_fields(
            Path::new("r.xml"),
            xml,
            &FieldSelector::defaults(),
            true,
            crate::sql::rewrite,
        )
        .unwrap();

        assert_eq!(
            result.content,
            "<r><queryString><![CDATA[SELECT CAST(code AS char) FROM t]]></queryString></r>"
        );
    }

    #[test]
    fn test_unchanged_document_returned_verbatim() {
        let xml = "<?xml version=\"1.0\"?>\n<r>\n  <queryString>SELECT 1</queryString>\n  <other>DATE(x)</other>\n</r>\n";
        let result = run(xml);

        assert!(!result.is_changed());
        assert_eq!(result.content, xml);
    }

    #[test]
    fn test_unmatched_elements_and_attributes_untouched() {
        let xml = r#"<r a="DATE(x)"><property name="dataSource">DATE(x)</property><queryString>DATE(y)</queryString></r>"#;
        let result = run(xml);

        assert_eq!(
            result.content,
            r#"<r a="DATE(x)"><property name="dataSource">DATE(x)</property><queryString>(y)::date</queryString></r>"#
        );
        assert_eq!(result.changes[0].index, 0);
        assert_eq!(result.changes[0].field, "queryString");
    }

    #[test]
    fn test_field_with_children_left_alone() {
        let xml = "<r><queryString>DATE(a)<!-- keep -->DATE(b)</queryString><queryString>upper</queryString></r>";
        let result = rewrite_fields(
            Path::new("r.xml"),
            xml,
            &[FieldSelector::element("queryString")],
            false,
            upper,
        )
        .unwrap();

        assert_eq!(
            result.content,
            "<r><queryString>DATE(a)<!-- keep -->DATE(b)</queryString><queryString>UPPER</queryString></r>"
        );
        assert_eq!(result.changes.len(), 1);
        assert_eq!(result.changes[0].index, 1);
    }

    #[test]
    fn test_bom_preserved() {
        let xml = "\u{feff}<r><queryString>select 1</queryString></r>";
        let result = rewrite_fields(
            Path::new("r.xml"),
            xml,
            &[FieldSelector::element("queryString")],
            false,
            upper,
        )
        .unwrap();

        assert_eq!(result.content, "\u{feff}<r><queryString>SELECT 1</queryString></r>");
    }

    #[test]
    fn test_cdata_terminator_falls_back_to_text() {
        let xml = "<r><queryString><![CDATA[x]]></queryString></r>";
        let result = rewrite_fields(
            Path::new("r.xml"),
            xml,
            &[FieldSelector::element("queryString")],
            false,
            |_| "a ]]> b".to_string(),
        )
        .unwrap();

        assert_eq!(
            result.content,
            "<r><queryString>a ]]&gt; b</queryString></r>"
        );
        assert!(!result.changes[0].cdata);
    }

    #[test]
    fn test_malformed_document_is_an_error() {
        let err = rewrite_fields(
            Path::new("broken.jrxml"),
            "<r><queryString>DATE(x)</r>",
            &FieldSelector::defaults(),
            false,
            crate::sql::rewrite,
        )
        .unwrap_err();
        assert!(matches!(err, MigrateError::XmlError { .. }));

        let unclosed = rewrite_fields(
            Path::new("broken.jrxml"),
            "<r><queryString>DATE(x)</queryString>",
            &FieldSelector::defaults(),
            false,
            crate::sql::rewrite,
        );
        assert!(unclosed.is_err());
    }
}
