//! XML ingestion.
//!
//! Rows are either every element named [`XmlOptions::row_tag`], or the most repeated child tag
//! under the document root (descending through single-child wrappers such as
//! `<export><records><record/>...</records></export>`).

use indexmap::IndexMap;
use roxmltree::{Document, Node, ParsingOptions};

use crate::error::{IngestionError, IngestionResult};
use crate::types::{FileType, ParsedData, Record, Value};

use super::normalize::{finish, union_headers};

/// Deepest element nesting accepted. roxmltree and the record builder recurse once per level.
pub const MAX_XML_DEPTH: usize = 256;

/// Options for XML documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlOptions {
    /// Local tag name of the row elements, matched anywhere in the document.
    pub row_tag: Option<String>,
    /// Prefix prepended to attribute names to form field names.
    pub attribute_prefix: String,
}

impl Default for XmlOptions {
    fn default() -> Self {
        Self {
            row_tag: None,
            attribute_prefix: "@".to_string(),
        }
    }
}

/// Parse XML bytes (UTF-8).
pub fn parse_xml(bytes: &[u8], file_name: &str, options: &XmlOptions) -> IngestionResult<ParsedData> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| IngestionError::parse(FileType::Xml, format!("Invalid XML format: {e}")))?;
    parse_xml_str(text, file_name, options)
}

/// Parse XML from an in-memory string.
pub fn parse_xml_str(input: &str, file_name: &str, options: &XmlOptions) -> IngestionResult<ParsedData> {
    if exceeds_depth(input, MAX_XML_DEPTH) {
        return Err(IngestionError::parse(FileType::Xml, "Invalid XML format: nesting too deep"));
    }

    let mut parsing = ParsingOptions::default();
    parsing.allow_dtd = true;

    let doc = Document::parse_with_options(input, parsing)
        .map_err(|e| IngestionError::parse(FileType::Xml, format!("Invalid XML format: {e}")))?;

    let row_elements: Vec<Node> = match options.row_tag.as_deref() {
        Some(tag) => doc
            .descendants()
            .filter(|n| n.is_element() && n.tag_name().name() == tag)
            .collect(),
        None => find_repeated(doc.root_element()),
    };

    if row_elements.is_empty() {
        return Err(IngestionError::parse(FileType::Xml, "No data rows found in XML"));
    }

    let rows: Vec<Record> = row_elements
        .iter()
        .map(|el| element_to_record(*el, &options.attribute_prefix))
        .collect();
    let headers = union_headers(&rows);

    Ok(finish(file_name, FileType::Xml, headers, rows))
}

/// Scan markup without building a tree and report whether element nesting goes past `limit`.
///
/// Comments, CDATA, processing instructions and declarations are skipped. Malformed markup is
/// left for the real parser to reject.
fn exceeds_depth(input: &str, limit: usize) -> bool {
    let bytes = input.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;

    while let Some(start) = find(bytes, i, b"<") {
        let rest = &bytes[start..];
        i = if rest.starts_with(b"<!--") {
            skip_past(bytes, start + 4, b"-->")
        } else if rest.starts_with(b"<![CDATA[") {
            skip_past(bytes, start + 9, b"]]>")
        } else if rest.starts_with(b"<?") {
            skip_past(bytes, start + 2, b"?>")
        } else if rest.starts_with(b"<!") {
            declaration_end(bytes, start + 2)
        } else if rest.starts_with(b"</") {
            depth = depth.saturating_sub(1);
            skip_past(bytes, start + 2, b">")
        } else {
            let end = tag_end(bytes, start + 1);
            if bytes.get(end - 1) != Some(&b'/') {
                depth += 1;
                if depth > limit {
                    return true;
                }
            }
            end + 1
        };
    }
    false
}

fn find(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    bytes
        .get(from..)?
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| from + p)
}

fn skip_past(bytes: &[u8], from: usize, needle: &[u8]) -> usize {
    find(bytes, from, needle).map_or(bytes.len(), |p| p + needle.len())
}

/// Index of the `>` closing a start tag, ignoring any inside quoted attribute values.
fn tag_end(bytes: &[u8], from: usize) -> usize {
    let mut quote = None;
    for (i, &b) in bytes.iter().enumerate().skip(from) {
        match (quote, b) {
            (Some(q), _) if b == q => quote = None,
            (Some(_), _) => {}
            (None, b'"' | b'\'') => quote = Some(b),
            (None, b'>') => return i,
            _ => {}
        }
    }
    bytes.len()
}

/// Position just past a `<!DOCTYPE ...>` style declaration, including an internal subset.
fn declaration_end(bytes: &[u8], from: usize) -> usize {
    let mut brackets = 0usize;
    let mut quote = None;
    for (i, &b) in bytes.iter().enumerate().skip(from) {
        match (quote, b) {
            (Some(q), _) if b == q => quote = None,
            (Some(_), _) => {}
            (None, b'"' | b'\'') => quote = Some(b),
            (None, b'[') => brackets += 1,
            (None, b']') => brackets = brackets.saturating_sub(1),
            (None, b'>') if brackets == 0 => return i + 1,
            _ => {}
        }
    }
    bytes.len()
}

fn child_elements<'a, 'input>(node: Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(Node::is_element)
}

/// The most frequent child tag under `root`; ties go to the tag seen first.
fn find_repeated<'a, 'input>(root: Node<'a, 'input>) -> Vec<Node<'a, 'input>> {
    let mut by_tag: IndexMap<&str, Vec<Node>> = IndexMap::new();
    for child in child_elements(root) {
        by_tag.entry(child.tag_name().name()).or_default().push(child);
    }

    let mut best: Vec<Node> = Vec::new();
    for (_, nodes) in by_tag {
        if nodes.len() > best.len() {
            best = nodes;
        }
    }

    if best.len() == 1 && child_elements(root).count() == 1 {
        return find_repeated(best[0]);
    }
    best
}

fn element_to_record(element: Node, prefix: &str) -> Record {
    let mut record = Record::new();

    for attr in element.attributes() {
        record.insert(format!("{prefix}{}", attr.name()), Value::Text(attr.value().to_string()));
    }

    for child in child_elements(element) {
        let key = child.tag_name().name().to_string();
        let grandchildren: Vec<Node> = child_elements(child).collect();

        let value = if grandchildren.is_empty() {
            Value::Text(text_content(child).trim().to_string())
        } else {
            let first_tag = grandchildren[0].tag_name().name();
            let uniform = grandchildren.iter().all(|g| g.tag_name().name() == first_tag);
            if uniform && grandchildren.len() > 1 {
                Value::List(
                    grandchildren
                        .iter()
                        .map(|g| {
                            if child_elements(*g).next().is_some() {
                                Value::Object(element_to_record(*g, prefix))
                            } else {
                                Value::Text(text_content(*g).trim().to_string())
                            }
                        })
                        .collect(),
                )
            } else {
                Value::Object(element_to_record(child, prefix))
            }
        };
        record.insert(key, value);
    }

    if record.is_empty() {
        let text = text_content(element);
        if !text.is_empty() {
            record.insert("value".to_string(), Value::Text(text.trim().to_string()));
        }
    }
    record
}

/// Concatenated text of every descendant text node.
fn text_content(node: Node) -> String {
    node.descendants()
        .filter(Node::is_text)
        .filter_map(|n| n.text())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attributes_use_prefix() {
        let xml = r#"<items><item id="1"><n>a</n></item><item id="2"><n>b</n></item></items>"#;
        let opts = XmlOptions {
            attribute_prefix: "_".to_string(),
            ..Default::default()
        };
        let data = parse_xml_str(xml, "x.xml", &opts).unwrap();
        assert_eq!(data.headers, vec!["_id", "n"]);
        assert_eq!(data.rows[1]["_id"], Value::from("2"));
    }

    #[test]
    fn uniform_children_become_lists_and_mixed_become_objects() {
        let xml = r#"<r>
            <row><tags><t>x</t><t>y</t></tags><addr><city>Oslo</city><zip>1</zip></addr></row>
            <row><tags><t>z</t></tags></row>
        </r>"#;
        let data = parse_xml_str(xml, "x.xml", &XmlOptions::default()).unwrap();

        assert_eq!(data.rows[0]["tags"], Value::List(vec!["x".into(), "y".into()]));
        let Value::Object(addr) = &data.rows[0]["addr"] else {
            panic!("addr should be an object");
        };
        assert_eq!(addr["city"], Value::from("Oslo"));
        // A single child is a nested object, not a one-element list.
        let Value::Object(tags) = &data.rows[1]["tags"] else {
            panic!("tags should be an object");
        };
        assert_eq!(tags["t"], Value::from("z"));
    }

    #[test]
    fn single_child_wrappers_are_descended() {
        let xml = "<export><records><rec>1</rec><rec>2</rec><meta>m</meta></records></export>";
        let data = parse_xml_str(xml, "x.xml", &XmlOptions::default()).unwrap();
        assert_eq!(data.headers, vec!["value"]);
        assert_eq!(data.row_count, 2);
    }

    #[test]
    fn row_tag_matches_descendants() {
        let xml = "<a><b><row><v>1</v></row></b><row><v>2</v></row></a>";
        let opts = XmlOptions {
            row_tag: Some("row".to_string()),
            ..Default::default()
        };
        let data = parse_xml_str(xml, "x.xml", &opts).unwrap();
        assert_eq!(data.row_count, 2);
    }

    #[test]
    fn malformed_and_empty_documents_fail() {
        let err = parse_xml_str("<a><b></a>", "x.xml", &XmlOptions::default()).unwrap_err();
        assert!(err.to_string().contains("Invalid XML format"));

        let err = parse_xml_str("<a/>", "x.xml", &XmlOptions::default()).unwrap_err();
        assert_eq!(err.to_string(), "No data rows found in XML");
    }

    fn deeply_nested(levels: usize) -> String {
        format!(
            "<r><row>{}x{}</row><row><a>1</a></row></r>",
            "<n>".repeat(levels),
            "</n>".repeat(levels)
        )
    }

    #[test]
    fn deep_nesting_is_rejected_before_parsing() {
        let xml = deeply_nested(5000);

        let err = parse_xml_str(&xml, "deep.xml", &XmlOptions::default()).unwrap_err();
        assert_eq!(err.to_string(), "Invalid XML format: nesting too deep");

        let opts = XmlOptions {
            row_tag: Some("a".to_string()),
            ..Default::default()
        };
        let err = parse_xml(xml.as_bytes(), "deep.xml", &opts).unwrap_err();
        assert_eq!(err.to_string(), "Invalid XML format: nesting too deep");
    }

    #[test]
    fn nesting_up_to_the_limit_parses() {
        // `r` and `row` add two levels on top of the `n` chain.
        let opts = XmlOptions::default();
        let data = parse_xml_str(&deeply_nested(MAX_XML_DEPTH - 2), "deep.xml", &opts).unwrap();
        assert_eq!(data.row_count, 2);

        let err = parse_xml_str(&deeply_nested(MAX_XML_DEPTH - 1), "deep.xml", &opts).unwrap_err();
        assert_eq!(err.to_string(), "Invalid XML format: nesting too deep");
    }

    #[test]
    fn depth_scan_ignores_non_element_markup() {
        let xml = r#"<?xml version="1.0"?><!DOCTYPE r [<!ENTITY e "<x>">]><a><!-- <b><c> --><d/><![CDATA[<e><f>]]><g k="1>2"></g><h /></a>"#;
        assert!(!exceeds_depth(xml, 2));
        assert!(exceeds_depth(xml, 1));
        assert!(!exceeds_depth("<a><b></b><c></c></a>", 2));
        assert!(exceeds_depth("<a><b><c/></b></a>", 1));
    }
}
