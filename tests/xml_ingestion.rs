use tabular_ingest::ingestion::xml::{parse_xml, parse_xml_str, XmlOptions};
use tabular_ingest::ingestion::{ingest_from_path, IngestionOptions};
use tabular_ingest::types::{FileType, Value};

#[test]
fn repeated_elements_become_rows() {
    let xml = "<root><item><name>A</name><v>1</v></item><item><name>B</name><v>2</v></item></root>";
    let data = parse_xml_str(xml, "items.xml", &XmlOptions::default()).unwrap();

    assert_eq!(data.file_type, FileType::Xml);
    assert_eq!(data.headers, vec!["name", "v"]);
    assert_eq!(data.row_count, 2);
    assert_eq!(data.rows[0]["name"], Value::from("A"));
    assert_eq!(data.rows[1]["v"], Value::from("2"));
}

#[test]
fn minimal_repeated_item_document() {
    let xml = "<root><item><x>1</x></item><item><x>2</x></item></root>";
    let data = parse_xml_str(xml, "x.xml", &XmlOptions::default()).unwrap();

    assert_eq!(data.headers, vec!["x"]);
    assert_eq!(data.raw_data, vec![vec![Value::from("1")], vec![Value::from("2")]]);
}

#[test]
fn ingest_xml_from_path_with_attributes() {
    let data = ingest_from_path("tests/fixtures/catalog.xml", &IngestionOptions::default()).unwrap();

    // `book` outnumbers the single `publisher` element.
    assert_eq!(data.row_count, 3);
    assert_eq!(data.headers, vec!["@id", "@lang", "author", "title", "price"]);
    assert_eq!(data.rows[0]["@lang"], Value::from("en"));
    assert_eq!(data.raw_data[1][1], Value::Null);
    assert_eq!(data.rows[2]["title"], Value::from("Maeve Ascendant"));
}

#[test]
fn text_is_trimmed_and_empty_leaves_are_empty_strings() {
    let xml = "<r><row><a>  padded  </a><b/></row><row><a>x</a><b></b></row></r>";
    let data = parse_xml_str(xml, "x.xml", &XmlOptions::default()).unwrap();

    assert_eq!(data.rows[0]["a"], Value::from("padded"));
    assert_eq!(data.rows[0]["b"], Value::from(""));
}

#[test]
fn ties_go_to_first_seen_tag() {
    let xml = "<r><a><v>1</v></a><b><w>2</w></b><a><v>3</v></a><b><w>4</w></b></r>";
    let data = parse_xml_str(xml, "x.xml", &XmlOptions::default()).unwrap();
    assert_eq!(data.headers, vec!["v"]);
}

#[test]
fn row_tag_overrides_detection() {
    let xml = "<r><a><v>1</v></a><a><v>2</v></a><b><w>9</w></b></r>";
    let opts = XmlOptions {
        row_tag: Some("b".to_string()),
        ..Default::default()
    };
    let data = parse_xml_str(xml, "x.xml", &opts).unwrap();
    assert_eq!(data.headers, vec!["w"]);
    assert_eq!(data.row_count, 1);
}

#[test]
fn invalid_documents_fail() {
    let opts = XmlOptions::default();

    let err = parse_xml(b"<open>", "x.xml", &opts).unwrap_err();
    assert!(err.to_string().contains("Invalid XML format"));

    let opts = XmlOptions {
        row_tag: Some("missing".to_string()),
        ..Default::default()
    };
    let err = parse_xml_str("<r><a/></r>", "x.xml", &opts).unwrap_err();
    assert_eq!(err.to_string(), "No data rows found in XML");
}
