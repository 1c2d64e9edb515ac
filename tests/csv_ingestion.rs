use tabular_ingest::ingestion::csv::{parse_csv, parse_csv_from_reader, parse_tsv, CsvOptions, EXTRA_FIELDS_KEY};
use tabular_ingest::ingestion::{ingest_from_path, IngestionOptions};
use tabular_ingest::processing::{aggregate, AggregationType};
use tabular_ingest::types::{FileType, Value};

#[test]
fn ingest_csv_from_path_happy_path() {
    let data = ingest_from_path("tests/fixtures/people.csv", &IngestionOptions::default()).unwrap();

    assert_eq!(data.file_name, "people.csv");
    assert_eq!(data.file_type, FileType::Csv);
    assert_eq!(data.headers, vec!["id", "name", "score", "active"]);
    // The blank line between rows is skipped.
    assert_eq!(data.row_count, 3);
    assert_eq!(
        data.raw_data[0],
        vec![
            Value::Number(1.0),
            Value::from("Ada"),
            Value::Number(98.5),
            Value::Bool(true),
        ]
    );
    assert_eq!(data.rows[2]["score"], Value::Null);
    assert_eq!(data.rows[2]["active"], Value::Bool(true));
}

#[test]
fn row_count_matches_non_blank_data_lines() {
    let input = "a,b\n1,2\n\n3,4\n5,6\n\n";
    let data = parse_csv(input.as_bytes(), "x.csv", &CsvOptions::default()).unwrap();
    assert_eq!(data.row_count, 3);
    assert_eq!(data.rows.len(), data.row_count);
    assert_eq!(data.raw_data.len(), data.row_count);
}

#[test]
fn scores_group_and_sum_in_first_appearance_order() {
    let input = "name,score\nA,10\nB,20\nA,5\n";
    let data = parse_csv(input.as_bytes(), "scores.csv", &CsvOptions::default()).unwrap();

    let out = aggregate(&data.rows, "name", "score", AggregationType::Sum);
    assert_eq!(out.len(), 2);
    assert_eq!(out[0]["name"], Value::from("A"));
    assert_eq!(out[0]["score"], Value::Number(15.0));
    assert_eq!(out[1]["name"], Value::from("B"));
    assert_eq!(out[1]["score"], Value::Number(20.0));
}

#[test]
fn duplicate_and_blank_headers_are_made_unique() {
    let input = "id,,id,name,\n1,x,2,Ada,y\n";
    let data = parse_csv(input.as_bytes(), "x.csv", &CsvOptions::default()).unwrap();

    assert_eq!(data.headers, vec!["id", "__EMPTY", "id_1", "name", "__EMPTY_1"]);
    assert_eq!(data.column_count, data.headers.len());
    assert_eq!(data.rows[0]["id_1"], Value::Number(2.0));
}

#[test]
fn raw_data_is_aligned_with_headers() {
    let input = "a,b,c\n1,2\n4,5,6,7\n";
    let data = parse_csv(input.as_bytes(), "x.csv", &CsvOptions::default()).unwrap();

    for (row, raw) in data.rows.iter().zip(&data.raw_data) {
        assert_eq!(raw.len(), data.headers.len());
        for (idx, header) in data.headers.iter().enumerate() {
            assert_eq!(raw[idx], row.get(header).cloned().unwrap_or(Value::Null));
        }
    }

    // Short row: trailing key absent. Long row: surplus kept aside.
    assert!(!data.rows[0].contains_key("c"));
    assert_eq!(data.rows[1][EXTRA_FIELDS_KEY], Value::List(vec![Value::Number(7.0)]));
    assert!(!data.headers.iter().any(|h| h == EXTRA_FIELDS_KEY));
}

#[test]
fn custom_delimiter_and_no_header_row() {
    let input = "1;Ada\n2;Grace;extra\n";
    let opts = CsvOptions {
        delimiter: Some(b';'),
        has_headers: false,
        ..Default::default()
    };
    let data = parse_csv(input.as_bytes(), "x.csv", &opts).unwrap();

    assert_eq!(data.headers, vec!["0", "1", "2"]);
    assert_eq!(data.row_count, 2);
    assert_eq!(data.rows[1]["2"], Value::from("extra"));
    assert_eq!(data.raw_data[0][2], Value::Null);
}

#[test]
fn tsv_from_fixture() {
    let bytes = std::fs::read("tests/fixtures/sales.tsv").unwrap();
    let data = parse_tsv(&bytes, "sales.tsv", &CsvOptions::default()).unwrap();

    assert_eq!(data.file_type, FileType::Tsv);
    assert_eq!(data.headers, vec!["region", "units", "date"]);
    assert_eq!(data.rows[1]["units"], Value::Number(7.0));
    // Date-only strings are not converted by dynamic typing.
    assert_eq!(data.rows[0]["date"], Value::from("2024-01-05"));
}

#[test]
fn parse_from_existing_reader() {
    let input = "name|city\nAda|London\n";
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'|')
        .flexible(true)
        .from_reader(input.as_bytes());

    let data = parse_csv_from_reader(&mut rdr, "x.csv", FileType::Csv, &CsvOptions::default()).unwrap();
    assert_eq!(data.rows[0]["city"], Value::from("London"));
}

#[test]
fn invalid_utf8_is_a_parse_error() {
    let input: &[u8] = b"a,b\n\xff\xfe,1\n";
    let err = parse_csv(input, "x.csv", &CsvOptions::default()).unwrap_err();
    assert!(err.to_string().contains("CSV parsing failed"));
}
