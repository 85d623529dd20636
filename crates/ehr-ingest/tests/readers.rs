use std::fs;
use std::io::Cursor;

use ehr_ingest::{IngestError, RowReader, read_reference_bytes, read_reference_table};

#[test]
fn row_reader_skips_header_and_keeps_quotes() {
    let data = "enc,measurement,value,cond\n\
                e1,Pulse,72,250\n\
                e2,\"Blood, Pressure\",120,401\n\
                \n\
                e3,Weight\n";
    let rows: Vec<_> = RowReader::from_reader("vitals.csv", Cursor::new(data))
        .collect::<Result<_, _>>()
        .expect("read rows");

    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].line, 2);
    assert_eq!(rows[0].cell(2), Some("72"));
    assert_eq!(rows[1].cells, vec!["e2", "\"Blood", " Pressure\"", "120", "401"]);
    assert_eq!(rows[2].cell(3), None);
}

#[test]
fn row_reader_reports_missing_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("absent.csv");
    match RowReader::open(&missing) {
        Err(IngestError::Io { path, .. }) => assert_eq!(path, missing),
        other => panic!("expected io error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn reference_table_honours_quoting() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("drug2cond.csv");
    fs::write(
        &path,
        "id,drug,name,condition\n1,D1,\"Aspirin, 75mg\",C9\n\n2,D2,Ibuprofen,C4\n",
    )
    .expect("write table");

    let rows = read_reference_table(&path).expect("read table");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].cell(2), Some("Aspirin, 75mg"));
    assert_eq!(rows[1].line, 4);
}

#[test]
fn reference_table_requires_header() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("empty.csv");
    fs::write(&path, "").expect("write table");
    assert!(matches!(
        read_reference_table(&path),
        Err(IngestError::MissingHeader { .. })
    ));
}

#[test]
fn undecodable_cell_stays_inside_its_row() {
    let data: &[u8] = b"encounter,code\nE1,250\nE2,\xFC\nE3,401.9\n";
    let rows: Vec<_> = RowReader::from_reader("diagnoses.csv", data)
        .collect::<Result<_, _>>()
        .expect("read rows");

    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1].line, 3);
    assert_eq!(rows[1].cell(1), Some("\u{FFFD}"));
    assert_eq!(rows[2].cells, vec!["E3", "401.9"]);
}

#[test]
fn reference_table_decodes_latin1_names_lossily() {
    let rows = read_reference_bytes(
        std::path::Path::new("drugs.csv"),
        b"drug,name\nD1,Sulfonylur\xE9e\nD2,Aspirin\n",
    )
    .expect("read table");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].cell(1), Some("Sulfonylur\u{FFFD}e"));
    assert_eq!(rows[1].cell(1), Some("Aspirin"));
}
