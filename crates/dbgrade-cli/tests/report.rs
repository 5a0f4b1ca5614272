use std::path::PathBuf;

use dbgrade_cli::report::{
    BATCH_RESULTS_FILE, export_batch, export_grade, write_batch, write_foreign_keys,
    write_pairs, write_tables,
};
use dbgrade_cli::types::{BatchEntry, BatchResult};
use dbgrade_model::{ColumnMatch, ForeignKeyMatch, SchemaGrade, TableMatch, TableVerdict};

fn invoice_grade() -> SchemaGrade {
    SchemaGrade {
        tables: vec![
            TableMatch {
                answer_table: "HOADON".to_string(),
                student_table: Some("HD".to_string()),
                similarity_score: 0.912_345,
                column_overlap: 2,
            },
            TableMatch::unmatched("KHACHHANG"),
        ],
        columns: vec![
            ColumnMatch {
                answer_table: "HOADON".to_string(),
                answer_col: "SoHD".to_string(),
                answer_type: "varchar(10)".to_string(),
                student_table: Some("HD".to_string()),
                student_col: Some("SoHD".to_string()),
                student_type: Some("varchar(10)".to_string()),
                similarity_score: 1.0,
                type_compatible: true,
            },
            ColumnMatch {
                answer_table: "HOADON".to_string(),
                answer_col: "TongTien".to_string(),
                answer_type: "decimal(18, 2)".to_string(),
                student_table: None,
                student_col: None,
                student_type: None,
                similarity_score: 0.0,
                type_compatible: false,
            },
        ],
        verdicts: vec![
            TableVerdict {
                answer_table: "HOADON".to_string(),
                student_table: Some("HD".to_string()),
                answer_columns: 2,
                matched_columns: 1,
                column_ratio: 0.5,
                enough_columns: false,
                primary_key_ok: true,
                foreign_keys_ok: true,
                hit: false,
            },
            TableVerdict {
                answer_table: "KHACHHANG".to_string(),
                student_table: None,
                answer_columns: 0,
                matched_columns: 0,
                column_ratio: 0.0,
                enough_columns: false,
                primary_key_ok: false,
                foreign_keys_ok: false,
                hit: false,
            },
        ],
        foreign_keys: vec![ForeignKeyMatch {
            answer: "hoa don(ma khach hang) -> khach hang(ma khach hang)".to_string(),
            student: None,
            matched: false,
        }],
        schema_score: 0.0,
        tables_hit: 0,
        matched_column_ratio: 0.5,
        foreign_key_ratio: 0.0,
    }
}

fn render(write: impl FnOnce(&mut Vec<u8>) -> csv::Result<()>) -> String {
    let mut buffer = Vec::new();
    write(&mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

#[test]
fn pair_report_marks_unmatched_columns() {
    let grade = invoice_grade();
    let csv = render(|out| write_pairs(out, &grade));
    insta::assert_snapshot!(csv, @r#"
    answer_table,answer_column,answer_type,student_table,student_column,student_type,similarity,type_compatible,matched
    HOADON,SoHD,varchar(10),HD,SoHD,varchar(10),1.0000,true,true
    HOADON,TongTien,"decimal(18, 2)",—,—,—,0.0000,false,false
    "#);
}

#[test]
fn table_report_joins_verdicts() {
    let grade = invoice_grade();
    let csv = render(|out| write_tables(out, &grade));
    insta::assert_snapshot!(csv, @r"
    answer_table,student_table,similarity,column_overlap,answer_columns,matched_columns,column_ratio,enough_columns,primary_key_ok,foreign_keys_ok,hit
    HOADON,HD,0.9123,2,2,1,0.5000,false,true,true,false
    KHACHHANG,—,0.0000,0,0,0,0.0000,false,false,false,false
    ");
}

#[test]
fn foreign_key_report_lists_answer_keys() {
    let grade = invoice_grade();
    let csv = render(|out| write_foreign_keys(out, &grade));
    insta::assert_snapshot!(csv, @r"
    answer_foreign_key,student_foreign_key,matched
    hoa don(ma khach hang) -> khach hang(ma khach hang),—,false
    ");
}

#[test]
fn batch_report_keeps_failed_students() {
    let result = BatchResult {
        entries: vec![
            BatchEntry {
                identifier: "QLBH_01".to_string(),
                path: PathBuf::from("QLBH_01.json"),
                outcome: Ok(SchemaGrade {
                    schema_score: 1.5,
                    tables_hit: 3,
                    matched_column_ratio: 0.875,
                    foreign_key_ratio: 2.0 / 3.0,
                    ..invoice_grade()
                }),
            },
            BatchEntry {
                identifier: "QLBH_02".to_string(),
                path: PathBuf::from("QLBH_02.json"),
                outcome: Err("parse snapshot QLBH_02.json: EOF while parsing".to_string()),
            },
        ],
    };
    let csv = render(|out| write_batch(out, &result));
    insta::assert_snapshot!(csv, @r"
    identifier,status,schema_score,tables_hit,matched_column_ratio,foreign_key_ratio,error
    QLBH_01,graded,1.5000,3,0.8750,0.6667,
    QLBH_02,failed,,,,,parse snapshot QLBH_02.json: EOF while parsing
    ");
    assert_eq!(result.failed(), 1);
    assert_eq!(result.mean_score(), 1.5);
}

#[test]
fn export_writes_three_files_per_student() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("reports");

    let written = export_grade(&out, "QLBH_01", &invoice_grade()).unwrap();

    let names: Vec<_> = written
        .iter()
        .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        ["QLBH_01_pairs.csv", "QLBH_01_tables.csv", "QLBH_01_fk.csv"]
    );
    let pairs = std::fs::read_to_string(&written[0]).unwrap();
    assert_eq!(pairs.lines().count(), 3);

    let batch = export_batch(&out, &BatchResult::default()).unwrap();
    assert_eq!(batch, out.join(BATCH_RESULTS_FILE));
    assert_eq!(
        std::fs::read_to_string(batch).unwrap().trim_end(),
        "identifier,status,schema_score,tables_hit,matched_column_ratio,foreign_key_ratio,error"
    );
}
