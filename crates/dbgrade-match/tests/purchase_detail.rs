//! Grading with a backend that serves fixed vectors: a purchase-detail table against a
//! student's abbreviated rename, plus the table and column acceptance gates.

use std::sync::Arc;

use dbgrade_lexicon::Lexicon;
use dbgrade_match::{
    EmbeddingBackend, EmbeddingCache, EmbeddingError, EmbeddingProvider, GradingEngine,
    MatchConfig,
};
use dbgrade_model::{ColumnMatch, Schema, SchemaGrade, TableDescriptor};

const DIMENSION: usize = 768;

fn axis(index: usize) -> Vec<f32> {
    let mut vector = vec![0.0; DIMENSION];
    vector[index] = 1.0;
    vector
}

fn blend(a: usize, weight_a: f32, b: usize, weight_b: f32) -> Vec<f32> {
    let mut vector = vec![0.0; DIMENSION];
    vector[a] = weight_a;
    vector[b] = weight_b;
    vector
}

/// Serves the vector of the longest needle found in the first prompt line.
struct FixtureBackend {
    vectors: Vec<(&'static str, Vec<f32>)>,
}

impl FixtureBackend {
    fn purchase_detail() -> Self {
        Self {
            vectors: vec![
                ("TABLE ", axis(0)),
                (".MaHangHoa ", axis(1)),
                (".MaHang ", blend(1, 0.9, 2, 0.436)),
                (".PhieuMuaHang ", axis(3)),
                (".SoHD ", axis(4)),
                (".TienThue ", axis(5)),
                (".Thanhtien ", axis(6)),
                (".TenHangHoa ", axis(10)),
                (".TenHang ", blend(10, 0.6, 11, 0.8)),
                (".GhiChu ", axis(20)),
                (".MoTa ", blend(20, 0.6, 21, 0.8)),
                (".DonGia ", axis(30)),
                (".GiaBan ", blend(30, 0.9, 31, 0.436)),
                ("TABLE KhoHang", axis(40)),
                ("TABLE PhieuXuat", axis(41)),
            ],
        }
    }
}

impl EmbeddingBackend for FixtureBackend {
    fn name(&self) -> &str {
        "fixture"
    }

    fn embed(&self, prompt: &str) -> Result<Vec<f32>, EmbeddingError> {
        let text = prompt.lines().next().unwrap_or_default();
        self.vectors
            .iter()
            .filter(|(needle, _)| text.contains(needle))
            .max_by_key(|(needle, _)| needle.len())
            .map(|(_, vector)| vector.clone())
            .ok_or_else(|| EmbeddingError::Malformed(format!("no fixture vector for {text:?}")))
    }
}

fn engine() -> GradingEngine {
    let lexicon = Arc::new(Lexicon::embedded().expect("embedded lexicon"));
    let embeddings = EmbeddingProvider::new(
        Some(Box::new(FixtureBackend::purchase_detail())),
        EmbeddingCache::in_memory(1024),
        Arc::clone(&lexicon),
        DIMENSION,
    );
    GradingEngine::new(MatchConfig::default(), lexicon, embeddings).expect("valid config")
}

fn grade(answer: TableDescriptor, student: TableDescriptor) -> SchemaGrade {
    engine().grade(
        &Schema::new().with_table(answer),
        &Schema::new().with_table(student),
    )
}

fn column<'a>(grade: &'a SchemaGrade, name: &str) -> &'a ColumnMatch {
    grade
        .columns
        .iter()
        .find(|c| c.answer_col == name)
        .expect("answer column present")
}

#[test]
fn abbreviated_purchase_detail_matches_three_of_five_columns() {
    let answer = TableDescriptor::new("ChiTietMuaHang")
        .with_column("PhieuMuaHang", "varchar(10)")
        .with_column("MaHangHoa", "varchar(10)")
        .with_column("DonGia", "money")
        .with_column("SoLuong", "int")
        .with_column("TienThue", "money");
    let student = TableDescriptor::new("CT_MuaHang")
        .with_column("SoHD", "varchar(10)")
        .with_column("MaHang", "varchar(10)")
        .with_column("Dongia", "decimal(18, 2)")
        .with_column("Soluong", "int")
        .with_column("Thanhtien", "money");

    let grade = grade(answer, student);

    assert_eq!(
        grade.tables[0].student_table.as_deref(),
        Some("CT_MUAHANG")
    );

    let price = column(&grade, "DonGia");
    assert_eq!(price.student_col.as_deref(), Some("Dongia"));
    assert_eq!(price.similarity_score, 1.0);
    assert!(price.type_compatible);

    let quantity = column(&grade, "SoLuong");
    assert_eq!(quantity.student_col.as_deref(), Some("Soluong"));
    assert!(quantity.is_matched());

    let item = column(&grade, "MaHangHoa");
    assert_eq!(item.student_col.as_deref(), Some("MaHang"));
    assert!((item.similarity_score - 0.9).abs() < 1e-3);
    assert!(item.is_matched());

    for missing in ["PhieuMuaHang", "TienThue"] {
        let record = column(&grade, missing);
        assert_eq!(record.student_col, None, "{missing}");
        assert_eq!(record.student_col_label(), "—");
        assert_eq!(record.similarity_score, 0.0);
        assert!(!record.type_compatible);
    }

    let verdict = &grade.verdicts[0];
    assert_eq!(verdict.matched_columns, 3);
    assert!((verdict.column_ratio - 0.6).abs() < 1e-9);
    assert!(!verdict.enough_columns);
    assert!(!verdict.hit);
    assert_eq!(grade.schema_score, 0.0);
}

#[test]
fn ambiguous_pair_is_rescued_by_shared_tokens() {
    let answer = TableDescriptor::new("HangHoa")
        .with_column("MaHH", "varchar(10)")
        .with_column("TenHangHoa", "nvarchar(100)");
    let student = TableDescriptor::new("HangHoa")
        .with_column("MaHH", "varchar(10)")
        .with_column("TenHang", "nvarchar(50)");

    let grade = grade(answer, student);
    let name = column(&grade, "TenHangHoa");

    assert_eq!(name.student_col.as_deref(), Some("TenHang"));
    assert_eq!(name.similarity_score, 1.0);
    assert!(name.is_matched());
}

#[test]
fn ambiguous_pair_without_support_is_rejected() {
    let answer = TableDescriptor::new("HangHoa")
        .with_column("MaHH", "varchar(10)")
        .with_column("GhiChu", "nvarchar(200)");
    let student = TableDescriptor::new("HangHoa")
        .with_column("MaHH", "varchar(10)")
        .with_column("MoTa", "nvarchar(200)");

    let grade = grade(answer, student);
    assert_eq!(grade.tables[0].student_table.as_deref(), Some("HANGHOA"));
    let note = column(&grade, "GhiChu");

    assert_eq!(note.student_col, None);
    assert_eq!(note.similarity_score, 0.0);
}

#[test]
fn unknown_texts_fall_back_without_failing() {
    let engine = engine();
    let answer = Schema::new().with_table(
        TableDescriptor::new("NhaCungCap")
            .with_column("MaNCC", "varchar(10)")
            .with_column("DiaChi", "nvarchar(200)"),
    );
    let student = Schema::new().with_table(
        TableDescriptor::new("NhaCungCap")
            .with_column("MaNCC", "varchar(10)")
            .with_column("Address", "nvarchar(200)"),
    );

    let grade = engine.grade(&answer, &student);

    assert_eq!(grade.columns.len(), 2);
    assert!(column(&grade, "MaNCC").is_matched());
    let stats = engine.embeddings().stats();
    assert!(stats.backend_calls > 0);
    assert!(stats.fallbacks > 0);
}

#[test]
fn similar_column_with_incompatible_type_is_rejected() {
    let answer = TableDescriptor::new("HangHoa")
        .with_column("MaHH", "varchar(10)")
        .with_column("DonGia", "money");
    let student = TableDescriptor::new("HangHoa")
        .with_column("MaHH", "varchar(10)")
        .with_column("GiaBan", "datetime");

    let grade = grade(answer, student);

    assert_eq!(grade.tables[0].student_table.as_deref(), Some("HANGHOA"));
    let price = column(&grade, "DonGia");
    assert_eq!(price.student_col, None);
    assert_eq!(price.similarity_score, 0.0);
    assert!(!price.type_compatible);
    assert!(column(&grade, "MaHH").is_matched());
}

#[test]
fn identical_descriptors_without_shared_columns_stay_unmatched() {
    let answer = TableDescriptor::new("Alpha").with_column("NgayLap", "datetime");
    let student = TableDescriptor::new("Zeta").with_column("GhiChu", "int");

    let grade = grade(answer, student);

    assert_eq!(grade.tables.len(), 1);
    assert_eq!(grade.tables[0].student_table, None);
    assert_eq!(grade.tables[0].similarity_score, 0.0);
    assert_eq!(column(&grade, "NgayLap").student_col, None);
    assert_eq!(grade.schema_score, 0.0);
}

#[test]
fn shared_column_with_weak_descriptor_similarity_is_rejected() {
    let answer = TableDescriptor::new("KhoHang")
        .with_column("MaKho", "varchar(10)")
        .with_column("TenKho", "nvarchar(100)");
    let student = TableDescriptor::new("PhieuXuat")
        .with_column("MaKho", "varchar(10)")
        .with_column("NgayXuat", "datetime");

    let grade = grade(answer, student);

    assert_eq!(grade.tables[0].student_table, None);
    assert!(grade.columns.iter().all(|c| c.student_col.is_none()));
}
