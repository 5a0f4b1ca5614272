//! Tests for loading and applying lexicons.

use std::io::Write;

use dbgrade_lexicon::{Lexicon, LexiconError, normalize};

#[test]
fn embedded_lexicon_loads() {
    let lexicon = Lexicon::embedded().expect("embedded lexicon");
    assert!(lexicon.has_substitutions());
    assert_eq!(lexicon.abbreviation("ncc"), Some("nha cung cap"));
    assert!(!lexicon.context_groups().is_empty());
}

#[test]
fn embedded_lexicon_rewrites_purchase_names() {
    let lexicon = Lexicon::embedded().expect("embedded lexicon");
    assert_eq!(
        lexicon.rewrite(&normalize("CT_MuaHang")),
        lexicon.rewrite(&normalize("ChiTietMuaHang"))
    );
    assert_eq!(lexicon.rewrite(&normalize("SoHD")), "so hoa don");
    assert_eq!(lexicon.rewrite(&normalize("PhieuChi")), "phieu tra tien");
    assert_eq!(lexicon.rewrite(&normalize("ChiTietChiTien")), "chi tiet tra tien");
}

#[test]
fn embedded_context_covers_keys_amounts_and_details() {
    let lexicon = Lexicon::embedded().expect("embedded lexicon");
    let hints = |raw: &str| -> Vec<String> {
        lexicon
            .context_for(&normalize(raw))
            .map(|group| group.hint())
            .collect()
    };

    assert!(hints("HoaDon.MaKH (varchar)").contains(&"ma = id = so".to_string()));
    assert!(hints("SoHD").contains(&"ma = id = so".to_string()));
    assert!(hints("ThanhTien").contains(&"tong tien = thanh tien = amount".to_string()));
    assert!(hints("CT_MuaHang").contains(&"chi tiet = ct = details".to_string()));
    assert!(hints("NgayLap").is_empty());
}

#[test]
fn embedded_rewrite_is_stable_on_its_output() {
    let lexicon = Lexicon::embedded().expect("embedded lexicon");
    for raw in ["CT_ChiTien", "PhieuNhap", "ThanhToanNCC", "DVT", "MaNV"] {
        let once = lexicon.rewrite(&normalize(raw));
        assert_eq!(lexicon.rewrite(&once), once, "rewrite of {raw} is not stable");
    }
}

#[test]
fn loads_lexicon_from_file() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "[abbreviations]\nkh = \"khach hang\"").expect("write lexicon");

    let lexicon = Lexicon::load(file.path()).expect("load lexicon");
    assert_eq!(lexicon.rewrite("ma kh"), "ma khach hang");
    assert_eq!(lexicon.len(), 1);
}

#[test]
fn missing_file_reports_path() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("missing.toml");
    let error = Lexicon::load(&path).unwrap_err();
    assert!(matches!(error, LexiconError::Io { .. }));
    assert!(error.to_string().contains("missing.toml"));
}

#[test]
fn unknown_sections_are_rejected() {
    let error = Lexicon::from_toml_str("[aliases]\nx = \"y\"\n").unwrap_err();
    assert!(matches!(error, LexiconError::Toml { .. }));
}

#[test]
fn fingerprint_tracks_content() {
    let a = Lexicon::from_toml_str("[abbreviations]\nkh = \"khach hang\"\n").expect("lexicon");
    let b = Lexicon::from_toml_str("[abbreviations]\nKH = \"Khách Hàng\"\n").expect("lexicon");
    let c = Lexicon::from_toml_str("[abbreviations]\nkh = \"khach\"\n").expect("lexicon");

    assert_eq!(a.fingerprint(), b.fingerprint());
    assert_ne!(a.fingerprint(), c.fingerprint());
    assert_eq!(a.fingerprint().len(), 64);
}

#[test]
fn empty_lexicon_is_identity() {
    let lexicon = Lexicon::empty();
    assert!(lexicon.is_empty());
    assert_eq!(lexicon.rewrite("ct chi tien"), "ct chi tien");
}
