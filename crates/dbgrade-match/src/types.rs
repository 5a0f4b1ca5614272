//! SQL scalar type families.

use crate::normalize::normalize;

/// Name fragments that mark a column as an identifier or code.
const CODE_KEYWORDS: &[&str] = &["ma", "code", "id", "sohieu", "phieu", "voucher"];

/// Equivalence class of SQL scalar types.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeFamily {
    String,
    Integer,
    Numeric,
    DateTime,
    /// Any type outside the known families, compared by its lowercase base name.
    Other(String),
}

impl TypeFamily {
    /// Resolves a declared type such as `NVARCHAR(50)` or `decimal(18, 2)`.
    pub fn of(sql_type: &str) -> Self {
        let base = base_type(sql_type);
        match base.as_str() {
            "char" | "varchar" | "nvarchar" | "nchar" | "text" | "ntext" => Self::String,
            "int" | "integer" | "bigint" | "smallint" | "tinyint" => Self::Integer,
            "decimal" | "numeric" | "money" | "smallmoney" | "real" | "float" | "double" => {
                Self::Numeric
            }
            "date" | "datetime" | "smalldatetime" | "datetime2" | "timestamp" => Self::DateTime,
            _ => Self::Other(base),
        }
    }

    fn is_key_like(&self) -> bool {
        matches!(self, Self::String | Self::Integer)
    }
}

/// Lowercased type name without its length or precision suffix.
fn base_type(sql_type: &str) -> String {
    let base = sql_type.split('(').next().unwrap_or_default();
    base.trim().to_lowercase()
}

/// True when the column name starts or ends with a code keyword.
pub fn is_code_column(name: &str) -> bool {
    let compact = normalize(name).replace(' ', "");
    !compact.is_empty()
        && CODE_KEYWORDS
            .iter()
            .any(|keyword| compact.starts_with(keyword) || compact.ends_with(keyword))
}

/// Type compatibility of two columns.
///
/// Types must share a family, except that string and integer types are interchangeable
/// when both column names look like codes.
pub fn same_type(type_a: &str, type_b: &str, col_a: &str, col_b: &str) -> bool {
    let family_a = TypeFamily::of(type_a);
    let family_b = TypeFamily::of(type_b);
    if family_a == family_b {
        return true;
    }
    family_a.is_key_like()
        && family_b.is_key_like()
        && is_code_column(col_a)
        && is_code_column(col_b)
}
