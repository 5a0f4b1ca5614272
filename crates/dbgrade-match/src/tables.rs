//! One-to-one table matching.
//!
//! Every answer/student pair gets a literal column overlap count and a descriptor
//! embedding similarity. A minimum-cost assignment over
//! `-(overlap_weight * overlap + similarity)` picks the pairing, then each assigned pair
//! is kept or dropped by the acceptance thresholds. A pair below the minimum overlap is
//! never accepted, however similar its descriptors.

use tracing::debug;

use dbgrade_model::{Schema, TableDescriptor, TableMatch, clean_table_name};

use crate::assignment::solve_assignment;
use crate::fuzzy::token_score;
use crate::matcher::SchemaMatcher;
use crate::types::same_type;

/// Cost of a pair below the minimum overlap, and of padding cells. Such pairs are never kept.
pub const FORBIDDEN_COST: f64 = 1e6;

impl SchemaMatcher<'_> {
    /// Text embedded for a table: `TABLE <name>: <col>, <col>, ...`.
    pub fn table_descriptor(&self, table: &TableDescriptor) -> String {
        let columns: Vec<&str> = table
            .column_names()
            .take(self.config.descriptor_column_limit)
            .collect();
        format!(
            "TABLE {}: {}",
            clean_table_name(&table.original_name),
            columns.join(", ")
        )
    }

    /// Greedy count of answer columns with a type-compatible, name-matching student
    /// column. Each student column counts once.
    pub fn column_overlap(&self, answer: &TableDescriptor, student: &TableDescriptor) -> usize {
        let mut used = vec![false; student.columns.len()];
        let mut overlap = 0;
        for column in &answer.columns {
            let hit = (0..student.columns.len()).find(|&j| {
                let candidate = &student.columns[j];
                !used[j]
                    && self.names_match(&column.name, &candidate.name)
                    && same_type(
                        &column.sql_type,
                        &candidate.sql_type,
                        &column.name,
                        &candidate.name,
                    )
            });
            if let Some(j) = hit {
                used[j] = true;
                overlap += 1;
            }
        }
        overlap
    }

    fn names_match(&self, a: &str, b: &str) -> bool {
        self.normalizer.names_equivalent(a, b)
            || token_score(self.normalizer, a, b) >= self.config.fuzzy_threshold
    }

    /// Pairs answer tables with student tables.
    ///
    /// Returns one record per answer table in key order. Accepted pairs are injective;
    /// rejected or unassigned answer tables carry `None` with zero scores.
    pub fn match_tables(&self, answer: &Schema, student: &Schema) -> Vec<TableMatch> {
        let answer_tables: Vec<(&str, &TableDescriptor)> = answer.tables().collect();
        let student_tables: Vec<(&str, &TableDescriptor)> = student.tables().collect();
        if student_tables.is_empty() {
            return answer_tables
                .iter()
                .map(|(key, _)| TableMatch::unmatched(*key))
                .collect();
        }

        let overlap: Vec<Vec<usize>> = answer_tables
            .iter()
            .map(|(_, a)| {
                student_tables
                    .iter()
                    .map(|(_, s)| self.column_overlap(a, s))
                    .collect()
            })
            .collect();
        let answer_texts: Vec<String> = answer_tables
            .iter()
            .map(|(_, table)| self.table_descriptor(table))
            .collect();
        let student_texts: Vec<String> = student_tables
            .iter()
            .map(|(_, table)| self.table_descriptor(table))
            .collect();
        let similarity = self.embeddings.similarity_matrix(&answer_texts, &student_texts);

        let size = answer_tables.len().max(student_tables.len());
        let mut costs = vec![vec![FORBIDDEN_COST; size]; size];
        for (i, row) in overlap.iter().enumerate() {
            for (j, &count) in row.iter().enumerate() {
                if count >= self.config.min_column_matches {
                    costs[i][j] = -(self.config.overlap_weight * count as f64 + similarity[i][j]);
                }
            }
        }

        let assignment = solve_assignment(&costs);
        answer_tables
            .iter()
            .enumerate()
            .map(|(i, (answer_key, _))| {
                let Some(j) = assignment[i].filter(|&j| j < student_tables.len()) else {
                    return TableMatch::unmatched(*answer_key);
                };
                let (student_key, _) = student_tables[j];
                let sim = similarity[i][j];
                let count = overlap[i][j];
                let accepted = count >= self.config.min_column_matches
                    && (sim >= self.config.table_medium_threshold
                        || sim >= self.config.table_threshold);
                debug!(
                    answer = answer_key,
                    student = student_key,
                    similarity = sim,
                    overlap = count,
                    accepted,
                    "table pair"
                );
                if accepted {
                    TableMatch {
                        answer_table: (*answer_key).to_string(),
                        student_table: Some(student_key.to_string()),
                        similarity_score: sim,
                        column_overlap: count,
                    }
                } else {
                    TableMatch::unmatched(*answer_key)
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use dbgrade_lexicon::Lexicon;

    use super::*;
    use crate::config::MatchConfig;
    use crate::embedding::EmbeddingProvider;
    use crate::normalize::Normalizer;

    fn with_matcher(test: impl FnOnce(SchemaMatcher<'_>)) {
        let lexicon = Arc::new(Lexicon::embedded().unwrap());
        let config = MatchConfig::default();
        let normalizer = Normalizer::new(Arc::clone(&lexicon), 64);
        let embeddings = EmbeddingProvider::offline(lexicon, 128);
        test(SchemaMatcher::new(&config, &normalizer, &embeddings));
    }

    #[test]
    fn descriptor_lists_limited_columns() {
        let config = MatchConfig {
            descriptor_column_limit: 2,
            ..MatchConfig::default()
        };
        let lexicon = Arc::new(Lexicon::empty());
        let normalizer = Normalizer::new(Arc::clone(&lexicon), 8);
        let embeddings = EmbeddingProvider::offline(lexicon, 8);
        let matcher = SchemaMatcher::new(&config, &normalizer, &embeddings);

        let table = TableDescriptor::new("03. HoaDon")
            .with_column("SoHD", "varchar")
            .with_column("NgayLap", "date")
            .with_column("TongTien", "money");
        assert_eq!(matcher.table_descriptor(&table), "TABLE HoaDon: SoHD, NgayLap");
    }

    #[test]
    fn overlap_requires_compatible_types() {
        with_matcher(|matcher| {
            let answer = TableDescriptor::new("HoaDon")
                .with_column("SoHD", "varchar")
                .with_column("NgayLap", "datetime");
            let student = TableDescriptor::new("HD")
                .with_column("SoHD", "nvarchar")
                .with_column("NgayLap", "money");
            assert_eq!(matcher.column_overlap(&answer, &student), 1);
        });
    }

    #[test]
    fn overlap_counts_each_student_column_once() {
        with_matcher(|matcher| {
            let answer = TableDescriptor::new("A")
                .with_column("TenKH", "nvarchar")
                .with_column("ten_kh", "nvarchar");
            let student = TableDescriptor::new("B").with_column("TenKH", "nvarchar");
            assert_eq!(matcher.column_overlap(&answer, &student), 1);
        });
    }

    #[test]
    fn identical_schemas_map_to_themselves() {
        with_matcher(|matcher| {
            let schema = Schema::new()
                .with_table(
                    TableDescriptor::new("KhachHang")
                        .with_column("MaKH", "varchar")
                        .with_column("TenKH", "nvarchar"),
                )
                .with_table(
                    TableDescriptor::new("HoaDon")
                        .with_column("SoHD", "varchar")
                        .with_column("NgayLap", "datetime"),
                );
            let matches = matcher.match_tables(&schema, &schema);
            assert_eq!(matches.len(), 2);
            for m in &matches {
                assert_eq!(m.student_table.as_deref(), Some(m.answer_table.as_str()));
                assert_eq!(m.column_overlap, 2);
                assert!(m.similarity_score > 0.99);
            }
        });
    }

    #[test]
    fn empty_student_schema_leaves_everything_unmatched() {
        with_matcher(|matcher| {
            let answer =
                Schema::new().with_table(TableDescriptor::new("NhanVien").with_column("MaNV", "int"));
            let matches = matcher.match_tables(&answer, &Schema::new());
            assert_eq!(matches, vec![TableMatch::unmatched("NHANVIEN")]);
        });
    }

    #[test]
    fn surplus_answer_tables_are_unmatched() {
        with_matcher(|matcher| {
            let answer = Schema::new()
                .with_table(TableDescriptor::new("KhachHang").with_column("MaKH", "varchar"))
                .with_table(TableDescriptor::new("HoaDon").with_column("SoHD", "varchar"));
            let student =
                Schema::new().with_table(TableDescriptor::new("KhachHang").with_column("MaKH", "varchar"));
            let matches = matcher.match_tables(&answer, &student);
            let matched: Vec<_> = matches.iter().filter(|m| m.is_matched()).collect();
            assert_eq!(matched.len(), 1);
            assert_eq!(matched[0].answer_table, "KHACHHANG");
        });
    }
}
