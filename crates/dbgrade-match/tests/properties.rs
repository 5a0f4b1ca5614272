use std::sync::Arc;

use proptest::prelude::*;

use dbgrade_lexicon::Lexicon;
use dbgrade_match::assignment::assignment_cost;
use dbgrade_match::embedding::fallback_embedding;
use dbgrade_match::{Normalizer, normalize, solve_assignment};

/// Words the embedded dictionary knows, mixed with plain ones.
const VOCABULARY: &[&str] = &[
    "ct", "cttt", "hd", "kh", "nv", "ncc", "sl", "sp", "dvt", "mh", "pmh", "chi", "tien",
    "phieu", "nhap", "hang", "thanh", "toan", "chitiet", "chitien", "muahang", "hanghoa",
    "soluong", "dongia", "ma", "ten", "so", "ngay", "lap", "alpha", "x",
];

/// Identifier made of vocabulary words joined by underscores, spaces or camel case.
fn arb_identifier() -> impl Strategy<Value = String> {
    (
        prop::collection::vec(prop::sample::select(VOCABULARY), 1..=5),
        0..3usize,
    )
        .prop_map(|(words, style)| match style {
            0 => words.join("_"),
            1 => words.join(" "),
            _ => words
                .iter()
                .map(|word| {
                    let mut chars = word.chars();
                    chars
                        .next()
                        .map(|first| first.to_ascii_uppercase().to_string() + chars.as_str())
                        .unwrap_or_default()
                })
                .collect(),
        })
}

/// Cost matrix of 1..=5 rows and 1..=5 columns with integer costs.
fn arb_costs() -> impl Strategy<Value = Vec<Vec<f64>>> {
    (1..=5usize, 1..=5usize).prop_flat_map(|(rows, columns)| {
        prop::collection::vec(
            prop::collection::vec((0..50u8).prop_map(f64::from), columns),
            rows,
        )
    })
}

/// Exhaustive minimum over assignments covering `min(rows, columns)` pairs.
fn brute_force_cost(costs: &[Vec<f64>]) -> f64 {
    fn search(costs: &[Vec<f64>], row: usize, used: &mut Vec<bool>, remaining: usize) -> f64 {
        if remaining == 0 {
            return 0.0;
        }
        if costs.len() - row < remaining {
            return f64::INFINITY;
        }
        let mut best = search(costs, row + 1, used, remaining);
        for column in 0..used.len() {
            if !used[column] {
                used[column] = true;
                let cost = costs[row][column] + search(costs, row + 1, used, remaining - 1);
                used[column] = false;
                best = best.min(cost);
            }
        }
        best
    }
    let columns = costs[0].len();
    let mut used = vec![false; columns];
    search(costs, 0, &mut used, costs.len().min(columns))
}

proptest! {
    #[test]
    fn normalize_is_idempotent(text in ".{0,40}") {
        let once = normalize(&text);
        prop_assert_eq!(normalize(&once), once);
    }

    #[test]
    fn canonical_form_is_a_fixed_point(identifier in arb_identifier()) {
        let normalizer = Normalizer::new(Arc::new(Lexicon::embedded().unwrap()), 64);
        let once = normalizer.canonical(&identifier);
        prop_assert_eq!(normalizer.canonical(&once), once);
    }

    #[test]
    fn names_equivalent_is_symmetric(a in arb_identifier(), b in arb_identifier()) {
        let normalizer = Normalizer::new(Arc::new(Lexicon::embedded().unwrap()), 64);
        prop_assert_eq!(normalizer.names_equivalent(&a, &b), normalizer.names_equivalent(&b, &a));
        prop_assert!(normalizer.names_equivalent(&a, &a));
    }

    #[test]
    fn assignment_is_injective_and_optimal(costs in arb_costs()) {
        let assignment = solve_assignment(&costs);
        prop_assert_eq!(assignment.len(), costs.len());

        let assigned: Vec<usize> = assignment.iter().flatten().copied().collect();
        prop_assert_eq!(assigned.len(), costs.len().min(costs[0].len()));
        let mut unique = assigned.clone();
        unique.sort_unstable();
        unique.dedup();
        prop_assert_eq!(unique.len(), assigned.len());

        let cost = assignment_cost(&costs, &assignment);
        prop_assert!((cost - brute_force_cost(&costs)).abs() < 1e-9);
    }

    #[test]
    fn fallback_vectors_have_unit_length(text in ".{0,40}", dimension in 1..256usize) {
        let vector = fallback_embedding(&text, dimension);
        prop_assert_eq!(vector.len(), dimension);
        let norm: f64 = vector.iter().map(|v| f64::from(*v).powi(2)).sum::<f64>().sqrt();
        prop_assert!((norm - 1.0).abs() < 1e-4);
        prop_assert_eq!(fallback_embedding(&text, dimension), vector);
    }
}
