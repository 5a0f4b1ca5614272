//! Minimum-cost bipartite assignment (Hungarian algorithm).
//!
//! Uses the shortest augmenting path formulation with row and column potentials,
//! `O(n^2 m)` for `n <= m`. Rectangular inputs are solved directly; when rows outnumber
//! columns the matrix is transposed so every column receives a row.

/// Replacement for NaN and infinite costs.
pub const NON_FINITE_COST: f64 = 1e12;

/// Assigns each row to at most one column, minimizing total cost.
///
/// Returns one entry per row. When there are at least as many columns as rows every
/// row is assigned; otherwise exactly `columns` rows are. Ragged rows are padded with
/// [`NON_FINITE_COST`].
pub fn solve_assignment(costs: &[Vec<f64>]) -> Vec<Option<usize>> {
    let rows = costs.len();
    let columns = costs.iter().map(Vec::len).max().unwrap_or(0);
    if rows == 0 {
        return Vec::new();
    }
    if columns == 0 {
        return vec![None; rows];
    }
    let matrix: Vec<Vec<f64>> = costs
        .iter()
        .map(|row| {
            (0..columns)
                .map(|j| sanitize(row.get(j).copied().unwrap_or(NON_FINITE_COST)))
                .collect()
        })
        .collect();

    if rows <= columns {
        return hungarian(&matrix, rows, columns)
            .into_iter()
            .map(Some)
            .collect();
    }

    let transposed: Vec<Vec<f64>> = (0..columns)
        .map(|j| matrix.iter().map(|row| row[j]).collect())
        .collect();
    let mut assignment = vec![None; rows];
    for (column, row) in hungarian(&transposed, columns, rows).into_iter().enumerate() {
        assignment[row] = Some(column);
    }
    assignment
}

/// Assignment maximizing total score.
pub fn maximize_assignment(scores: &[Vec<f64>]) -> Vec<Option<usize>> {
    let costs: Vec<Vec<f64>> = scores
        .iter()
        .map(|row| row.iter().map(|score| -score).collect())
        .collect();
    solve_assignment(&costs)
}

/// Total cost of an assignment, ignoring unassigned rows.
pub fn assignment_cost(costs: &[Vec<f64>], assignment: &[Option<usize>]) -> f64 {
    assignment
        .iter()
        .enumerate()
        .filter_map(|(row, column)| column.and_then(|j| costs[row].get(j)))
        .sum()
}

fn sanitize(cost: f64) -> f64 {
    if cost.is_finite() { cost } else { NON_FINITE_COST }
}

/// Solves an `n x m` problem with `n <= m`, returning the column of every row.
fn hungarian(matrix: &[Vec<f64>], n: usize, m: usize) -> Vec<usize> {
    // Potentials and matching are 1-indexed; index 0 is the virtual start column.
    let mut u = vec![0.0_f64; n + 1];
    let mut v = vec![0.0_f64; m + 1];
    let mut matched_row = vec![0_usize; m + 1];
    let mut way = vec![0_usize; m + 1];

    for row in 1..=n {
        matched_row[0] = row;
        let mut column = 0_usize;
        let mut min_slack = vec![f64::INFINITY; m + 1];
        let mut used = vec![false; m + 1];
        loop {
            used[column] = true;
            let current_row = matched_row[column];
            let mut delta = f64::INFINITY;
            let mut next_column = 0_usize;
            for j in 1..=m {
                if used[j] {
                    continue;
                }
                let slack = matrix[current_row - 1][j - 1] - u[current_row] - v[j];
                if slack < min_slack[j] {
                    min_slack[j] = slack;
                    way[j] = column;
                }
                if min_slack[j] < delta {
                    delta = min_slack[j];
                    next_column = j;
                }
            }
            for j in 0..=m {
                if used[j] {
                    u[matched_row[j]] += delta;
                    v[j] -= delta;
                } else {
                    min_slack[j] -= delta;
                }
            }
            column = next_column;
            if matched_row[column] == 0 {
                break;
            }
        }
        loop {
            let previous = way[column];
            matched_row[column] = matched_row[previous];
            column = previous;
            if column == 0 {
                break;
            }
        }
    }

    let mut assignment = vec![0_usize; n];
    for j in 1..=m {
        if matched_row[j] != 0 {
            assignment[matched_row[j] - 1] = j - 1;
        }
    }
    assignment
}
