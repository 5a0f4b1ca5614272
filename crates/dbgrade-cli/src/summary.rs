use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use dbgrade_model::{SchemaGrade, UNMATCHED_PLACEHOLDER};

use crate::commands::{BatchRun, GradeRun};

pub fn print_grade(run: &GradeRun) {
    let grade = &run.grade;
    println!("Student: {}", run.identifier);
    print_tables(grade);
    print_columns(grade);
    if !grade.foreign_keys.is_empty() {
        print_foreign_keys(grade);
    }
    println!(
        "Score: {:.4} ({} of {} tables hit, {:.1}% columns matched, {:.1}% foreign keys matched)",
        grade.schema_score,
        grade.tables_hit,
        grade.tables.len(),
        grade.matched_column_ratio * 100.0,
        grade.foreign_key_ratio * 100.0,
    );
    for path in &run.exports {
        println!("Wrote {}", path.display());
    }
}

fn print_tables(grade: &SchemaGrade) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Answer table"),
        header_cell("Student table"),
        header_cell("Similarity"),
        header_cell("Columns"),
        header_cell("PK"),
        header_cell("FK"),
        header_cell("Hit"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    for column in 4..=6 {
        align_column(&mut table, column, CellAlignment::Center);
    }
    for pair in &grade.tables {
        let verdict = grade.verdict(&pair.answer_table);
        let columns = verdict.map_or_else(
            || "-".to_string(),
            |v| format!("{}/{}", v.matched_columns, v.answer_columns),
        );
        table.add_row(vec![
            Cell::new(&pair.answer_table)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            student_cell(pair.student_table.as_deref()),
            Cell::new(format!("{:.4}", pair.similarity_score)),
            Cell::new(columns),
            check_cell(verdict.is_some_and(|v| v.primary_key_ok)),
            check_cell(verdict.is_some_and(|v| v.foreign_keys_ok)),
            check_cell(verdict.is_some_and(|v| v.hit)),
        ]);
    }
    println!("{table}");
}

fn print_columns(grade: &SchemaGrade) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Answer table"),
        header_cell("Answer column"),
        header_cell("Type"),
        header_cell("Student column"),
        header_cell("Type"),
        header_cell("Similarity"),
        header_cell("Matched"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 5, CellAlignment::Right);
    align_column(&mut table, 6, CellAlignment::Center);
    for column in &grade.columns {
        table.add_row(vec![
            dim_cell(&column.answer_table),
            Cell::new(&column.answer_col),
            dim_cell(&column.answer_type),
            student_cell(column.student_col.as_deref()),
            dim_cell(column.student_type_label()),
            Cell::new(format!("{:.4}", column.similarity_score)),
            check_cell(column.is_matched()),
        ]);
    }
    println!("{table}");
}

fn print_foreign_keys(grade: &SchemaGrade) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Answer foreign key"),
        header_cell("Student foreign key"),
        header_cell("Matched"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Center);
    for foreign_key in &grade.foreign_keys {
        table.add_row(vec![
            Cell::new(&foreign_key.answer),
            student_cell(foreign_key.student.as_deref()),
            check_cell(foreign_key.matched),
        ]);
    }
    println!("{table}");
}

pub fn print_batch(run: &BatchRun) {
    let result = &run.result;
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Student"),
        header_cell("Score"),
        header_cell("Tables hit"),
        header_cell("Columns"),
        header_cell("Foreign keys"),
        header_cell("Error"),
    ]);
    apply_summary_table_style(&mut table);
    for column in 1..=4 {
        align_column(&mut table, column, CellAlignment::Right);
    }
    for entry in &result.entries {
        match &entry.outcome {
            Ok(grade) => table.add_row(vec![
                Cell::new(&entry.identifier)
                    .fg(Color::Blue)
                    .add_attribute(Attribute::Bold),
                Cell::new(format!("{:.4}", grade.schema_score)),
                count_cell(grade.tables_hit),
                Cell::new(format!("{:.1}%", grade.matched_column_ratio * 100.0)),
                Cell::new(format!("{:.1}%", grade.foreign_key_ratio * 100.0)),
                dim_cell("-"),
            ]),
            Err(error) => table.add_row(vec![
                Cell::new(&entry.identifier).fg(Color::Red),
                dim_cell("-"),
                dim_cell("-"),
                dim_cell("-"),
                dim_cell("-"),
                Cell::new(error).fg(Color::Red),
            ]),
        };
    }
    table.add_row(vec![
        Cell::new("MEAN")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(format!("{:.4}", result.mean_score())).add_attribute(Attribute::Bold),
        dim_cell("-"),
        dim_cell("-"),
        dim_cell("-"),
        failure_cell(result.failed()),
    ]);
    println!("{table}");
    println!("Results: {}", run.results_file.display());
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(140);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn student_cell(name: Option<&str>) -> Cell {
    match name {
        Some(name) => Cell::new(name),
        None => dim_cell(UNMATCHED_PLACEHOLDER),
    }
}

fn check_cell(ok: bool) -> Cell {
    if ok {
        Cell::new("✓")
            .fg(Color::Green)
            .add_attribute(Attribute::Bold)
    } else {
        Cell::new("✗").fg(Color::Red)
    }
}

fn count_cell(count: usize) -> Cell {
    if count > 0 {
        Cell::new(count).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn failure_cell(failed: usize) -> Cell {
    if failed > 0 {
        Cell::new(format!("{failed} failed"))
            .fg(Color::Red)
            .add_attribute(Attribute::Bold)
    } else {
        dim_cell("-")
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
