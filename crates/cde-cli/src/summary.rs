use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use cde_map::{MappingTable, MatchOutcome, SynthesisWarning};
use cde_model::{Schema, Violation};
use cde_transform::TransformWarning;

use cde_cli::pipeline::describe_method;

/// Alternatives shown next to the chosen code.
const SHOWN_ALTERNATIVES: usize = 3;

pub fn print_match_summary(outcome: &MatchOutcome, table: &MappingTable) {
    println!("Method: {}", describe_method(outcome));
    let mut out = Table::new();
    out.set_header(vec![
        header_cell("Column"),
        header_cell("CDE"),
        header_cell("Type"),
        header_cell("Distance"),
        header_cell("Transform"),
        header_cell("Alternatives"),
    ]);
    apply_table_style(&mut out);
    align_column(&mut out, 3, CellAlignment::Right);
    for row in table {
        let result = outcome.get(&row.dataset_column);
        let distance = result
            .and_then(|r| r.candidates().find(|(code, _)| *code == row.cde_code))
            .map_or_else(|| dim_cell("-"), |(_, d)| Cell::new(format!("{d:.3}")));
        let alternatives = result
            .map(|r| {
                r.candidates()
                    .filter(|(code, _)| *code != row.cde_code)
                    .take(SHOWN_ALTERNATIVES)
                    .map(|(code, d)| format!("{code} ({d:.3})"))
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default();
        out.add_row(vec![
            Cell::new(&row.dataset_column),
            Cell::new(&row.cde_code)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(row.cde_type),
            distance,
            Cell::new(&row.transform),
            Cell::new(alternatives).fg(Color::DarkGrey),
        ]);
    }
    println!("{out}");

    for failure in &outcome.failures {
        println!("unmatched: {} ({})", failure.column, failure.reason);
    }
}

pub fn print_synthesis_warnings(warnings: &[SynthesisWarning]) {
    print_warning_lines(warnings.iter().map(ToString::to_string));
}

pub fn print_transform_warnings(warnings: &[TransformWarning]) {
    print_warning_lines(warnings.iter().map(ToString::to_string));
}

pub fn print_violations(violations: &[Violation]) {
    let mut out = Table::new();
    out.set_header(vec![header_cell("Severity"), header_cell("Problem")]);
    apply_table_style(&mut out);
    for violation in violations {
        out.add_row(vec![Cell::new("ERROR").fg(Color::Red), Cell::new(violation)]);
    }
    println!("{out}");
    println!("{} violation(s)", violations.len());
}

pub fn print_codes(schema: &Schema) {
    let mut out = Table::new();
    out.set_header(vec![
        header_cell("Code"),
        header_cell("Type"),
        header_cell("Values"),
    ]);
    apply_table_style(&mut out);
    for entry in schema.entries() {
        let values = entry
            .values
            .as_ref()
            .map(|domain| {
                domain
                    .values()
                    .iter()
                    .map(|v| format!("{} = {}", v.code, v.label))
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default();
        out.add_row(vec![
            Cell::new(&entry.code).add_attribute(Attribute::Bold),
            Cell::new(entry.cde_type),
            Cell::new(values),
        ]);
    }
    println!("{out}");
}

fn print_warning_lines(lines: impl Iterator<Item = String>) {
    let mut out = Table::new();
    out.set_header(vec![header_cell("Severity"), header_cell("Message")]);
    apply_table_style(&mut out);
    let mut count = 0usize;
    for line in lines {
        out.add_row(vec![Cell::new("WARN").fg(Color::Yellow), Cell::new(line)]);
        count += 1;
    }
    if count > 0 {
        println!("{out}");
    }
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
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

fn dim_cell(label: &str) -> Cell {
    Cell::new(label).fg(Color::DarkGrey)
}
