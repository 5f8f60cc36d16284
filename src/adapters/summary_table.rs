//! Plain-text summary table printed after a screen.

use crate::domain::screen::ScreeningRecord;

const HEADERS: [&str; 4] = ["code", "name", "status", "reason"];

/// Left-aligned columns separated by two spaces, one line per record.
pub fn format_summary_table(records: &[ScreeningRecord]) -> String {
    let rows: Vec<[String; 4]> = records
        .iter()
        .map(|r| {
            [
                r.code.clone(),
                r.name.clone(),
                r.status().to_string(),
                r.reason(),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut output = String::new();
    push_line(&mut output, &HEADERS.map(String::from), &widths);
    for row in &rows {
        push_line(&mut output, row, &widths);
    }
    output
}

fn push_line(output: &mut String, cells: &[String; 4], widths: &[usize; 4]) {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| {
            let pad = width - cell.chars().count();
            format!("{}{}", cell, " ".repeat(pad))
        })
        .collect::<Vec<_>>()
        .join("  ");
    output.push_str(line.trim_end());
    output.push('\n');
}
