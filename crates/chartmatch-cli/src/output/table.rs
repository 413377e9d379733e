use chartmatch_core::{MatchOutcome, Table};

/// Render a result table as aligned plain text.
pub fn format_table(table: &Table) -> String {
    let mut widths: Vec<usize> = table.columns.iter().map(|c| c.chars().count()).collect();
    for row in &table.rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let render = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    out.push_str(&render(&table.columns));
    out.push('\n');
    out.push_str(&"-".repeat(widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1)));
    out.push('\n');
    for row in &table.rows {
        out.push_str(&render(row));
        out.push('\n');
    }
    out
}

pub fn print_summary(outcome: &MatchOutcome) {
    println!("  PDF files:          {}", outcome.files_processed);
    println!("  Extracted records:  {}", outcome.extraction.rows.len());
    println!("  Spreadsheet rows:   {}", outcome.merged.rows.len());
    println!("  Matched rows:       {}", outcome.matched);
    println!();
    print!("{}", format_table(&outcome.merged));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_table_aligns_columns() {
        let table = Table {
            columns: vec!["Name".into(), "Visit No".into()],
            rows: vec![vec!["Jane Doe".into(), "3 / 40".into()]],
        };
        let text = format_table(&table);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Name      Visit No");
        assert_eq!(lines[1], "-".repeat(18));
        assert_eq!(lines[2], "Jane Doe  3 / 40");
    }
}
