//! Plain-text table rendering for analysis results

use crate::output::MetricsRecord;

const HEADERS: [&str; 5] = ["REPOSITORY", "STARS", "FORKS", "WATCHERS", "URL"];

/// Formats records as an aligned text table followed by a count line
///
/// Text columns are left-aligned, numeric columns right-aligned.
pub fn format_table(records: &[&MetricsRecord]) -> String {
    let rows: Vec<[String; 5]> = records
        .iter()
        .map(|r| {
            [
                r.repository.to_string(),
                r.stars.to_string(),
                r.forks.to_string(),
                r.watchers.to_string(),
                r.url.clone(),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_row(&mut out, &HEADERS.map(String::from), &widths);
    for row in &rows {
        push_row(&mut out, row, &widths);
    }
    out.push_str(&format!(
        "\n{} {}\n",
        records.len(),
        if records.len() == 1 {
            "repository"
        } else {
            "repositories"
        }
    ));
    out
}

fn push_row(out: &mut String, cells: &[String; 5], widths: &[usize; 5]) {
    let line = format!(
        "{:<w0$}  {:>w1$}  {:>w2$}  {:>w3$}  {}",
        cells[0],
        cells[1],
        cells[2],
        cells[3],
        cells[4],
        w0 = widths[0],
        w1 = widths[1],
        w2 = widths[2],
        w3 = widths[3],
    );
    out.push_str(line.trim_end());
    out.push('\n');
}
