//! Aligned text table.

use transctl_core::{Cell, Column, Record};

use super::{RenderOptions, header};

const GAP: &str = "  ";

fn right_aligned(cell: &Cell) -> bool {
    matches!(
        cell,
        Cell::Int(_)
            | Cell::Float(_)
            | Cell::Bytes(_)
            | Cell::Rate(_)
            | Cell::Limit(_)
            | Cell::KiLimit(_)
            | Cell::Percent(_)
    )
}

pub(super) fn render<R: Record>(
    records: &[&R],
    columns: &[Column<R>],
    options: &RenderOptions,
) -> String {
    let mut cells: Vec<Vec<Cell>> = records
        .iter()
        .map(|record| columns.iter().map(|column| column.value(record)).collect())
        .collect();

    let totals_row = (options.totals && !cells.is_empty())
        .then(|| totals(&cells, columns.len()))
        .flatten();
    if let Some(row) = totals_row {
        cells.push(row);
    }

    let mut align_right = vec![false; columns.len()];
    for row in &cells {
        for (index, cell) in row.iter().enumerate() {
            if right_aligned(cell) {
                align_right[index] = true;
            }
        }
    }

    let mut lines: Vec<Vec<String>> = Vec::with_capacity(cells.len() + 1);
    if options.headers {
        lines.push(
            columns
                .iter()
                .map(|column| header(options.display_name(column.name)))
                .collect(),
        );
    }
    lines.extend(
        cells
            .iter()
            .map(|row| row.iter().map(|cell| cell.render(options.bytes)).collect()),
    );

    let mut widths = vec![0; columns.len()];
    for line in &lines {
        for (index, text) in line.iter().enumerate() {
            widths[index] = widths[index].max(text.chars().count());
        }
    }

    let mut output = String::new();
    for line in lines {
        let mut rendered = String::new();
        for (index, text) in line.iter().enumerate() {
            if index > 0 {
                rendered.push_str(GAP);
            }
            let width = widths[index];
            if align_right[index] {
                rendered.push_str(&format!("{text:>width$}"));
            } else {
                rendered.push_str(&format!("{text:<width$}"));
            }
        }
        output.push_str(rendered.trim_end());
        output.push('\n');
    }
    output
}

/// Sum of every byte-like column; `None` when no column qualifies.
fn totals(rows: &[Vec<Cell>], width: usize) -> Option<Vec<Cell>> {
    let mut sums = vec![Cell::Empty; width];
    let mut any = false;
    for row in rows {
        for (index, cell) in row.iter().enumerate() {
            if cell.is_byte_like() {
                sums[index] = sums[index].add(cell);
                any = true;
            }
        }
    }
    any.then_some(sums)
}

#[cfg(test)]
mod tests {
    use transctl_core::{ByteFormat, Torrent};

    use super::*;
    use crate::output::{TORRENT_COLUMNS, render as render_records};

    fn torrent(hash: &str, have: i64) -> Torrent {
        serde_json::from_value(serde_json::json!({"hashString": hash, "haveValid": have}))
            .expect("valid torrent")
    }

    fn options(format: &str) -> RenderOptions {
        RenderOptions {
            format: format.parse().expect("valid format"),
            ..RenderOptions::default()
        }
    }

    #[test]
    fn byte_columns_get_a_totals_row() -> crate::client::CliResult<()> {
        let records = [torrent("aaa", 1024), torrent("bbb", 2048), torrent("ccc", 0)];
        let text = render_records(&records, TORRENT_COLUMNS, &options("table=hashString,haveValid"))?;
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "HASH_STRING  HAVE_VALID");
        assert_eq!(lines[2], format!("{:<11}  {:>10}", "bbb", "2.0 KiB"));
        assert_eq!(lines[3], format!("{:<11}  {:>10}", "ccc", "0 B"));
        assert_eq!(lines[4], format!("{:<11}  {:>10}", "", "3.0 KiB"));
        assert_eq!(lines.len(), 5);
        Ok(())
    }

    #[test]
    fn totals_and_headers_can_be_suppressed() -> crate::client::CliResult<()> {
        let records = [torrent("aaa", 1024)];
        let mut opts = options("table=hashString,haveValid");
        opts.totals = false;
        opts.headers = false;
        opts.bytes = ByteFormat::RAW;
        let text = render_records(&records, TORRENT_COLUMNS, &opts)?;
        assert_eq!(text, "aaa  1024\n");
        Ok(())
    }

    #[test]
    fn empty_results_have_no_totals() -> crate::client::CliResult<()> {
        let text = render_records::<Torrent>(&[], TORRENT_COLUMNS, &options("table=haveValid"))?;
        assert_eq!(text, "HAVE_VALID\n");
        Ok(())
    }

    #[test]
    fn renames_change_headers() -> crate::client::CliResult<()> {
        let mut opts = options("table=shortHash,haveValid");
        opts.renames.insert("shortHash".into(), "hash".into());
        let text = render_records(&[torrent("abcdef0123", 0)], TORRENT_COLUMNS, &opts)?;
        assert_eq!(text.lines().next(), Some("HASH     HAVE_VALID"));
        Ok(())
    }
}
