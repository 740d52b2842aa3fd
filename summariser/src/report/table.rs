use crate::frame::cell_text;
use itertools::Itertools;
use polars::prelude::DataFrame;

/// A table rendered for the narrative document
pub(crate) struct RenderedTable {
    pub text: String,
    /// Markdown rendering was unavailable and the plain layout was used instead
    pub plain_fallback: bool,
}

fn rows(frame: &DataFrame) -> anyhow::Result<(Vec<String>, Vec<Vec<String>>)> {
    let header = frame
        .get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect::<Vec<_>>();

    let mut rows = Vec::with_capacity(frame.height());
    for idx in 0..frame.height() {
        let mut row = Vec::with_capacity(frame.width());
        for column in frame.get_columns() {
            row.push(cell_text(column.get(idx)?));
        }
        rows.push(row);
    }

    Ok((header, rows))
}

#[cfg(feature = "markdown-tables")]
pub(crate) fn render_table(frame: &DataFrame) -> anyhow::Result<RenderedTable> {
    use tabled::builder::Builder;
    use tabled::settings::Style;

    let (header, rows) = rows(frame)?;
    let mut builder = Builder::default();
    builder.push_record(header);
    for row in rows {
        builder.push_record(row);
    }

    let mut table = builder.build();
    table.with(Style::markdown());

    Ok(RenderedTable {
        text: table.to_string(),
        plain_fallback: false,
    })
}

#[cfg(not(feature = "markdown-tables"))]
pub(crate) fn render_table(frame: &DataFrame) -> anyhow::Result<RenderedTable> {
    Ok(RenderedTable {
        text: plain_table(frame)?,
        plain_fallback: true,
    })
}

/// Right-aligned, space separated columns with a header line.
pub fn plain_table(frame: &DataFrame) -> anyhow::Result<String> {
    let (header, rows) = rows(frame)?;

    let mut widths = header.iter().map(|h| h.chars().count()).collect::<Vec<_>>();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:>width$}"))
            .join("  ")
    };

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(line(&header));
    for row in &rows {
        lines.push(line(row));
    }
    Ok(lines.join("\n"))
}
