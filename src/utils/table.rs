use crate::utils::text::pad_end;

/// Renders a `+---+` boxed table. Column widths count characters.
pub fn render_box_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            rows.iter()
                .filter_map(|row| row.get(i))
                .map(|cell| cell.chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let separator = format!(
        "+{}+",
        widths
            .iter()
            .map(|w| "-".repeat(w + 2))
            .collect::<Vec<_>>()
            .join("+")
    );
    let render_row = |cells: Vec<&str>| -> String {
        let inner = cells
            .iter()
            .zip(widths.iter())
            .map(|(cell, width)| format!(" {} ", pad_end(cell, *width)))
            .collect::<Vec<_>>()
            .join("|");
        format!("|{}|", inner)
    };

    let mut lines = Vec::with_capacity(rows.len() + 4);
    lines.push(separator.clone());
    lines.push(render_row(headers.to_vec()));
    lines.push(separator.clone());
    for row in rows {
        let cells: Vec<&str> = (0..headers.len())
            .map(|i| row.get(i).map(String::as_str).unwrap_or(""))
            .collect();
        lines.push(render_row(cells));
    }
    lines.push(separator);
    lines.join("\n")
}

pub fn csv_quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Header line is written bare; every data field is quoted.
pub fn render_csv(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(headers.join(","));
    for row in rows {
        lines.push(
            row.iter()
                .map(|cell| csv_quote(cell))
                .collect::<Vec<_>>()
                .join(","),
        );
    }
    lines.join("\n")
}
