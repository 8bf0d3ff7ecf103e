use anyhow::{Context, Result};
use ndarray::Array2;
use prettytable::format::{FormatBuilder, LinePosition, LineSeparator};
use prettytable::Table;
use std::fs;
use std::path::Path;
use vinecop::{node, Vinecop};

pub fn create_table() -> Table {
    let mut table = Table::new();
    table.set_format(
        FormatBuilder::new()
            .column_separator(' ')
            .separator(LinePosition::Title, LineSeparator::new('-', '+', ' ', ' '))
            .build(),
    );
    table
}

/// Reads a whitespace/comma-separated matrix of pseudo-observations.
pub fn read_matrix(path: &Path) -> Result<Array2<f64>> {
    let text = fs::read_to_string(path).context(format!("unable to read '{}'", path.display()))?;
    let rows: Vec<Vec<f64>> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            line.split(|c: char| c == ',' || c.is_whitespace())
                .filter(|field| !field.is_empty())
                .map(str::parse::<f64>)
                .collect::<Result<Vec<_>, _>>()
                .context(format!("malformed row in '{}'", path.display()))
        })
        .collect::<Result<_>>()?;

    let ncols = rows.first().map_or(0, Vec::len);
    if rows.iter().any(|row| row.len() != ncols) {
        anyhow::bail!("'{}' has rows of differing length", path.display());
    }

    let mut matrix = Array2::zeros((rows.len(), ncols));
    for (i, row) in rows.into_iter().enumerate() {
        for (j, value) in row.into_iter().enumerate() {
            matrix[[i, j]] = value;
        }
    }
    Ok(matrix)
}

pub fn write_matrix(path: &Path, matrix: &Array2<f64>) -> Result<()> {
    let mut text = String::new();
    for row in matrix.rows() {
        let fields: Vec<String> = row.iter().map(|v| format!("{v}")).collect();
        text.push_str(&fields.join(","));
        text.push('\n');
    }
    fs::write(path, text).context(format!("unable to write '{}'", path.display()))
}

pub fn read_model(path: &Path) -> Result<Vinecop> {
    let text = fs::read_to_string(path).context(format!("unable to read '{}'", path.display()))?;
    let json: serde_json::Value = serde_json::from_str(&text).context(format!("'{}' is not valid JSON", path.display()))?;
    node::vinecop_from_node(&node::Node::from_json(json)).context(format!("'{}' is not a valid vine copula model", path.display()))
}

pub fn write_model(path: &Path, vine: &Vinecop) -> Result<()> {
    let json = node::vinecop_to_node(vine).to_json();
    let text = serde_json::to_string_pretty(&json)?;
    fs::write(path, text).context(format!("unable to write '{}'", path.display()))
}
