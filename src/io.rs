// Reading point files and printing matrices with fixed precision.

use std::fs;
use std::io::Write;
use std::path::Path;

use log::debug;

use crate::eigen::EigenResult;
use crate::error::{Result, SpectralError};
use crate::matrix::Matrix;

const ACCEPTED_EXTENSIONS: [&str; 2] = ["txt", "csv"];

/// Reads one point per line, coordinates separated by commas.
///
/// The dimension is taken from the first line. Trailing blank lines are ignored.
///
/// # Errors
/// `InvalidInput` if the extension is not `.txt`/`.csv`, the file is empty, a field is not a
/// number, or a row's length differs from the first row's. `Io` if the file cannot be read.
pub fn read_points(path: impl AsRef<Path>) -> Result<Matrix> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default();
    if !ACCEPTED_EXTENSIONS.contains(&extension) {
        return Err(SpectralError::invalid_input(format!(
            "input file {} must end with .txt or .csv",
            path.display()
        )));
    }
    let contents = fs::read_to_string(path)?;
    let points = parse_points(&contents)?;
    debug!(
        "Read {} points of dimension {} from {}.",
        points.rows(),
        points.cols(),
        path.display()
    );
    Ok(points)
}

/// Parses comma-separated rows from an in-memory string.
pub fn parse_points(contents: &str) -> Result<Matrix> {
    let lines: Vec<&str> = contents.trim_end().lines().collect();
    if lines.is_empty() || lines[0].trim().is_empty() {
        return Err(SpectralError::invalid_input("input contains no points"));
    }

    let mut rows = Vec::with_capacity(lines.len());
    for (line_number, line) in lines.iter().enumerate() {
        let row = line
            .split(',')
            .map(|field| {
                field.trim().parse::<f64>().map_err(|_| {
                    SpectralError::invalid_input(format!(
                        "line {}: '{}' is not a number",
                        line_number + 1,
                        field.trim()
                    ))
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        rows.push(row);
    }

    let dim = rows[0].len();
    if let Some((index, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != dim) {
        return Err(SpectralError::invalid_input(format!(
            "line {} has {} values, expected {}",
            index + 1,
            row.len(),
            dim
        )));
    }
    Matrix::from_rows(&rows)
}

/// Formats with four decimals; anything in `(-0.0001, 0]` prints as `0.0000`.
pub fn format_value(value: f64) -> String {
    if value > -0.0001 && value <= 0.0 {
        "0.0000".to_string()
    } else {
        format!("{:.4}", value)
    }
}

fn format_row<'a>(values: impl IntoIterator<Item = &'a f64>) -> String {
    values
        .into_iter()
        .map(|&value| format_value(value))
        .collect::<Vec<_>>()
        .join(",")
}

/// Writes one comma-separated line per matrix row.
pub fn write_matrix<W: Write>(matrix: &Matrix, out: &mut W) -> Result<()> {
    for row in matrix.row_views() {
        writeln!(out, "{}", format_row(row.iter()))?;
    }
    Ok(())
}

/// Writes the eigenvalues as a header line, then the eigenvector matrix row by row.
pub fn write_eigen<W: Write>(eigen: &EigenResult, out: &mut W) -> Result<()> {
    writeln!(out, "{}", format_row(eigen.eigenvalues.iter()))?;
    write_matrix(&eigen.eigenvectors, out)
}

/// Writes a single comma-separated line of indices.
pub fn write_indices<W: Write>(indices: &[usize], out: &mut W) -> Result<()> {
    let line = indices
        .iter()
        .map(|index| index.to_string())
        .collect::<Vec<_>>()
        .join(",");
    writeln!(out, "{}", line)?;
    Ok(())
}
