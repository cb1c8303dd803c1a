use std::error::Error;

use crate::config::Settings;

/// The whole export, held in memory.  Cells are kept as text; typing is
/// left to whoever queries the loaded table.
#[derive(Debug, PartialEq)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Dataset {
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }
}

pub fn download(settings: &Settings) -> Result<Dataset, Box<dyn Error>> {
    let body = super::get_text(
        &settings.data_url(),
        &settings.kobo_username,
        &settings.kobo_password,
    )?;
    parse_csv(&body)
}

/// Kobo exports use `;` or `,` depending on the export settings.  Decide
/// from the header line; a semicolon outside quoted fields wins.
pub fn detect_delimiter(text: &str) -> u8 {
    let header = text.lines().next().unwrap_or("");
    let mut in_quotes = false;
    let mut semicolons = 0;
    for c in header.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => semicolons += 1,
            _ => {}
        }
    }
    if semicolons > 0 {
        b';'
    } else {
        b','
    }
}

/// Parse the delimited export.  Header names are trimmed; ragged rows are
/// padded with empty cells (or truncated) to the header width.
pub fn parse_csv(text: &str) -> Result<Dataset, Box<dyn Error>> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(detect_delimiter(text))
        .flexible(true)
        .has_headers(true)
        .from_reader(text.as_bytes());

    let columns: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let mut row: Vec<String> = record.iter().map(|cell| cell.to_string()).collect();
        row.resize(columns.len(), String::new());
        rows.push(row);
    }

    Ok(Dataset { columns, rows })
}
