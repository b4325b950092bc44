// src/io/clients.rs - Reads the client-name list handed to the engine

use anyhow::{bail, Context, Result};
use log::info;
use std::fs;
use std::path::Path;

const UTF8_BOM: char = '\u{feff}';

/// Read one client name per line. Blank lines are kept so the engine can
/// report them as skipped at their original position.
///
/// With `column`, rows are parsed as `;`, `,` or tab separated records
/// (whichever the first non-blank line uses) and the 0-based field is taken.
pub fn read_client_names(path: &Path, column: Option<usize>) -> Result<Vec<String>> {
    let raw = fs::read(path)
        .with_context(|| format!("Failed to read client list {}", path.display()))?;
    let text = String::from_utf8_lossy(&raw);
    let text = text.strip_prefix(UTF8_BOM).unwrap_or(&text);

    let names = match column {
        None => text.lines().map(str::to_string).collect::<Vec<_>>(),
        Some(column) => read_column(text, column)
            .with_context(|| format!("Failed to parse client list {}", path.display()))?,
    };

    if names.iter().all(|name| name.trim().is_empty()) {
        bail!("Client list {} contains no names", path.display());
    }
    info!("Read {} client rows from {}", names.len(), path.display());
    Ok(names)
}

fn read_column(text: &str, column: usize) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(detect_delimiter(text))
        .from_reader(text.as_bytes());

    let mut names = Vec::new();
    let mut next_line: u64 = 1;
    for (row, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Malformed client row {}", row + 1))?;
        // the reader skips blank lines; put them back as empty names
        if let Some(position) = record.position() {
            while next_line < position.line() {
                names.push(String::new());
                next_line += 1;
            }
            let embedded_newlines: usize = record.iter().map(|field| field.matches('\n').count()).sum();
            next_line = position.line() + 1 + embedded_newlines as u64;
        }
        names.push(
            record
                .get(column)
                .map(|field| field.trim().to_string())
                .unwrap_or_default(),
        );
    }
    Ok(names)
}

fn detect_delimiter(text: &str) -> u8 {
    let sample = text.lines().find(|line| !line.trim().is_empty()).unwrap_or("");
    [b'\t', b';', b',']
        .into_iter()
        .max_by_key(|d| sample.bytes().filter(|b| b == d).count())
        .filter(|d| sample.as_bytes().contains(d))
        .unwrap_or(b';')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_reads_lines_and_strips_bom() {
        let file = write_temp("\u{feff}Viapol Ltda\n\nEMS S.A.\r\n");
        let names = read_client_names(file.path(), None).unwrap();
        assert_eq!(names, vec!["Viapol Ltda", "", "EMS S.A."]);
    }

    #[test]
    fn test_reads_column_of_delimited_rows() {
        let file = write_temp("codigo;cliente\n1;Viapol Ltda\n2;\"EMS S.A.\"\n3\n");
        let names = read_client_names(file.path(), Some(1)).unwrap();
        assert_eq!(names, vec!["cliente", "Viapol Ltda", "EMS S.A.", ""]);
    }

    #[test]
    fn test_quoted_field_keeps_embedded_delimiter() {
        let file = write_temp("1,\"Acme, Inc.\"\n\n2,Viapol Ltda\n");
        let names = read_client_names(file.path(), Some(1)).unwrap();
        assert_eq!(names, vec!["Acme, Inc.", "", "Viapol Ltda"]);
    }

    #[test]
    fn test_detects_tab_delimiter() {
        assert_eq!(detect_delimiter("a\tb\tc"), b'\t');
        assert_eq!(detect_delimiter("a,b"), b',');
        assert_eq!(detect_delimiter("single"), b';');
    }

    #[test]
    fn test_empty_list_is_an_error() {
        let file = write_temp("\n  \n");
        assert!(read_client_names(file.path(), None).is_err());
        assert!(read_client_names(Path::new("/nonexistent/clients.txt"), None).is_err());
    }
}
