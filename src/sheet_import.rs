use calamine::{open_workbook_auto_from_rs, Reader};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info};

use crate::chunked::{process_in_chunks, ImportProgress, NoProgress};
use crate::file_host::{FileHost, NativeFileHost};
use crate::row_normalize::{trim_cell, RawRow, RowNormalizer};
use crate::subscription::SubscriptionRecord;

pub const UNSUPPORTED_FORMAT_MESSAGE: &str = "unsupported file format, please use CSV or Excel";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportResult {
    pub success: bool,
    pub data: Vec<SubscriptionRecord>,
    pub errors: Vec<String>,
}

fn read_csv_rows(text: &str) -> Result<Vec<RawRow>, String> {
    let content = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| format!("failed to read csv header: {e}"))?
        .iter()
        .map(trim_cell)
        .collect::<Vec<_>>();

    let mut rows = Vec::new();
    for rec in reader.records() {
        let rec = rec.map_err(|e| format!("failed to read csv row: {e}"))?;
        if rec.iter().all(|c| trim_cell(c).is_empty()) {
            continue;
        }
        rows.push(
            headers
                .iter()
                .zip(rec.iter())
                .map(|(h, c)| (h.clone(), c.to_string()))
                .collect::<RawRow>(),
        );
    }
    Ok(rows)
}

fn read_sheet_rows(bytes: Vec<u8>) -> Result<Vec<RawRow>, String> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| format!("failed to open workbook: {e}"))?;
    let sheet_names = workbook.sheet_names().to_owned();
    let first_sheet = sheet_names
        .first()
        .cloned()
        .ok_or_else(|| "no worksheet found in workbook".to_string())?;

    let range = workbook
        .worksheet_range(&first_sheet)
        .map_err(|e| format!("failed to read worksheet: {e}"))?;

    let mut sheet_rows = range.rows();
    let Some(header_row) = sheet_rows.next() else {
        return Ok(Vec::new());
    };
    let headers = header_row
        .iter()
        .map(|cell| trim_cell(&cell.to_string()))
        .collect::<Vec<_>>();

    let mut rows = Vec::new();
    for row in sheet_rows {
        let cells = row
            .iter()
            .map(|cell| trim_cell(&cell.to_string()))
            .collect::<Vec<_>>();
        if cells.iter().all(|c| c.is_empty()) {
            continue;
        }
        rows.push(headers.iter().cloned().zip(cells).collect::<RawRow>());
    }
    Ok(rows)
}

async fn normalize_rows(
    rows: Vec<RawRow>,
    progress: &dyn ImportProgress,
) -> Result<ImportResult, String> {
    let total = rows.len();
    let normalizer = RowNormalizer::new();
    let indexed = rows.into_iter().enumerate().collect::<Vec<_>>();
    let outcomes = process_in_chunks(
        indexed,
        move |(index, row)| normalizer.normalize(&row, index),
        progress,
    )
    .await?;

    let mut data = Vec::new();
    let mut errors = Vec::new();
    for outcome in outcomes {
        if let Some(subscription) = outcome.subscription {
            data.push(subscription);
        }
        if let Some(error) = outcome.error {
            errors.push(error);
        }
    }
    info!(
        rows = total,
        accepted = data.len(),
        diagnostics = errors.len(),
        "import normalized"
    );
    Ok(ImportResult {
        success: !data.is_empty(),
        data,
        errors,
    })
}

pub async fn parse_csv_with(
    host: &dyn FileHost,
    path: &Path,
    progress: &dyn ImportProgress,
) -> Result<ImportResult, String> {
    let text = host.read_text(path)?;
    let rows = read_csv_rows(&text)?;
    debug!(path = %path.display(), rows = rows.len(), "tokenized csv");
    normalize_rows(rows, progress).await
}

pub async fn parse_csv(path: &Path) -> Result<ImportResult, String> {
    parse_csv_with(&NativeFileHost, path, &NoProgress).await
}

pub async fn parse_excel_with(
    host: &dyn FileHost,
    path: &Path,
    progress: &dyn ImportProgress,
) -> Result<ImportResult, String> {
    let bytes = host.read_binary(path)?;
    let rows = read_sheet_rows(bytes)?;
    debug!(path = %path.display(), rows = rows.len(), "tokenized workbook");
    normalize_rows(rows, progress).await
}

pub async fn parse_excel(path: &Path) -> Result<ImportResult, String> {
    parse_excel_with(&NativeFileHost, path, &NoProgress).await
}

/// Route a file to the reader its extension calls for. Unsupported
/// extensions produce a failed `ImportResult` without touching the file;
/// unreadable files and tokenizer faults propagate as errors.
pub async fn parse_import_file_with(
    host: &dyn FileHost,
    path: &Path,
    progress: &dyn ImportProgress,
) -> Result<ImportResult, String> {
    let suffix = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    match suffix.as_str() {
        "csv" => parse_csv_with(host, path, progress).await,
        "xlsx" | "xls" => parse_excel_with(host, path, progress).await,
        _ => Ok(ImportResult {
            success: false,
            data: Vec::new(),
            errors: vec![UNSUPPORTED_FORMAT_MESSAGE.to_string()],
        }),
    }
}

pub async fn parse_import_file(path: &Path) -> Result<ImportResult, String> {
    parse_import_file_with(&NativeFileHost, path, &NoProgress).await
}
