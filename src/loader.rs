use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;

use crate::models::{AuditRecord, Dataset};

pub const DEFAULT_DATASET: &str = "qualidade_database.csv";

pub const REQUIRED_COLUMNS: [&str; 8] = [
    "id_auditoria",
    "data_auditoria",
    "nome_projeto",
    "tipo_auditoria",
    "item_auditado",
    "resultado_texto",
    "resultado_valor",
    "observacoes",
];

pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d/%m/%Y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("no dataset path was given")]
    NoCandidates,

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed delimited data in {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{} is missing required column `{column}`", path.display())]
    MissingColumn { path: PathBuf, column: &'static str },

    #[error("{}:{line}: unparseable audit date `{value}`", path.display())]
    InvalidDate {
        path: PathBuf,
        line: u64,
        value: String,
    },

    #[error("{}:{line}: unparseable result value `{value}`", path.display())]
    InvalidValue {
        path: PathBuf,
        line: u64,
        value: String,
    },

    #[error("no readable dataset among [{tried}]; last error: {last}")]
    Exhausted { tried: String, last: Box<LoadError> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
    Latin1,
}

#[derive(Deserialize)]
struct CsvRow {
    id_auditoria: String,
    data_auditoria: String,
    nome_projeto: Option<String>,
    tipo_auditoria: String,
    item_auditado: String,
    resultado_texto: String,
    resultado_valor: Option<String>,
    observacoes: Option<String>,
}

/// Memoizes loaded datasets by their resolved candidate list. The source file
/// is assumed not to change while the process runs.
#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: HashMap<Vec<PathBuf>, Arc<Dataset>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_load(&mut self, candidates: &[PathBuf]) -> Result<Arc<Dataset>, LoadError> {
        let key: Vec<PathBuf> = candidates
            .iter()
            .map(|path| std::path::absolute(path).unwrap_or_else(|_| path.clone()))
            .collect();

        if let Some(dataset) = self.entries.get(&key) {
            tracing::debug!(records = dataset.len(), "dataset cache hit");
            return Ok(Arc::clone(dataset));
        }

        let dataset = Arc::new(load_first(candidates)?);
        self.entries.insert(key, Arc::clone(&dataset));
        Ok(dataset)
    }
}

/// Tries each candidate in order; the first one that loads wins.
pub fn load_first(candidates: &[PathBuf]) -> Result<Dataset, LoadError> {
    let mut last = None;

    for path in candidates {
        match load_path(path) {
            Ok(dataset) => return Ok(dataset),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "dataset candidate rejected");
                last = Some(err);
            }
        }
    }

    match (candidates.len(), last) {
        (_, None) => Err(LoadError::NoCandidates),
        (1, Some(err)) => Err(err),
        (_, Some(err)) => Err(LoadError::Exhausted {
            tried: candidates
                .iter()
                .map(|path| path.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
            last: Box::new(err),
        }),
    }
}

pub fn load_path(path: &Path) -> Result<Dataset, LoadError> {
    let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_bytes(bytes, path)
}

pub fn parse_bytes(mut bytes: Vec<u8>, source: &Path) -> Result<Dataset, LoadError> {
    // Dropped before decoding so a Latin-1 fallback cannot turn it into text.
    if bytes.starts_with(UTF8_BOM) {
        bytes.drain(..UTF8_BOM.len());
    }
    let (text, encoding) = decode(bytes);
    if encoding == Encoding::Latin1 {
        tracing::warn!(path = %source.display(), "input is not valid UTF-8, decoded as Latin-1");
    }

    let dataset = parse_text(&text, source)?;
    tracing::info!(
        path = %source.display(),
        records = dataset.len(),
        ?encoding,
        "dataset loaded"
    );
    Ok(dataset)
}

pub fn decode(bytes: Vec<u8>) -> (String, Encoding) {
    match String::from_utf8(bytes) {
        Ok(text) => (text, Encoding::Utf8),
        // Every Latin-1 byte maps to the code point of the same value.
        Err(err) => (
            err.into_bytes().into_iter().map(char::from).collect(),
            Encoding::Latin1,
        ),
    }
}

fn parse_text(text: &str, source: &Path) -> Result<Dataset, LoadError> {
    let csv_error = |err: csv::Error| LoadError::Csv {
        path: source.to_path_buf(),
        source: err,
    };

    // Short rows are accepted: trailing optional cells read as absent, while a
    // missing mandatory cell still fails deserialization.
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers().map_err(csv_error)?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|header| header == column) {
            return Err(LoadError::MissingColumn {
                path: source.to_path_buf(),
                column,
            });
        }
    }

    let mut records = Vec::new();
    for result in reader.records() {
        let raw = result.map_err(csv_error)?;
        let line = raw.position().map(|pos| pos.line()).unwrap_or_default();
        let row: CsvRow = raw.deserialize(Some(&headers)).map_err(csv_error)?;

        let audit_date = parse_date(&row.data_auditoria).ok_or_else(|| LoadError::InvalidDate {
            path: source.to_path_buf(),
            line,
            value: row.data_auditoria.clone(),
        })?;

        let result_value = match row.resultado_valor.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(value) => parse_value(value).ok_or_else(|| LoadError::InvalidValue {
                path: source.to_path_buf(),
                line,
                value: value.to_string(),
            })?,
        };

        records.push(AuditRecord {
            id: row.id_auditoria,
            audit_date,
            project_name: non_blank(row.nome_projeto),
            audit_type: row.tipo_auditoria,
            audited_item: row.item_auditado,
            result_text: row.resultado_texto,
            result_value,
            notes: non_blank(row.observacoes),
        });
    }

    Ok(Dataset::new(records))
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
                .map(|datetime| datetime.date())
        })
}

/// `None` on garbage, `Some(None)` for a spelled-out missing value.
fn parse_value(value: &str) -> Option<Option<f64>> {
    let parsed: f64 = value.replace(',', ".").parse().ok()?;
    Some((!parsed.is_nan()).then_some(parsed))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}
