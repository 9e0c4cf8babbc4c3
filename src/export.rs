use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::loader::UTF8_BOM;
use crate::models::{AuditRecord, DisplayRow, FilteredView};

pub const PLACEHOLDER: &str = "-";
pub const DISPLAY_DATE_FORMAT: &str = "%d/%m/%Y";

/// Export row shape: the loader's column names, values left unformatted.
#[derive(Serialize)]
struct ExportRow<'a> {
    id_auditoria: &'a str,
    data_auditoria: NaiveDate,
    nome_projeto: Option<&'a str>,
    tipo_auditoria: &'a str,
    item_auditado: &'a str,
    resultado_texto: &'a str,
    resultado_valor: Option<f64>,
    observacoes: Option<&'a str>,
}

impl<'a> From<&'a AuditRecord> for ExportRow<'a> {
    fn from(record: &'a AuditRecord) -> Self {
        Self {
            id_auditoria: &record.id,
            data_auditoria: record.audit_date,
            nome_projeto: record.project_name.as_deref(),
            tipo_auditoria: &record.audit_type,
            item_auditado: &record.audited_item,
            resultado_texto: &record.result_text,
            resultado_valor: record.result_value,
            observacoes: record.notes.as_deref(),
        }
    }
}

pub fn to_display_rows(view: &FilteredView<'_>) -> Vec<DisplayRow> {
    view.iter()
        .map(|record| DisplayRow {
            id: record.id.clone(),
            date: record.audit_date.format(DISPLAY_DATE_FORMAT).to_string(),
            project: or_placeholder(record.project_name.as_deref()),
            audit_type: record.audit_type.clone(),
            item: record.audited_item.clone(),
            result: record.result_text.clone(),
            value: record
                .result_value
                .map(|value| value.to_string())
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
            notes: or_placeholder(record.notes.as_deref()),
        })
        .collect()
}

/// CSV with a header row and a UTF-8 byte order mark so spreadsheet tools
/// keep accented text intact.
pub fn to_export_payload(view: &FilteredView<'_>) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::Writer::from_writer(UTF8_BOM.to_vec());
    for record in view.iter() {
        writer.serialize(ExportRow::from(record))?;
    }
    // A header is still owed when no row was serialized.
    if view.is_empty() {
        writer.write_record(crate::loader::REQUIRED_COLUMNS)?;
    }
    writer.into_inner().map_err(|err| err.into_error().into())
}

pub fn export_file_name(at: NaiveDateTime) -> String {
    format!("audits_{}.csv", at.format("%Y%m%d_%H%M%S"))
}

pub fn write_display_rows<W: std::io::Write>(
    rows: &[DisplayRow],
    out: W,
) -> Result<(), csv::Error> {
    let mut writer = csv::WriterBuilder::new().delimiter(b'\t').from_writer(out);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn or_placeholder(value: Option<&str>) -> String {
    value.unwrap_or(PLACEHOLDER).to_string()
}
