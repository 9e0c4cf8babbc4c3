use chrono::NaiveDate;
use serde::Serialize;

use crate::filter::FilterError;

pub const NPS_AUDIT_TYPE: &str = "NPS";
pub const CONFORMING: &str = "Conforme";
pub const NON_CONFORMING: &str = "Não Conforme";

/// One logged quality check.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditRecord {
    pub id: String,
    pub audit_date: NaiveDate,
    pub project_name: Option<String>,
    pub audit_type: String,
    pub audited_item: String,
    pub result_text: String,
    pub result_value: Option<f64>,
    pub notes: Option<String>,
}

impl AuditRecord {
    pub fn is_nps(&self) -> bool {
        self.audit_type == NPS_AUDIT_TYPE
    }
}

/// The loaded snapshot, in source file order. Never mutated after load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    records: Vec<AuditRecord>,
}

impl Dataset {
    pub fn new(records: Vec<AuditRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[AuditRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Records of a [`Dataset`] that survived a [`FilterSelection`], in dataset order.
#[derive(Debug, Clone, Default)]
pub struct FilteredView<'a> {
    records: Vec<&'a AuditRecord>,
}

impl<'a> FilteredView<'a> {
    pub fn new(records: Vec<&'a AuditRecord>) -> Self {
        Self { records }
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a AuditRecord> + '_ {
        self.records.iter().copied()
    }

    pub fn nps_records(&self) -> impl Iterator<Item = &'a AuditRecord> + '_ {
        self.iter().filter(|record| record.is_nps())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Inclusive calendar interval. `start <= end` is checked on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, FilterError> {
        if start > end {
            return Err(FilterError::InvertedRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn single_day(day: NaiveDate) -> Self {
        Self { start: day, end: day }
    }

    pub fn unbounded() -> Self {
        Self {
            start: NaiveDate::MIN,
            end: NaiveDate::MAX,
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Either the "all" sentinel or one exact categorical value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Choice {
    #[default]
    All,
    Only(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterSelection {
    pub date_range: DateRange,
    pub audit_type: Choice,
    pub project: Choice,
}

impl FilterSelection {
    pub fn everything(date_range: DateRange) -> Self {
        Self {
            date_range,
            audit_type: Choice::All,
            project: Choice::All,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct IndicatorSet {
    pub total_count: usize,
    pub conformity_rate: f64,
    pub average_nps_score: f64,
    pub audited_project_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum NpsClass {
    Promoter,
    Neutral,
    Detractor,
}

impl NpsClass {
    pub fn label(self) -> &'static str {
        match self {
            NpsClass::Promoter => "Promoter",
            NpsClass::Neutral => "Neutral",
            NpsClass::Detractor => "Detractor",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NpsPoint {
    pub project_name: Option<String>,
    pub score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassCount {
    pub class: NpsClass,
    pub count: usize,
}

/// A detail-table row, every cell already rendered as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayRow {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Data")]
    pub date: String,
    #[serde(rename = "Projeto")]
    pub project: String,
    #[serde(rename = "Tipo")]
    pub audit_type: String,
    #[serde(rename = "Item")]
    pub item: String,
    #[serde(rename = "Resultado")]
    pub result: String,
    #[serde(rename = "Valor")]
    pub value: String,
    #[serde(rename = "Observações")]
    pub notes: String,
}
