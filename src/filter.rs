use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::models::{AuditRecord, Choice, Dataset, DateRange, FilterSelection, FilteredView};

const ALL_SENTINELS: [&str; 2] = ["all", "todos"];

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("date range starts on {start} but ends on {end}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },
}

impl Choice {
    /// `all` and `Todos` (any case) select everything; anything else is an exact match.
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        if ALL_SENTINELS
            .iter()
            .any(|sentinel| trimmed.eq_ignore_ascii_case(sentinel))
        {
            Choice::All
        } else {
            Choice::Only(trimmed.to_string())
        }
    }

    pub fn matches(&self, value: Option<&str>) -> bool {
        match self {
            Choice::All => true,
            Choice::Only(wanted) => value == Some(wanted.as_str()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Choice::All => "all",
            Choice::Only(value) => value.as_str(),
        }
    }
}

impl FilterSelection {
    pub fn matches(&self, record: &AuditRecord) -> bool {
        self.date_range.contains(record.audit_date)
            && self.audit_type.matches(Some(record.audit_type.as_str()))
            && self.project.matches(record.project_name.as_deref())
    }
}

pub fn apply_filters<'a>(dataset: &'a Dataset, selection: &FilterSelection) -> FilteredView<'a> {
    let view = FilteredView::new(
        dataset
            .records()
            .iter()
            .filter(|record| selection.matches(record))
            .collect(),
    );
    tracing::debug!(
        kept = view.len(),
        total = dataset.len(),
        audit_type = selection.audit_type.label(),
        project = selection.project.label(),
        "filters applied"
    );
    view
}

/// Earliest through latest audit date, or `None` for an empty dataset.
pub fn date_bounds(dataset: &Dataset) -> Option<DateRange> {
    let dates = dataset.records().iter().map(|record| record.audit_date);
    let min = dates.clone().min()?;
    let max = dates.max()?;
    DateRange::new(min, max).ok()
}

pub fn audit_type_options(dataset: &Dataset) -> Vec<String> {
    let types: BTreeSet<&str> = dataset
        .records()
        .iter()
        .map(|record| record.audit_type.as_str())
        .collect();
    types.into_iter().map(str::to_string).collect()
}

pub fn project_options(dataset: &Dataset) -> Vec<String> {
    let projects: BTreeSet<&str> = dataset
        .records()
        .iter()
        .filter_map(|record| record.project_name.as_deref())
        .collect();
    projects.into_iter().map(str::to_string).collect()
}
