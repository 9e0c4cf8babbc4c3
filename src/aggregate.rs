use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::models::{
    CategoryCount, ClassCount, DailyCount, FilteredView, NpsClass, NpsPoint, CONFORMING,
    NON_CONFORMING,
};

pub const NOT_APPLICABLE: &str = "N/A";
pub const DEFAULT_BAR_COLOR: &str = "#3498db";
pub const NPS_SCALE: (f64, f64) = (0.0, 10.0);

/// Everything an external chart renderer needs for one filtered view.
#[derive(Debug, Clone, Serialize)]
pub struct ChartPayload {
    pub by_type: Vec<CategoryCount>,
    pub by_conformity: Vec<ColoredCount>,
    pub daily_timeline: Vec<DailyCount>,
    /// Only present when the view holds NPS audits.
    pub nps: Option<NpsCharts>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColoredCount {
    pub label: String,
    pub count: usize,
    pub color: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct NpsCharts {
    pub by_project: Vec<NpsPoint>,
    pub scale: (f64, f64),
    pub classification: Vec<ColoredClass>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColoredClass {
    pub label: &'static str,
    pub count: usize,
    pub color: &'static str,
}

pub fn by_type(view: &FilteredView<'_>) -> Vec<CategoryCount> {
    count_labels(view.iter().map(|record| record.audit_type.as_str()))
}

pub fn by_conformity(view: &FilteredView<'_>) -> Vec<CategoryCount> {
    count_labels(view.iter().map(|record| record.result_text.as_str()))
}

/// One entry per date that has audits, oldest first.
pub fn daily_timeline(view: &FilteredView<'_>) -> Vec<DailyCount> {
    let mut days = BTreeMap::new();
    for record in view.iter() {
        *days.entry(record.audit_date).or_insert(0usize) += 1;
    }

    days.into_iter()
        .map(|(date, count)| DailyCount { date, count })
        .collect()
}

pub fn nps_by_project(view: &FilteredView<'_>) -> Vec<NpsPoint> {
    view.nps_records()
        .map(|record| NpsPoint {
            project_name: record.project_name.clone(),
            score: record.result_value,
        })
        .collect()
}

pub fn nps_classification(view: &FilteredView<'_>) -> Vec<ClassCount> {
    let mut counts: BTreeMap<NpsClass, usize> = BTreeMap::new();
    for record in view.nps_records() {
        *counts.entry(classify_nps(record.result_value)).or_insert(0) += 1;
    }

    let mut classes: Vec<ClassCount> = counts
        .into_iter()
        .map(|(class, count)| ClassCount { class, count })
        .collect();
    classes.sort_by(|a, b| b.count.cmp(&a.count).then(a.class.cmp(&b.class)));
    classes
}

/// A missing score fails both thresholds and lands in `Detractor`.
pub fn classify_nps(score: Option<f64>) -> NpsClass {
    match score {
        Some(value) if value >= 9.0 => NpsClass::Promoter,
        Some(value) if value >= 7.0 => NpsClass::Neutral,
        _ => NpsClass::Detractor,
    }
}

pub fn conformity_color(label: &str) -> &'static str {
    match label {
        CONFORMING => "#2ecc71",
        NON_CONFORMING => "#e74c3c",
        NOT_APPLICABLE => "#95a5a6",
        _ => DEFAULT_BAR_COLOR,
    }
}

pub fn class_color(class: NpsClass) -> &'static str {
    match class {
        NpsClass::Promoter => "#2ecc71",
        NpsClass::Neutral => "#f39c12",
        NpsClass::Detractor => "#e74c3c",
    }
}

pub fn build_charts(view: &FilteredView<'_>) -> ChartPayload {
    let by_conformity = by_conformity(view)
        .into_iter()
        .map(|entry| ColoredCount {
            color: conformity_color(&entry.label),
            label: entry.label,
            count: entry.count,
        })
        .collect();

    let nps = view.nps_records().next().is_some().then(|| NpsCharts {
        by_project: nps_by_project(view),
        scale: NPS_SCALE,
        classification: nps_classification(view)
            .into_iter()
            .map(|entry| ColoredClass {
                label: entry.class.label(),
                count: entry.count,
                color: class_color(entry.class),
            })
            .collect(),
    });

    ChartPayload {
        by_type: by_type(view),
        by_conformity,
        daily_timeline: daily_timeline(view),
        nps,
    }
}

fn count_labels<'a>(labels: impl Iterator<Item = &'a str>) -> Vec<CategoryCount> {
    let mut map: HashMap<&str, usize> = HashMap::new();
    for label in labels {
        *map.entry(label).or_insert(0) += 1;
    }

    let mut counts: Vec<CategoryCount> = map
        .into_iter()
        .map(|(label, count)| CategoryCount {
            label: label.to_string(),
            count,
        })
        .collect();

    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AuditRecord, Dataset};
    use chrono::NaiveDate;

    fn sample(
        d: u32,
        project: &str,
        audit_type: &str,
        result: &str,
        value: Option<f64>,
    ) -> AuditRecord {
        AuditRecord {
            id: format!("{project}-{d}"),
            audit_date: NaiveDate::from_ymd_opt(2024, 3, d).unwrap(),
            project_name: Some(project.to_string()),
            audit_type: audit_type.to_string(),
            audited_item: "Item".to_string(),
            result_text: result.to_string(),
            result_value: value,
            notes: None,
        }
    }

    fn sample_dataset() -> Dataset {
        Dataset::new(vec![
            sample(2, "Alpha", "Checklist", CONFORMING, None),
            sample(1, "Alpha", "Checklist", NON_CONFORMING, None),
            sample(2, "Beta", "NPS", NOT_APPLICABLE, Some(9.0)),
            sample(5, "Beta", "NPS", NOT_APPLICABLE, Some(7.0)),
            sample(5, "Gamma", "NPS", NOT_APPLICABLE, Some(5.0)),
            sample(6, "Gamma", "Segurança", "Parcial", None),
        ])
    }

    fn whole(dataset: &Dataset) -> FilteredView<'_> {
        FilteredView::new(dataset.records().iter().collect())
    }

    #[test]
    fn category_counts_cover_every_record() {
        let dataset = sample_dataset();
        let view = whole(&dataset);

        let types = by_type(&view);
        assert_eq!(
            types[0],
            CategoryCount {
                label: "NPS".to_string(),
                count: 3
            }
        );
        assert_eq!(types.iter().map(|c| c.count).sum::<usize>(), view.len());

        let conformity = by_conformity(&view);
        assert_eq!(conformity.iter().map(|c| c.count).sum::<usize>(), view.len());
        assert_eq!(conformity.len(), 4);
    }

    #[test]
    fn timeline_is_sparse_and_sorted() {
        let dataset = sample_dataset();
        let timeline = daily_timeline(&whole(&dataset));
        let points: Vec<(u32, usize)> = timeline
            .iter()
            .map(|entry| (chrono::Datelike::day(&entry.date), entry.count))
            .collect();
        assert_eq!(points, [(1, 1), (2, 2), (5, 2), (6, 1)]);
    }

    #[test]
    fn nps_thresholds() {
        assert_eq!(classify_nps(Some(9.0)), NpsClass::Promoter);
        assert_eq!(classify_nps(Some(10.0)), NpsClass::Promoter);
        assert_eq!(classify_nps(Some(8.9)), NpsClass::Neutral);
        assert_eq!(classify_nps(Some(7.0)), NpsClass::Neutral);
        assert_eq!(classify_nps(Some(6.9)), NpsClass::Detractor);
        assert_eq!(classify_nps(Some(5.0)), NpsClass::Detractor);
        assert_eq!(classify_nps(None), NpsClass::Detractor);
    }

    #[test]
    fn nps_series_follow_view_order() {
        let dataset = sample_dataset();
        let view = whole(&dataset);

        let points = nps_by_project(&view);
        let projects: Vec<&str> = points
            .iter()
            .filter_map(|point| point.project_name.as_deref())
            .collect();
        assert_eq!(projects, ["Beta", "Beta", "Gamma"]);

        let classes = nps_classification(&view);
        assert_eq!(classes.iter().map(|c| c.count).sum::<usize>(), 3);
        assert_eq!(classes[0].class, NpsClass::Promoter);
    }

    #[test]
    fn empty_view_gives_empty_aggregates() {
        let dataset = Dataset::default();
        let view = whole(&dataset);
        assert!(by_type(&view).is_empty());
        assert!(by_conformity(&view).is_empty());
        assert!(daily_timeline(&view).is_empty());
        assert!(nps_by_project(&view).is_empty());
        assert!(nps_classification(&view).is_empty());
        assert!(build_charts(&view).nps.is_none());
    }

    #[test]
    fn chart_payload_carries_palette() {
        let dataset = sample_dataset();
        let charts = build_charts(&whole(&dataset));

        let colors: HashMap<&str, &str> = charts
            .by_conformity
            .iter()
            .map(|entry| (entry.label.as_str(), entry.color))
            .collect();
        assert_eq!(colors[CONFORMING], "#2ecc71");
        assert_eq!(colors[NON_CONFORMING], "#e74c3c");
        assert_eq!(colors[NOT_APPLICABLE], "#95a5a6");
        assert_eq!(colors["Parcial"], DEFAULT_BAR_COLOR);

        let nps = charts.nps.expect("nps charts");
        assert_eq!(nps.by_project.len(), 3);
        assert!(nps
            .classification
            .iter()
            .any(|entry| entry.label == "Neutral" && entry.color == "#f39c12"));
    }
}
