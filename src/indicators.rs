use std::collections::HashSet;

use crate::models::{FilteredView, IndicatorSet, CONFORMING};

pub fn compute_indicators(view: &FilteredView<'_>) -> IndicatorSet {
    let total_count = view.len();
    let conforming = view
        .iter()
        .filter(|record| record.result_text == CONFORMING)
        .count();

    let projects: HashSet<&str> = view
        .iter()
        .filter_map(|record| record.project_name.as_deref())
        .collect();

    IndicatorSet {
        total_count,
        conformity_rate: percentage(conforming, total_count),
        average_nps_score: average_nps(view),
        audited_project_count: projects.len(),
    }
}

pub fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

/// Mean score over NPS rows that carry a value, whatever type filter was chosen.
pub fn average_nps(view: &FilteredView<'_>) -> f64 {
    let (sum, count) = view
        .nps_records()
        .filter_map(|record| record.result_value)
        .fold((0.0, 0usize), |(sum, count), score| (sum + score, count + 1));

    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AuditRecord, Dataset, NON_CONFORMING};
    use chrono::NaiveDate;

    fn sample(
        d: u32,
        project: Option<&str>,
        audit_type: &str,
        result: &str,
        value: Option<f64>,
    ) -> AuditRecord {
        AuditRecord {
            id: format!("a-{d}"),
            audit_date: NaiveDate::from_ymd_opt(2024, 1, d).unwrap(),
            project_name: project.map(str::to_string),
            audit_type: audit_type.to_string(),
            audited_item: "Item".to_string(),
            result_text: result.to_string(),
            result_value: value,
            notes: None,
        }
    }

    fn whole(dataset: &Dataset) -> FilteredView<'_> {
        FilteredView::new(dataset.records().iter().collect())
    }

    #[test]
    fn empty_view_is_all_zero() {
        let dataset = Dataset::default();
        assert_eq!(compute_indicators(&whole(&dataset)), IndicatorSet::default());
    }

    #[test]
    fn conformity_rate_over_three_audits() {
        let dataset = Dataset::new(vec![
            sample(1, Some("Alpha"), "Checklist", CONFORMING, None),
            sample(2, Some("Alpha"), "Checklist", CONFORMING, None),
            sample(3, Some("Alpha"), "Checklist", NON_CONFORMING, None),
        ]);
        let indicators = compute_indicators(&whole(&dataset));

        assert_eq!(indicators.total_count, 3);
        assert_eq!(format!("{:.1}", indicators.conformity_rate), "66.7");
        assert_eq!(indicators.audited_project_count, 1);
        assert_eq!(indicators.average_nps_score, 0.0);
    }

    #[test]
    fn nps_average_ignores_other_types_and_missing_scores() {
        let dataset = Dataset::new(vec![
            sample(1, Some("Alpha"), "NPS", "N/A", Some(9.0)),
            sample(2, None, "NPS", "N/A", Some(6.0)),
            sample(3, Some("Beta"), "NPS", "N/A", None),
            sample(4, Some("Beta"), "Checklist", CONFORMING, Some(2.0)),
        ]);
        let indicators = compute_indicators(&whole(&dataset));

        assert!((indicators.average_nps_score - 7.5).abs() < 1e-9);
        assert_eq!(indicators.audited_project_count, 2);
        assert!((indicators.conformity_rate - 25.0).abs() < 1e-9);
    }

    #[test]
    fn rate_stays_within_bounds() {
        let dataset = Dataset::new(vec![
            sample(1, None, "Checklist", CONFORMING, None),
            sample(2, None, "Checklist", CONFORMING, None),
        ]);
        let rate = compute_indicators(&whole(&dataset)).conformity_rate;
        assert!((0.0..=100.0).contains(&rate));
        assert_eq!(rate, 100.0);
        assert_eq!(percentage(0, 0), 0.0);
    }
}
