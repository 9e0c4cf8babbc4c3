use std::fmt::Write;

use crate::aggregate;
use crate::export;
use crate::models::{FilterSelection, FilteredView, IndicatorSet};

pub fn build_report(
    selection: &FilterSelection,
    indicators: &IndicatorSet,
    view: &FilteredView<'_>,
) -> String {
    let charts = aggregate::build_charts(view);
    let mut output = String::new();

    let _ = writeln!(output, "# Quality Dashboard");
    let _ = writeln!(
        output,
        "Audits from {} to {} (type: {}, project: {})",
        selection.date_range.start(),
        selection.date_range.end(),
        selection.audit_type.label(),
        selection.project.label()
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Key Indicators");
    let _ = writeln!(output, "- Total audits: {}", indicators.total_count);
    let _ = writeln!(output, "- Conformity rate: {:.1}%", indicators.conformity_rate);
    let _ = writeln!(output, "- Average NPS: {:.1}", indicators.average_nps_score);
    let _ = writeln!(output, "- Audited projects: {}", indicators.audited_project_count);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Audits by Type");
    if charts.by_type.is_empty() {
        let _ = writeln!(output, "No audits match these filters.");
    } else {
        for entry in &charts.by_type {
            let _ = writeln!(output, "- {}: {}", entry.label, entry.count);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Conformity Status");
    if charts.by_conformity.is_empty() {
        let _ = writeln!(output, "No audits match these filters.");
    } else {
        for entry in &charts.by_conformity {
            let _ = writeln!(output, "- {}: {}", entry.label, entry.count);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Audits per Day");
    if charts.daily_timeline.is_empty() {
        let _ = writeln!(output, "No audits match these filters.");
    } else {
        for entry in &charts.daily_timeline {
            let _ = writeln!(
                output,
                "- {}: {}",
                entry.date.format(export::DISPLAY_DATE_FORMAT),
                entry.count
            );
        }
    }

    if let Some(nps) = &charts.nps {
        let _ = writeln!(output);
        let _ = writeln!(output, "## NPS Analysis");
        for point in &nps.by_project {
            let _ = writeln!(
                output,
                "- {}: {}",
                point.project_name.as_deref().unwrap_or(export::PLACEHOLDER),
                point
                    .score
                    .map(|score| format!("{score:.1}"))
                    .unwrap_or_else(|| export::PLACEHOLDER.to_string())
            );
        }
        let _ = writeln!(output);
        for entry in &nps.classification {
            let _ = writeln!(output, "- {}: {}", entry.label, entry.count);
        }
    }

    let rows = export::to_display_rows(view);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Audit Details");
    if rows.is_empty() {
        let _ = writeln!(output, "No audits match these filters.");
    } else {
        let _ = writeln!(
            output,
            "| ID | Data | Projeto | Tipo | Item | Resultado | Valor | Observações |"
        );
        let _ = writeln!(output, "|---|---|---|---|---|---|---|---|");
        for row in &rows {
            let _ = writeln!(
                output,
                "| {} | {} | {} | {} | {} | {} | {} | {} |",
                cell(&row.id),
                cell(&row.date),
                cell(&row.project),
                cell(&row.audit_type),
                cell(&row.item),
                cell(&row.result),
                cell(&row.value),
                cell(&row.notes)
            );
        }
    }

    output
}

fn cell(value: &str) -> String {
    value.replace('|', "\\|").replace('\n', " ")
}
