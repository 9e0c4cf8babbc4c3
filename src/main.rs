use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod aggregate;
mod export;
mod filter;
mod indicators;
mod loader;
mod models;
mod report;

use models::{Choice, Dataset, DateRange, FilterSelection};

#[derive(Parser)]
#[command(name = "quality-dashboard")]
#[command(about = "Filterable quality audit dashboard", long_about = None)]
struct Cli {
    /// Dataset path; repeat to give fallbacks, tried in order
    #[arg(
        long = "data",
        env = "QUALITY_DATASET",
        default_value = loader::DEFAULT_DATASET,
        global = true
    )]
    data: Vec<PathBuf>,

    #[command(flatten)]
    filters: FilterArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct FilterArgs {
    /// Only audits from this single day
    #[arg(
        long,
        value_parser = parse_cli_date,
        conflicts_with_all = ["from", "to"],
        global = true
    )]
    day: Option<NaiveDate>,
    /// First audit day to include (defaults to the earliest in the dataset)
    #[arg(long, value_parser = parse_cli_date, global = true)]
    from: Option<NaiveDate>,
    /// Last audit day to include (defaults to the latest in the dataset)
    #[arg(long, value_parser = parse_cli_date, global = true)]
    to: Option<NaiveDate>,
    #[arg(long, default_value = "all", global = true)]
    audit_type: String,
    #[arg(long, default_value = "all", global = true)]
    project: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the key indicators
    Summary,
    /// List selectable audit types, projects and the date span
    Options,
    /// Print the detail table as tab-separated text
    Table,
    /// Print chart data as JSON
    Charts,
    /// Generate a markdown report
    Report {
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Export the filtered audits as CSV
    Export {
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quality_dashboard=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut cache = loader::DatasetCache::new();
    let dataset = cache
        .get_or_load(&cli.data)
        .context("could not load the audit dataset")?;
    if dataset.is_empty() {
        tracing::warn!("dataset holds no audits; every view will be empty");
    }

    let selection = resolve_selection(&dataset, &cli.filters)?;
    let view = filter::apply_filters(&dataset, &selection);

    match cli.command {
        Commands::Summary => {
            let kpis = indicators::compute_indicators(&view);
            println!("Total audits:      {}", kpis.total_count);
            println!("Conformity rate:   {:.1}%", kpis.conformity_rate);
            println!("Average NPS:       {:.1}", kpis.average_nps_score);
            println!("Audited projects:  {}", kpis.audited_project_count);
        }
        Commands::Options => {
            match filter::date_bounds(&dataset) {
                Some(range) => println!("Period: {} to {}", range.start(), range.end()),
                None => println!("Period: no audits loaded"),
            }
            println!("Audit types:");
            println!("- all");
            for audit_type in filter::audit_type_options(&dataset) {
                println!("- {audit_type}");
            }
            println!("Projects:");
            println!("- all");
            for project in filter::project_options(&dataset) {
                println!("- {project}");
            }
        }
        Commands::Table => {
            let rows = export::to_display_rows(&view);
            export::write_display_rows(&rows, std::io::stdout().lock())?;
        }
        Commands::Charts => {
            let charts = aggregate::build_charts(&view);
            let mut stdout = std::io::stdout().lock();
            serde_json::to_writer_pretty(&mut stdout, &charts)?;
            writeln!(stdout)?;
        }
        Commands::Report { out } => {
            let kpis = indicators::compute_indicators(&view);
            let report = report::build_report(&selection, &kpis, &view);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Export { out_dir } => {
            let payload = export::to_export_payload(&view)?;
            let path = out_dir.join(export::export_file_name(
                chrono::Local::now().naive_local(),
            ));
            std::fs::write(&path, payload)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Exported {} audits to {}.", view.len(), path.display());
        }
    }

    Ok(())
}

fn resolve_selection(dataset: &Dataset, args: &FilterArgs) -> anyhow::Result<FilterSelection> {
    let date_range = match args.day {
        Some(day) => DateRange::single_day(day),
        None => {
            let bounds = filter::date_bounds(dataset).unwrap_or_else(DateRange::unbounded);
            let start = args.from.unwrap_or(bounds.start());
            let end = args.to.unwrap_or(bounds.end());
            DateRange::new(start, end).context("invalid --from/--to")?
        }
    };

    let mut selection = FilterSelection::everything(date_range);
    selection.audit_type = Choice::parse(&args.audit_type);
    selection.project = Choice::parse(&args.project);
    Ok(selection)
}

fn parse_cli_date(value: &str) -> Result<NaiveDate, String> {
    loader::parse_date(value).ok_or_else(|| format!("`{value}` is not a date (use YYYY-MM-DD)"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AuditRecord;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, d).unwrap()
    }

    fn dataset() -> Dataset {
        Dataset::new(
            [3, 9]
                .into_iter()
                .map(|d| AuditRecord {
                    id: d.to_string(),
                    audit_date: day(d),
                    project_name: Some("Alpha".to_string()),
                    audit_type: "Checklist".to_string(),
                    audited_item: "Item".to_string(),
                    result_text: "Conforme".to_string(),
                    result_value: None,
                    notes: None,
                })
                .collect(),
        )
    }

    fn args(extra: &[&str]) -> FilterArgs {
        let argv = ["quality-dashboard"]
            .iter()
            .chain(extra)
            .chain(&["summary"])
            .copied();
        Cli::try_parse_from(argv).unwrap().filters
    }

    #[test]
    fn defaults_span_the_dataset() {
        let selection = resolve_selection(&dataset(), &args(&[])).unwrap();
        assert_eq!(selection.date_range, DateRange::new(day(3), day(9)).unwrap());
        assert_eq!(selection.audit_type, Choice::All);
        assert_eq!(selection.project, Choice::All);
    }

    #[test]
    fn single_day_and_named_filters() {
        let selection =
            resolve_selection(&dataset(), &args(&["--day", "2024-04-05", "--project", "Alpha"]))
                .unwrap();
        assert_eq!(selection.date_range, DateRange::single_day(day(5)));
        assert_eq!(selection.project, Choice::Only("Alpha".to_string()));
    }

    #[test]
    fn day_conflicts_with_range() {
        let argv = ["quality-dashboard", "--day", "2024-04-05", "--from", "2024-04-01", "summary"];
        assert!(Cli::try_parse_from(argv).is_err());
    }

    #[test]
    fn inverted_range_is_an_error() {
        let err = resolve_selection(&dataset(), &args(&["--from", "2024-04-09", "--to", "2024-04-03"]));
        assert!(err.is_err());
    }
}
