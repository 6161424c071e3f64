//! Output formatting utilities

use crate::engine::ChartData;
use crate::types::{ChartPayload, DateRange, PeriodPlan};
use crate::utils::time::utc_date;
use colored::Colorize;
use tabled::{
    settings::{object::Columns, Alignment, Modify, Style},
    Table, Tabled,
};

/// Format a number with K/M suffix for readability
pub fn format_number(num: u64) -> String {
    if num == 0 {
        return "-".to_string();
    }

    if num >= 1_000_000 {
        format!("{:.1}M", num as f64 / 1_000_000.0)
    } else if num >= 1_000 {
        format!("{:.1}K", num as f64 / 1_000.0)
    } else {
        num.to_string()
    }
}

/// Table row for display
#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Series")]
    pub series: String,
    #[tabled(rename = "Product")]
    pub product: String,
    #[tabled(rename = "Colour")]
    pub colour: String,
    #[tabled(rename = "Total Calls")]
    pub total: String,
    #[tabled(rename = "Busiest Period")]
    pub busiest: String,
}

/// Label of the bucket with the most calls, first one on ties
fn busiest_period(counts: &[u64], labels: &[String]) -> String {
    counts
        .iter()
        .enumerate()
        .filter(|(_, c)| **c > 0)
        .fold(None, |best: Option<(usize, u64)>, (i, &c)| match best {
            Some((_, top)) if top >= c => best,
            _ => Some((i, c)),
        })
        .and_then(|(i, c)| labels.get(i).map(|l| format!("{} ({})", l, format_number(c))))
        .unwrap_or_else(|| "-".to_string())
}

/// Format the chart as a table, one row per series
pub fn format_table(chart: &ChartData) -> String {
    let rows: Vec<TableRow> = chart
        .series
        .iter()
        .map(|s| TableRow {
            series: s.label.clone(),
            product: s.product_id.clone(),
            colour: s.colour.clone(),
            total: format_number(s.total()),
            busiest: busiest_period(&s.bucketed_counts, &chart.axis_labels),
        })
        .collect();

    Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::single(0)).with(Alignment::left()))
        .to_string()
}

/// Format the chart payload as JSON
pub fn format_json(payload: &ChartPayload) -> String {
    serde_json::to_string_pretty(payload).unwrap_or_else(|_| "{}".to_string())
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Format the chart as CSV: one column per period, one row per series
pub fn format_csv(chart: &ChartData) -> String {
    let mut output = String::from("Series,Product");
    for label in &chart.axis_labels {
        output.push(',');
        output.push_str(&csv_field(label));
    }
    output.push('\n');

    for series in &chart.series {
        output.push_str(&csv_field(&series.label));
        output.push(',');
        output.push_str(&csv_field(&series.product_id));
        for count in &series.bucketed_counts {
            output.push(',');
            output.push_str(&count.to_string());
        }
        output.push('\n');
    }

    output
}

/// Table of the periods a range is split into
#[derive(Tabled)]
pub struct PeriodRow {
    #[tabled(rename = "#")]
    pub index: usize,
    #[tabled(rename = "Label")]
    pub label: String,
}

pub fn format_periods(plan: &PeriodPlan, labels: &[String]) -> String {
    let rows: Vec<PeriodRow> = labels
        .iter()
        .enumerate()
        .map(|(index, label)| PeriodRow {
            index,
            label: label.clone(),
        })
        .collect();

    format!(
        "{} {} periods from {}\n{}",
        plan.granularity().to_string().bold(),
        plan.count(),
        utc_date(plan.anchor()),
        Table::new(rows).with(Style::rounded())
    )
}

/// Print banner
pub fn print_banner(range: &DateRange, period: &str, email: Option<&str>) {
    println!();
    println!("{}", "  apiusage - API Usage Analytics".cyan().bold());
    println!(
        "  {} {} {}",
        range.to_string().dimmed(),
        "·".dimmed(),
        period.dimmed()
    );
    if let Some(email) = email {
        println!("  {}", email.dimmed());
    }
    println!();
}

/// Print doctor results
pub fn print_doctor_results(checks: &[(String, String, bool)]) {
    println!("{}", "\nConfiguration Checks:\n".bold());

    for (name, detail, found) in checks {
        let icon = if *found { "✓".green() } else { "✗".red() };
        let detail_display = if *found {
            detail.green()
        } else {
            detail.dimmed()
        };
        println!("  {} {}", icon, name);
        println!("    {}\n", detail_display);
    }
}
