//! Terminal output for interactive runs.

use super::ReportMeta;
use crate::model::{CheckOutcome, Status};
use crate::summary::{StatusCounts, Summary};
use colored::Colorize;
use comfy_table::{Cell, Color, ContentArrangement, Table};
use indexmap::IndexMap;
use std::path::PathBuf;

const RULE_WIDTH: usize = 70;

fn status_color(status: Status) -> Color {
    match status {
        Status::Ok => Color::Green,
        Status::Warning => Color::Yellow,
        Status::Critical => Color::Red,
        Status::Unknown => Color::DarkGrey,
    }
}

fn status_colored(status: Status) -> String {
    let label = super::status_label(status);
    match status {
        Status::Ok => label.green().to_string(),
        Status::Warning => label.yellow().to_string(),
        Status::Critical => label.red().bold().to_string(),
        Status::Unknown => label.dimmed().to_string(),
    }
}

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

pub fn print_banner(meta: &ReportMeta, scope: &str, runner: &str, demo: bool) {
    println!("{}", rule());
    println!("{}", meta.title.bold());
    if demo {
        println!("   {}", "demo mode: canned sample data".yellow());
    }
    println!("   Company: {}", meta.company_name);
    println!("   Team: {}", meta.team_name);
    println!("   Environments: {scope}");
    println!("   Runner: {runner}");
    println!("{}", rule());
}

pub fn summary_table(summary: &Summary) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header("Total"));

    let counts = summary.counts();
    let mut row = vec![Cell::new(summary.total)];
    row.extend(count_cells(&counts));
    table.add_row(row);
    table
}

pub fn group_table(label: &str, groups: &IndexMap<String, StatusCounts>) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header(label));

    for (name, counts) in groups {
        let mut row = vec![Cell::new(name)];
        row.extend(count_cells(counts));
        table.add_row(row);
    }
    table
}

fn header(first: &str) -> Vec<Cell> {
    let mut cells = vec![Cell::new(first).fg(Color::Cyan)];
    cells.extend(
        Status::ALL
            .iter()
            .map(|s| Cell::new(super::status_label(*s)).fg(Color::Cyan)),
    );
    cells
}

fn count_cells(counts: &StatusCounts) -> Vec<Cell> {
    Status::ALL
        .iter()
        .map(|s| {
            let n = counts.get(*s);
            let cell = Cell::new(n);
            if n > 0 {
                cell.fg(status_color(*s))
            } else {
                cell
            }
        })
        .collect()
}

/// One block per WARNING or CRITICAL outcome, in run order.
pub fn issue_lines(outcomes: &[CheckOutcome]) -> Vec<String> {
    outcomes
        .iter()
        .filter(|o| o.status.needs_action())
        .flat_map(|o| {
            [
                format!("[{}] [{}] {}", status_colored(o.status), o.id, o.name),
                format!("   Environment: {}", o.environment),
                format!("   Target: {}", o.target),
                format!("   Message: {}", o.message),
            ]
        })
        .collect()
}

pub fn print_summary(summary: &Summary) {
    println!();
    println!("{}", rule());
    println!("{}", "Inspection summary".bold());
    println!("{}", rule());
    println!("{}", summary_table(summary));
    println!();
    println!("{}", "By environment".bold());
    println!("{}", group_table("Environment", &summary.by_environment));
    println!();
    println!("{}", "By category".bold());
    println!("{}", group_table("Category", &summary.by_category));
}

pub fn print_reports(written: &[(&'static str, PathBuf)]) {
    println!();
    println!("{}", "Reports written:".green());
    for (format, path) in written {
        println!("   - {}: {}", format.to_uppercase(), path.display());
    }
}

pub fn print_issues(outcomes: &[CheckOutcome]) {
    let lines = issue_lines(outcomes);
    if lines.is_empty() {
        return;
    }
    println!();
    println!("{}", rule());
    println!("{}", "Action required".red().bold());
    println!("{}", rule());
    for line in lines {
        println!("{line}");
    }
}

pub fn print_footer() {
    println!("{}", rule());
    println!("{}", "Inspection complete".green());
    println!("{}", rule());
}
