use super::{ellipsize, status_label, ReportMeta};
use crate::model::{ReportRow, Status};
use crate::summary::{StatusCounts, Summary};
use indexmap::IndexMap;
use std::fmt::Write;

const DETAIL_VALUE_CHARS: usize = 30;

pub fn render(meta: &ReportMeta, rows: &[ReportRow], summary: &Summary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {}\n", meta.title);
    let _ = writeln!(out, "Generated: {}  ", meta.generated_at);
    let _ = writeln!(
        out,
        "Company: {} | Team: {}\n",
        meta.company_name, meta.team_name
    );

    out.push_str("## 1. Summary\n\n");
    out.push_str("| Total | OK | Warning | Critical | Unknown |\n");
    out.push_str("|---|---|---|---|---|\n");
    let _ = writeln!(
        out,
        "| {} | {} | {} | {} | {} |\n",
        summary.total, summary.ok, summary.warning, summary.critical, summary.unknown
    );

    out.push_str("## 2. Results by environment\n\n");
    push_group_table(&mut out, "Environment", &summary.by_environment);

    out.push_str("## 3. Results by category\n\n");
    push_group_table(&mut out, "Category", &summary.by_category);

    out.push_str("## 4. Detailed results\n\n");
    for (idx, (env, env_rows)) in group_by(rows, |r| &r.environment).iter().enumerate() {
        let _ = writeln!(out, "### 4.{} {env}\n", idx + 1);
        for (category, cat_rows) in group_by(env_rows.iter().copied(), |r| &r.category) {
            let _ = writeln!(out, "#### {category}\n");
            out.push_str("| ID | Check | Status | Value | Message |\n");
            out.push_str("|---|---|---|---|---|\n");
            for row in cat_rows {
                let _ = writeln!(
                    out,
                    "| {} | {} | {} | {} | {} |",
                    cell(&row.id),
                    cell(&row.name),
                    row.status,
                    cell(&ellipsize(&row.value, DETAIL_VALUE_CHARS)),
                    cell(&row.message),
                );
            }
            out.push('\n');
        }
    }

    let issues: Vec<&ReportRow> = rows.iter().filter(|r| is_actionable(r)).collect();
    if !issues.is_empty() {
        out.push_str("## 5. Action required\n\n");
        for issue in issues {
            let _ = writeln!(out, "- **[{}] [{}] {}**", issue.status, issue.id, issue.name);
            let _ = writeln!(out, "  - Environment: {}", issue.environment);
            let _ = writeln!(out, "  - Target: {}", issue.target);
            let _ = writeln!(out, "  - Value: {}", cell(&issue.value));
            let _ = writeln!(out, "  - Message: {}", issue.message);
            let _ = writeln!(out, "  - Severity: {}", issue.severity);
        }
        out.push('\n');
    }

    out.push_str("---\n\n");
    out.push_str("Inspector: ________________  \n");
    out.push_str("Reviewer: ________________  \n");
    let _ = writeln!(out, "Inspection date: {}", meta.inspection_date);
    out
}

fn is_actionable(row: &ReportRow) -> bool {
    row.status == status_label(Status::Warning) || row.status == status_label(Status::Critical)
}

fn push_group_table(out: &mut String, label: &str, groups: &IndexMap<String, StatusCounts>) {
    if groups.is_empty() {
        out.push_str("No results.\n\n");
        return;
    }
    let _ = writeln!(out, "| {label} | OK | Warning | Critical | Unknown |");
    out.push_str("|---|---|---|---|---|\n");
    for (name, counts) in groups {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} | {} |",
            cell(name),
            counts.ok,
            counts.warning,
            counts.critical,
            counts.unknown
        );
    }
    out.push('\n');
}

/// Groups in first-seen order.
fn group_by<'a, I, F>(rows: I, key: F) -> IndexMap<&'a str, Vec<&'a ReportRow>>
where
    I: IntoIterator<Item = &'a ReportRow>,
    F: Fn(&'a ReportRow) -> &'a String,
{
    let mut groups: IndexMap<&str, Vec<&ReportRow>> = IndexMap::new();
    for row in rows {
        groups.entry(key(row).as_str()).or_default().push(row);
    }
    groups
}

/// Table cells cannot hold pipes or raw newlines.
fn cell(s: &str) -> String {
    s.replace('|', "\\|").replace('\n', "<br>")
}
