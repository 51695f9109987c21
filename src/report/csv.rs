use super::ReportMeta;
use crate::model::ReportRow;
use crate::summary::Summary;
use std::fmt::Write;

/// `#` header lines, a blank line, then one record per outcome.
pub fn render(meta: &ReportMeta, rows: &[ReportRow], summary: &Summary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {}", meta.title);
    let _ = writeln!(out, "# Generated: {}", meta.generated_at);
    let _ = writeln!(out, "# Company: {}", meta.company_name);
    let _ = writeln!(out, "# Team: {}", meta.team_name);
    let _ = writeln!(out, "# Total checks: {}", summary.total);
    let _ = writeln!(
        out,
        "# OK: {} / Warning: {} / Critical: {} / Unknown: {}",
        summary.ok, summary.warning, summary.critical, summary.unknown
    );
    out.push('\n');

    push_record(&mut out, ReportRow::KEYS.iter().copied());
    for row in rows {
        push_record(&mut out, row.fields().into_iter());
    }
    out
}

fn push_record<'a>(out: &mut String, fields: impl Iterator<Item = &'a str>) {
    for (idx, field) in fields.enumerate() {
        if idx > 0 {
            out.push(',');
        }
        out.push_str(&quote(field));
    }
    out.push_str("\r\n");
}

fn quote(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{fixtures, rows};
    use crate::summary::summarize;

    #[test]
    fn header_block_then_records() {
        let outcomes = fixtures::outcomes();
        let text = render(&fixtures::meta(), &rows(&outcomes), &summarize(&outcomes));
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "# 2026 week 42 infrastructure inspection report");
        assert_eq!(lines[4], "# Total checks: 4");
        assert_eq!(lines[5], "# OK: 1 / Warning: 1 / Critical: 1 / Unknown: 1");
        assert_eq!(lines[6], "");
        assert!(lines[7].starts_with("id,name,category,environment,target"));
        assert!(lines[8].starts_with("CICD-GIT,CICD-GIT check,CI/CD,"));
        assert_eq!(lines.len(), 12);
    }

    #[test]
    fn multi_line_values_are_quoted() {
        let mut outcome = fixtures::outcome(
            "SVC-001",
            "DEV",
            "Services",
            crate::model::Status::Warning,
            "ns/a 1/2\nns/b \"x\", 0/1",
        );
        outcome.threshold = None;
        let text = render(
            &fixtures::meta(),
            &rows(&[outcome]),
            &summarize(&[]),
        );
        assert!(text.contains("\"ns/a 1/2\nns/b \"\"x\"\", 0/1\""));
        assert!(text.contains(",-,"));
    }

    #[test]
    fn plain_fields_stay_bare() {
        assert_eq!(quote("45%"), "45%");
        assert_eq!(quote("a,b"), "\"a,b\"");
    }
}
