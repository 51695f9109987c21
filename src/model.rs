use serde::Serialize;
use std::time::SystemTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Warning,
    Critical,
    Unknown,
}

impl Status {
    pub const ALL: [Status; 4] = [
        Status::Ok,
        Status::Warning,
        Status::Critical,
        Status::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Ok => "ok",
            Status::Warning => "warning",
            Status::Critical => "critical",
            Status::Unknown => "unknown",
        }
    }

    pub fn needs_action(self) -> bool {
        matches!(self, Status::Warning | Status::Critical)
    }
}

/// Result of evaluating one check definition against one target.
#[derive(Debug, Clone, Serialize)]
pub struct CheckOutcome {
    pub id: String,
    pub name: String,
    pub category: String,
    /// Environment label ("DEV", "STG", ...) or a fixed label for non-environment checks.
    pub environment: String,
    pub description: String,
    pub status: Status,
    pub value: String,
    pub threshold: Option<f64>,
    pub unit: String,
    pub message: String,
    pub target: String,
    pub timestamp: String,
    pub severity: String,
}

impl CheckOutcome {
    pub fn threshold_display(&self) -> String {
        match self.threshold {
            Some(t) if t != 0.0 => format!("{}{}", format_number(t), self.unit),
            _ => "-".to_string(),
        }
    }
}

/// Flat row handed to report emitters. Keys are fixed.
#[derive(Debug, Clone, Serialize)]
pub struct ReportRow {
    pub id: String,
    pub name: String,
    pub category: String,
    pub environment: String,
    pub target: String,
    pub description: String,
    pub status: String,
    pub value: String,
    pub threshold: String,
    pub message: String,
    pub severity: String,
    pub timestamp: String,
}

impl ReportRow {
    pub const KEYS: [&'static str; 12] = [
        "id",
        "name",
        "category",
        "environment",
        "target",
        "description",
        "status",
        "value",
        "threshold",
        "message",
        "severity",
        "timestamp",
    ];

    pub fn from_outcome(outcome: &CheckOutcome, status_label: &str) -> Self {
        Self {
            id: outcome.id.clone(),
            name: outcome.name.clone(),
            category: outcome.category.clone(),
            environment: outcome.environment.clone(),
            target: outcome.target.clone(),
            description: outcome.description.clone(),
            status: status_label.to_string(),
            value: outcome.value.clone(),
            threshold: outcome.threshold_display(),
            message: outcome.message.clone(),
            severity: outcome.severity.clone(),
            timestamp: outcome.timestamp.clone(),
        }
    }

    pub fn fields(&self) -> [&str; 12] {
        [
            self.id.as_str(),
            self.name.as_str(),
            self.category.as_str(),
            self.environment.as_str(),
            self.target.as_str(),
            self.description.as_str(),
            self.status.as_str(),
            self.value.as_str(),
            self.threshold.as_str(),
            self.message.as_str(),
            self.severity.as_str(),
            self.timestamp.as_str(),
        ]
    }
}

pub fn now_rfc3339() -> String {
    humantime::format_rfc3339_seconds(SystemTime::now()).to_string()
}

/// Formats a measurement without a trailing ".0" for whole numbers.
pub fn format_number(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(threshold: Option<f64>, unit: &str) -> CheckOutcome {
        CheckOutcome {
            id: "OS-001".to_string(),
            name: "Disk usage".to_string(),
            category: "DEV Master".to_string(),
            environment: "DEV".to_string(),
            description: "root filesystem usage".to_string(),
            status: Status::Ok,
            value: "45".to_string(),
            threshold,
            unit: unit.to_string(),
            message: "within normal range".to_string(),
            target: "master-01".to_string(),
            timestamp: "2026-01-01T00:00:00Z".to_string(),
            severity: "high".to_string(),
        }
    }

    #[test]
    fn threshold_display_uses_unit_or_dash() {
        assert_eq!(outcome(Some(80.0), "%").threshold_display(), "80%");
        assert_eq!(outcome(Some(2.5), "").threshold_display(), "2.5");
        assert_eq!(outcome(None, "%").threshold_display(), "-");
        assert_eq!(outcome(Some(0.0), "%").threshold_display(), "-");
    }

    #[test]
    fn report_row_keeps_key_order() {
        let row = ReportRow::from_outcome(&outcome(Some(80.0), "%"), "OK");
        let fields = row.fields();
        assert_eq!(fields.len(), ReportRow::KEYS.len());
        assert_eq!(fields[0], "OS-001");
        assert_eq!(fields[6], "OK");
        assert_eq!(fields[8], "80%");
    }

    #[test]
    fn format_number_drops_trailing_zero() {
        assert_eq!(format_number(2.0), "2");
        assert_eq!(format_number(62.5), "62.5");
        assert_eq!(format_number(-1.0), "-1");
    }
}
