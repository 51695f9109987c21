//! Classification of raw check output into a [`Status`].
//!
//! Every evaluation yields exactly one [`CheckOutcome`]. Transport failures
//! always map to [`Status::Unknown`] before any policy is consulted.

use crate::catalog::{CheckCatalog, CheckDefinition, Policy};
use crate::model::{format_number, now_rfc3339, CheckOutcome, Status};
use crate::runner::ExecOutput;

pub const NOT_AVAILABLE: &str = "N/A";
pub const ALL_NORMAL: &str = "all normal";
pub const MAX_VALUE_CHARS: usize = 200;

const NEAR_THRESHOLD_RATIO: f64 = 0.8;
const ZERO_HEALTHY_WARNING_MAX: f64 = 3.0;
const PATTERN_WARNING_RATIO: f64 = 0.7;
const REPLICA_WARNING_MAX: usize = 3;

/// Where a command-backed check runs; drives value storage and fallback messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Host,
    Cluster,
    Workload,
}

impl Scope {
    fn failure_message(self) -> &'static str {
        match self {
            Scope::Host => "connection failed",
            Scope::Cluster => "kubectl execution failed",
            Scope::Workload => "check failed",
        }
    }

    fn empty_value(self) -> Option<&'static str> {
        match self {
            Scope::Host => None,
            Scope::Cluster => Some(NOT_AVAILABLE),
            Scope::Workload => Some("0"),
        }
    }

    fn truncates(self) -> bool {
        matches!(self, Scope::Cluster | Scope::Workload)
    }
}

/// Identifying context of one evaluation.
#[derive(Debug, Clone, Copy)]
pub struct Target<'a> {
    pub scope: Scope,
    pub category: &'a str,
    pub environment: &'a str,
    pub target: &'a str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub status: Status,
    pub message: String,
}

impl Verdict {
    fn new(status: Status, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

pub fn evaluate(
    catalog: &CheckCatalog,
    check: &CheckDefinition,
    output: &ExecOutput,
    ctx: &Target<'_>,
) -> CheckOutcome {
    if !output.success() {
        let message = output
            .error_message()
            .unwrap_or_else(|| ctx.scope.failure_message().to_string());
        return build(check, ctx, Status::Unknown, NOT_AVAILABLE.to_string(), message);
    }

    let raw = output.stdout.as_str();
    let (verdict, value) = match catalog.policy_for(check) {
        Policy::ReplicaMismatch => {
            let verdict = evaluate_replica_mismatch(raw);
            let value = if verdict.status == Status::Ok {
                ALL_NORMAL.to_string()
            } else {
                stored_value(raw, ctx.scope)
            };
            (verdict, value)
        }
        Policy::ExpectedPattern(expected) => {
            (evaluate_expected(raw, expected), stored_value(raw, ctx.scope))
        }
        Policy::ZeroIsHealthy => {
            let verdict = match parse_measurement(numeric_input(raw, ctx.scope)) {
                Some(v) => evaluate_zero_is_healthy(v),
                None => parse_failure(),
            };
            (verdict, stored_value(raw, ctx.scope))
        }
        Policy::Magnitude(threshold) => {
            let verdict = match parse_measurement(numeric_input(raw, ctx.scope)) {
                Some(v) => evaluate_magnitude(v, threshold),
                None => parse_failure(),
            };
            (verdict, stored_value(raw, ctx.scope))
        }
        Policy::InfoOnly => (
            Verdict::new(Status::Ok, "information collected"),
            stored_value(raw, ctx.scope),
        ),
    };

    build(check, ctx, verdict.status, value, verdict.message)
}

/// Strips surrounding whitespace and a trailing `%` before parsing.
pub fn parse_measurement(raw: &str) -> Option<f64> {
    let cleaned = raw.trim().trim_end_matches('%').trim();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn evaluate_zero_is_healthy(value: f64) -> Verdict {
    if value == 0.0 {
        Verdict::new(Status::Ok, "normal")
    } else if value <= ZERO_HEALTHY_WARNING_MAX {
        Verdict::new(
            Status::Warning,
            format!("needs attention ({})", format_number(value)),
        )
    } else {
        Verdict::new(
            Status::Critical,
            format!("immediate action needed ({})", format_number(value)),
        )
    }
}

pub fn evaluate_magnitude(value: f64, threshold: f64) -> Verdict {
    if value < threshold * NEAR_THRESHOLD_RATIO {
        Verdict::new(Status::Ok, "within normal range")
    } else if value < threshold {
        Verdict::new(
            Status::Warning,
            format!("approaching threshold ({})", format_number(threshold)),
        )
    } else {
        Verdict::new(
            Status::Critical,
            format!("threshold exceeded ({})", format_number(threshold)),
        )
    }
}

pub fn evaluate_expected(raw: &str, expected: &str) -> Verdict {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == NOT_AVAILABLE {
        return Verdict::new(Status::Unknown, "no data");
    }

    let records: Vec<&str> = trimmed
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if records.is_empty() {
        return Verdict::new(Status::Unknown, "no targets");
    }

    let total = records.len();
    let matched = records
        .iter()
        .filter(|r| contains_token(r, expected))
        .count();

    if matched == total {
        Verdict::new(Status::Ok, format!("all normal ({matched}/{total})"))
    } else if matched as f64 >= total as f64 * PATTERN_WARNING_RATIO {
        Verdict::new(
            Status::Warning,
            format!("partially degraded ({matched}/{total} normal)"),
        )
    } else {
        Verdict::new(
            Status::Critical,
            format!("{} problem(s) detected", total - matched),
        )
    }
}

/// Each non-empty output line names one mismatched resource.
pub fn evaluate_replica_mismatch(raw: &str) -> Verdict {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Verdict::new(Status::Ok, "all resources healthy");
    }

    let count = trimmed.lines().count();
    let status = if count <= REPLICA_WARNING_MAX {
        Status::Warning
    } else {
        Status::Critical
    };
    Verdict::new(status, format!("{count} mismatched resources"))
}

/// An alphanumeric edge of `token` must not be glued to alphanumerics, so `NotReady`
/// does not count as `Ready`. Separator edges (`:Ready`) match anywhere.
fn contains_token(record: &str, token: &str) -> bool {
    let (Some(first), Some(last)) = (token.chars().next(), token.chars().next_back()) else {
        return false;
    };
    let open_start = !first.is_alphanumeric();
    let open_end = !last.is_alphanumeric();
    record.match_indices(token).any(|(idx, _)| {
        let before = record[..idx].chars().next_back();
        let after = record[idx + token.len()..].chars().next();
        (open_start || !before.is_some_and(char::is_alphanumeric))
            && (open_end || !after.is_some_and(char::is_alphanumeric))
    })
}

fn parse_failure() -> Verdict {
    Verdict::new(Status::Unknown, "failed to parse value")
}

fn numeric_input(raw: &str, scope: Scope) -> &str {
    match scope {
        Scope::Workload if raw.trim().is_empty() => "0",
        _ => raw,
    }
}

fn stored_value(raw: &str, scope: Scope) -> String {
    if raw.is_empty() {
        if let Some(placeholder) = scope.empty_value() {
            return placeholder.to_string();
        }
    }
    if scope.truncates() {
        truncate_chars(raw, MAX_VALUE_CHARS)
    } else {
        raw.to_string()
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

fn build(
    check: &CheckDefinition,
    ctx: &Target<'_>,
    status: Status,
    value: String,
    message: String,
) -> CheckOutcome {
    CheckOutcome {
        id: check.id.clone(),
        name: check.name.clone(),
        category: ctx.category.to_string(),
        environment: ctx.environment.to_string(),
        description: check.description.clone(),
        status,
        value,
        threshold: check.threshold,
        unit: check.unit.clone(),
        message,
        target: ctx.target.to_string(),
        timestamp: now_rfc3339(),
        severity: check.severity.clone(),
    }
}

/// Result of a reachability probe, before it becomes an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reachability {
    Http { status_code: u16 },
    Tcp { port: u16 },
    Unreachable,
}

/// Identity of a probe-backed check. These never carry a threshold and are always critical.
#[derive(Debug, Clone)]
pub struct ReachabilityCheck {
    pub id: String,
    pub name: String,
    pub category: String,
    pub environment: String,
    pub description: String,
    pub target: String,
}

impl ReachabilityCheck {
    pub fn service_outcome(self, reach: Reachability) -> CheckOutcome {
        let (status, value, message) = match reach {
            Reachability::Http { status_code } => (
                Status::Ok,
                format!("{status_code} OK"),
                "service responded",
            ),
            Reachability::Tcp { port } => {
                (Status::Ok, format!("TCP {port} Open"), "port responding")
            }
            Reachability::Unreachable => (
                Status::Critical,
                "connection failed".to_string(),
                "service not responding",
            ),
        };
        self.into_outcome(status, value, message)
    }

    pub fn database_outcome(self, reach: Reachability) -> CheckOutcome {
        let (status, value, message) = match reach {
            Reachability::Tcp { port } => {
                (Status::Ok, format!("TCP {port} Open"), "database reachable")
            }
            Reachability::Http { status_code } => (
                Status::Ok,
                format!("{status_code} OK"),
                "database reachable",
            ),
            Reachability::Unreachable => (
                Status::Critical,
                "unreachable".to_string(),
                "database connection failed",
            ),
        };
        self.into_outcome(status, value, message)
    }

    fn into_outcome(self, status: Status, value: String, message: &str) -> CheckOutcome {
        CheckOutcome {
            id: self.id,
            name: self.name,
            category: self.category,
            environment: self.environment,
            description: self.description,
            status,
            value,
            threshold: None,
            unit: String::new(),
            message: message.to_string(),
            target: self.target,
            timestamp: now_rfc3339(),
            severity: "critical".to_string(),
        }
    }
}
