use crate::model::{CheckOutcome, Status};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub ok: usize,
    pub warning: usize,
    pub critical: usize,
    pub unknown: usize,
}

impl StatusCounts {
    fn record(&mut self, status: Status) {
        match status {
            Status::Ok => self.ok += 1,
            Status::Warning => self.warning += 1,
            Status::Critical => self.critical += 1,
            Status::Unknown => self.unknown += 1,
        }
    }

    pub fn get(&self, status: Status) -> usize {
        match status {
            Status::Ok => self.ok,
            Status::Warning => self.warning,
            Status::Critical => self.critical,
            Status::Unknown => self.unknown,
        }
    }

    pub fn total(&self) -> usize {
        self.ok + self.warning + self.critical + self.unknown
    }
}

/// Grouped counts over one outcome list. Groups keep first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub ok: usize,
    pub warning: usize,
    pub critical: usize,
    pub unknown: usize,
    pub by_environment: IndexMap<String, StatusCounts>,
    pub by_category: IndexMap<String, StatusCounts>,
}

impl Summary {
    pub fn counts(&self) -> StatusCounts {
        StatusCounts {
            ok: self.ok,
            warning: self.warning,
            critical: self.critical,
            unknown: self.unknown,
        }
    }

    /// 2 on any critical, 1 on any warning, else 0. Unknown never changes it.
    pub fn exit_code(&self) -> i32 {
        if self.critical > 0 {
            2
        } else if self.warning > 0 {
            1
        } else {
            0
        }
    }
}

pub fn summarize(outcomes: &[CheckOutcome]) -> Summary {
    let mut overall = StatusCounts::default();
    let mut by_environment: IndexMap<String, StatusCounts> = IndexMap::new();
    let mut by_category: IndexMap<String, StatusCounts> = IndexMap::new();

    for outcome in outcomes {
        overall.record(outcome.status);
        by_environment
            .entry(outcome.environment.clone())
            .or_default()
            .record(outcome.status);
        by_category
            .entry(outcome.category.clone())
            .or_default()
            .record(outcome.status);
    }

    Summary {
        total: outcomes.len(),
        ok: overall.ok,
        warning: overall.warning,
        critical: overall.critical,
        unknown: overall.unknown,
        by_environment,
        by_category,
    }
}

/// Ids reused for different checks (different name or description), in first-seen order.
/// The same check repeated across nodes or environments is not a collision.
pub fn duplicate_ids(outcomes: &[CheckOutcome]) -> Vec<String> {
    let mut first: HashMap<&str, (&str, &str)> = HashMap::new();
    let mut dups: Vec<String> = Vec::new();
    for outcome in outcomes {
        let identity = (outcome.name.as_str(), outcome.description.as_str());
        let seen = *first.entry(outcome.id.as_str()).or_insert(identity);
        if seen != identity && !dups.iter().any(|d| d == &outcome.id) {
            dups.push(outcome.id.clone());
        }
    }
    dups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(id: &str, env: &str, category: &str, status: Status) -> CheckOutcome {
        CheckOutcome {
            id: id.to_string(),
            name: id.to_string(),
            category: category.to_string(),
            environment: env.to_string(),
            description: String::new(),
            status,
            value: String::new(),
            threshold: None,
            unit: String::new(),
            message: String::new(),
            target: String::new(),
            timestamp: String::new(),
            severity: "medium".to_string(),
        }
    }

    fn sample() -> Vec<CheckOutcome> {
        vec![
            outcome("CICD-GIT", "CI/CD Infrastructure", "CI/CD", Status::Ok),
            outcome("OS-001", "DEV", "DEV Master", Status::Warning),
            outcome("OS-002", "DEV", "DEV Master", Status::Unknown),
            outcome("K8S-001", "DEV", "Kubernetes", Status::Ok),
            outcome("K8S-001", "PRD", "Kubernetes", Status::Critical),
            outcome("DB-P1", "PRD", "Database", Status::Ok),
        ]
    }

    #[test]
    fn counts_add_up_in_every_group() {
        let summary = summarize(&sample());
        assert_eq!(summary.total, 6);
        assert_eq!(summary.counts().total(), summary.total);
        assert_eq!(summary.ok, 3);
        assert_eq!(summary.unknown, 1);

        let env_total: usize = summary.by_environment.values().map(StatusCounts::total).sum();
        let cat_total: usize = summary.by_category.values().map(StatusCounts::total).sum();
        assert_eq!(env_total, summary.total);
        assert_eq!(cat_total, summary.total);

        let dev = summary.by_environment["DEV"];
        assert_eq!((dev.ok, dev.warning, dev.unknown), (1, 1, 1));
        assert_eq!(summary.by_category["Kubernetes"].critical, 1);
        assert_eq!(summary.by_category["Kubernetes"].get(Status::Ok), 1);
    }

    #[test]
    fn groups_keep_first_seen_order() {
        let summary = summarize(&sample());
        let envs: Vec<&str> = summary.by_environment.keys().map(String::as_str).collect();
        assert_eq!(envs, vec!["CI/CD Infrastructure", "DEV", "PRD"]);
    }

    #[test]
    fn summarize_is_idempotent() {
        let outcomes = sample();
        assert_eq!(summarize(&outcomes), summarize(&outcomes));
    }

    #[test]
    fn filtered_list_is_recomputed() {
        let outcomes = sample();
        let prd: Vec<CheckOutcome> = outcomes
            .iter()
            .filter(|o| o.environment == "PRD")
            .cloned()
            .collect();
        let summary = summarize(&prd);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.by_environment.len(), 1);
    }

    #[test]
    fn empty_input() {
        let summary = summarize(&[]);
        assert_eq!(summary.total, 0);
        assert!(summary.by_environment.is_empty());
        assert_eq!(summary.exit_code(), 0);
    }

    #[test]
    fn exit_code_follows_worst_actionable_status() {
        let mut outcomes = vec![outcome("A", "DEV", "c", Status::Unknown)];
        assert_eq!(summarize(&outcomes).exit_code(), 0);
        outcomes.push(outcome("B", "DEV", "c", Status::Warning));
        assert_eq!(summarize(&outcomes).exit_code(), 1);
        outcomes.push(outcome("C", "DEV", "c", Status::Critical));
        assert_eq!(summarize(&outcomes).exit_code(), 2);
    }

    #[test]
    fn reused_id_for_different_check_is_flagged() {
        let mut outcomes = sample();
        outcomes.push(outcome("K8S-001", "STG", "Kubernetes", Status::Ok));
        assert!(duplicate_ids(&outcomes).is_empty());

        let mut registry = outcome("CICD-GIT", "CI/CD Infrastructure", "CI/CD", Status::Ok);
        registry.name = "Registry service".to_string();
        outcomes.push(registry.clone());
        outcomes.push(registry);
        assert_eq!(duplicate_ids(&outcomes), vec!["CICD-GIT".to_string()]);
    }
}
