use crate::config::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::Path;

/// Count-style checks where any non-zero measurement is a finding.
pub const DEFAULT_ZERO_IS_HEALTHY: [&str; 8] = [
    "OS-005", "K8S-008", "K8S-009", "SVC-004", "SVC-006", "SVC-007", "SVC-008", "SVC-010",
];

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CheckCatalog {
    #[serde(default)]
    pub host_checks: Vec<CheckDefinition>,
    #[serde(default)]
    pub cluster_checks: Vec<CheckDefinition>,
    #[serde(default)]
    pub workload_checks: Vec<CheckDefinition>,
    #[serde(default = "default_zero_is_healthy")]
    pub zero_is_healthy: BTreeSet<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CheckDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    pub command: String,
    #[serde(default)]
    pub threshold: Option<f64>,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub expected: Option<String>,
    #[serde(default)]
    pub check_type: Option<CheckType>,
    #[serde(default = "default_severity")]
    pub severity: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckType {
    #[serde(alias = "replica_match")]
    ReplicaMismatch,
}

/// How raw command output is turned into a status.
#[derive(Debug, Clone, PartialEq)]
pub enum Policy<'a> {
    ReplicaMismatch,
    ExpectedPattern(&'a str),
    ZeroIsHealthy,
    Magnitude(f64),
    InfoOnly,
}

impl CheckCatalog {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        let path_display = path_ref.display().to_string();
        let text = fs::read_to_string(path_ref).map_err(|source| ConfigError::Read {
            path: path_display.clone(),
            source,
        })?;

        let catalog: CheckCatalog =
            serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path_display,
                source,
            })?;

        catalog.validate()?;
        Ok(catalog)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut ids = HashSet::new();
        for check in self.all() {
            if check.id.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "check id must not be empty".to_string(),
                ));
            }
            if !ids.insert(check.id.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "check id '{}' must be unique",
                    check.id
                )));
            }
            if check.command.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "check '{}' command must not be empty",
                    check.id
                )));
            }
        }
        Ok(())
    }

    pub fn all(&self) -> impl Iterator<Item = &CheckDefinition> {
        self.host_checks
            .iter()
            .chain(self.cluster_checks.iter())
            .chain(self.workload_checks.iter())
    }

    pub fn is_zero_healthy(&self, id: &str) -> bool {
        self.zero_is_healthy.contains(id)
    }

    /// Replica mismatch wins over an expected pattern, which wins over a threshold.
    pub fn policy_for<'a>(&self, check: &'a CheckDefinition) -> Policy<'a> {
        if check.check_type == Some(CheckType::ReplicaMismatch) {
            return Policy::ReplicaMismatch;
        }
        if let Some(expected) = check.expected.as_deref().filter(|e| !e.is_empty()) {
            return Policy::ExpectedPattern(expected);
        }
        match check.threshold {
            Some(_) if self.is_zero_healthy(&check.id) => Policy::ZeroIsHealthy,
            Some(threshold) => Policy::Magnitude(threshold),
            None => Policy::InfoOnly,
        }
    }

    pub fn bundled_yaml() -> &'static str {
        include_str!("../config/check_items.yaml")
    }
}

fn default_zero_is_healthy() -> BTreeSet<String> {
    DEFAULT_ZERO_IS_HEALTHY
        .iter()
        .map(|id| id.to_string())
        .collect()
}

fn default_severity() -> String {
    "medium".to_string()
}
