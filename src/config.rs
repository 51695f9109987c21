use indexmap::IndexMap;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Inventory {
    #[serde(default)]
    pub ssh: SshConfig,
    #[serde(default)]
    pub probes: ProbeConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub cicd_servers: IndexMap<String, CicdServer>,
    #[serde(default)]
    pub dev_cluster: Option<Cluster>,
    #[serde(default)]
    pub stg_cluster: Option<Cluster>,
    #[serde(default)]
    pub prd_cluster: Option<Cluster>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SshConfig {
    #[serde(default = "default_ssh_user")]
    pub default_user: String,
    #[serde(default = "default_private_key_path")]
    pub private_key_path: String,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProbeConfig {
    #[serde(default = "default_tcp_timeout_ms")]
    pub tcp_timeout_ms: u64,
    #[serde(default = "default_http_timeout_ms")]
    pub http_timeout_ms: u64,
    #[serde(default = "default_expected_status")]
    pub http_expected_status: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Weekly,
    Monthly,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReportConfig {
    #[serde(rename = "type", default = "default_report_kind")]
    pub kind: ReportKind,
    #[serde(default = "default_company_name")]
    pub company_name: String,
    #[serde(default = "default_team_name")]
    pub team_name: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Node {
    pub name: String,
    #[serde(default)]
    pub hostname: String,
    #[serde(alias = "ip")]
    pub address: String,
    #[serde(default = "default_ssh_port")]
    pub ssh_port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CicdServer {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub hostname: String,
    #[serde(alias = "ip")]
    pub address: String,
    #[serde(default = "default_ssh_port")]
    pub ssh_port: u16,
    #[serde(default)]
    pub services: Vec<CicdService>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CicdService {
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_http_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Database {
    pub name: String,
    #[serde(default)]
    pub hostname: String,
    #[serde(alias = "ip")]
    pub address: String,
    #[serde(default)]
    pub services: Vec<DatabaseService>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseService {
    #[serde(default = "default_db_service_name")]
    pub name: String,
    #[serde(default = "default_db_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Cluster {
    #[serde(default)]
    pub env: Option<String>,
    #[serde(default)]
    pub masters: Vec<Node>,
    #[serde(default)]
    pub workers: Vec<Node>,
    #[serde(default)]
    pub bastion: Option<Node>,
    #[serde(default)]
    pub databases: Vec<Database>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    /// Fixed run order.
    pub const ALL: [Environment; 3] = [
        Environment::Development,
        Environment::Staging,
        Environment::Production,
    ];

    pub fn inventory_key(self) -> &'static str {
        match self {
            Environment::Development => "dev_cluster",
            Environment::Staging => "stg_cluster",
            Environment::Production => "prd_cluster",
        }
    }
}

impl CicdServer {
    pub fn display_name<'a>(&'a self, key: &'a str) -> &'a str {
        self.name.as_deref().unwrap_or(key)
    }
}

impl Cluster {
    pub fn label(&self, env: Environment) -> String {
        self.env
            .clone()
            .unwrap_or_else(|| env.inventory_key().to_uppercase())
    }
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            default_user: default_ssh_user(),
            private_key_path: default_private_key_path(),
            connect_timeout_secs: default_connect_timeout_secs(),
            command_timeout_secs: default_command_timeout_secs(),
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            tcp_timeout_ms: default_tcp_timeout_ms(),
            http_timeout_ms: default_http_timeout_ms(),
            http_expected_status: default_expected_status(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            kind: default_report_kind(),
            company_name: default_company_name(),
            team_name: default_team_name(),
            output_dir: default_output_dir(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse YAML in {path}: {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },
    #[error("invalid config: {0}")]
    Validation(String),
    #[error("invalid substitution pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl Inventory {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        let path_display = path_ref.display().to_string();
        let raw = fs::read_to_string(path_ref).map_err(|source| ConfigError::Read {
            path: path_display.clone(),
            source,
        })?;

        let text = substitute_env(&raw, |name| std::env::var(name).ok())?;
        let mut inventory: Inventory =
            serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path_display,
                source,
            })?;

        inventory.apply_env_overrides(|name| std::env::var(name).ok());
        inventory.validate()?;
        Ok(inventory)
    }

    pub fn cluster(&self, env: Environment) -> Option<&Cluster> {
        match env {
            Environment::Development => self.dev_cluster.as_ref(),
            Environment::Staging => self.stg_cluster.as_ref(),
            Environment::Production => self.prd_cluster.as_ref(),
        }
    }

    /// `SSH_USER` and `SSH_PRIVATE_KEY_PATH` take precedence over the file.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(user) = lookup("SSH_USER").filter(|v| !v.trim().is_empty()) {
            self.ssh.default_user = user;
        }
        if let Some(key) = lookup("SSH_PRIVATE_KEY_PATH").filter(|v| !v.trim().is_empty()) {
            self.ssh.private_key_path = key;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ssh.default_user.trim().is_empty() {
            return Err(ConfigError::Validation(
                "ssh.default_user must not be empty".to_string(),
            ));
        }
        if self.ssh.connect_timeout_secs < 1 || self.ssh.command_timeout_secs < 1 {
            return Err(ConfigError::Validation(
                "ssh timeouts must be >= 1".to_string(),
            ));
        }
        if self.probes.tcp_timeout_ms == 0 || self.probes.http_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "probes timeouts must be > 0".to_string(),
            ));
        }

        validate_cicd_servers(&self.cicd_servers)?;
        for env in Environment::ALL {
            if let Some(cluster) = self.cluster(env) {
                validate_cluster(env.inventory_key(), cluster)?;
            }
        }

        Ok(())
    }

    pub fn example_yaml() -> &'static str {
        include_str!("../config/inventory.yaml.example")
    }
}

/// Replaces every `${NAME}` with the looked-up value; unknown names stay verbatim.
pub fn substitute_env(
    text: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String, ConfigError> {
    let pattern = Regex::new(r"\$\{([^}]+)\}")?;
    let replaced = pattern.replace_all(text, |caps: &Captures| {
        lookup(&caps[1]).unwrap_or_else(|| caps[0].to_string())
    });
    Ok(replaced.into_owned())
}

/// Hides the host part of an IPv4 address for log output.
pub fn mask_address(address: &str) -> String {
    let parts: Vec<&str> = address.split('.').collect();
    if parts.len() == 4 {
        format!("{}.{}.xxx.xxx", parts[0], parts[1])
    } else {
        "xxx.xxx.xxx.xxx".to_string()
    }
}

fn validate_cicd_servers(servers: &IndexMap<String, CicdServer>) -> Result<(), ConfigError> {
    for (key, server) in servers {
        if server.address.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "cicd_servers '{key}' address must not be empty"
            )));
        }
        for service in &server.services {
            if service.port == 0 {
                return Err(ConfigError::Validation(format!(
                    "cicd_servers '{key}' service '{}' port must be in 1..65535",
                    service.name
                )));
            }
        }
    }
    Ok(())
}

fn validate_cluster(key: &str, cluster: &Cluster) -> Result<(), ConfigError> {
    let mut names = HashSet::new();
    let nodes = cluster
        .masters
        .iter()
        .chain(cluster.workers.iter())
        .chain(cluster.bastion.iter());
    for node in nodes {
        if node.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "{key}: node name must not be empty"
            )));
        }
        if !names.insert(node.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "{key}: node name '{}' must be unique",
                node.name
            )));
        }
        if node.address.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "{key}: node '{}' address must not be empty",
                node.name
            )));
        }
        if node.ssh_port == 0 {
            return Err(ConfigError::Validation(format!(
                "{key}: node '{}' ssh_port must be in 1..65535",
                node.name
            )));
        }
    }

    for db in &cluster.databases {
        if db.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "{key}: database name must not be empty"
            )));
        }
        if db.address.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "{key}: database '{}' address must not be empty",
                db.name
            )));
        }
        if db.services.iter().any(|s| s.port == 0) {
            return Err(ConfigError::Validation(format!(
                "{key}: database '{}' port must be in 1..65535",
                db.name
            )));
        }
    }

    Ok(())
}

fn default_ssh_user() -> String {
    "admin".to_string()
}

fn default_private_key_path() -> String {
    "~/.ssh/id_rsa".to_string()
}

const fn default_connect_timeout_secs() -> u64 {
    10
}

const fn default_command_timeout_secs() -> u64 {
    30
}

const fn default_tcp_timeout_ms() -> u64 {
    5000
}

const fn default_http_timeout_ms() -> u64 {
    10_000
}

const fn default_expected_status() -> u16 {
    200
}

const fn default_report_kind() -> ReportKind {
    ReportKind::Weekly
}

fn default_company_name() -> String {
    "Infrastructure".to_string()
}

fn default_team_name() -> String {
    "Platform Team".to_string()
}

fn default_output_dir() -> String {
    "./output".to_string()
}

const fn default_ssh_port() -> u16 {
    22
}

const fn default_http_port() -> u16 {
    80
}

fn default_db_service_name() -> String {
    "MySQL".to_string()
}

const fn default_db_port() -> u16 {
    3306
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL: &str = r#"
cicd_servers:
  jenkins:
    name: Jenkins
    ip: 10.0.0.5
    services:
      - name: Jenkins
        port: 8080
dev_cluster:
  env: DEV
  masters:
    - name: master-01
      hostname: dev-master-01
      address: ${DEV_MASTER_IP}
  workers:
    - name: worker-01
      address: 10.1.0.11
      ssh_port: 2222
  databases:
    - name: db-1
      address: 10.1.0.50
      services:
        - {}
"#;

    #[test]
    fn substitute_env_replaces_known_and_keeps_unknown() {
        let out = substitute_env("a=${A} b=${B} c=$C", |name| {
            (name == "A").then(|| "1".to_string())
        })
        .expect("substitution");
        assert_eq!(out, "a=1 b=${B} c=$C");
    }

    #[test]
    fn parses_inventory_with_defaults() {
        let text = substitute_env(MINIMAL, |name| {
            (name == "DEV_MASTER_IP").then(|| "10.1.0.10".to_string())
        })
        .expect("substitution");
        let inv: Inventory = serde_yaml::from_str(&text).expect("parse");
        inv.validate().expect("valid");

        assert_eq!(inv.ssh.default_user, "admin");
        assert_eq!(inv.ssh.command_timeout_secs, 30);
        assert_eq!(inv.report.kind, ReportKind::Weekly);
        assert!(inv.stg_cluster.is_none());

        let dev = inv.cluster(Environment::Development).expect("dev cluster");
        assert_eq!(dev.masters[0].address, "10.1.0.10");
        assert_eq!(dev.masters[0].ssh_port, 22);
        assert_eq!(dev.workers[0].ssh_port, 2222);
        assert_eq!(dev.databases[0].services[0].name, "MySQL");
        assert_eq!(dev.databases[0].services[0].port, 3306);
        assert_eq!(dev.label(Environment::Development), "DEV");

        let jenkins = &inv.cicd_servers["jenkins"];
        assert_eq!(jenkins.address, "10.0.0.5");
        assert_eq!(jenkins.display_name("jenkins"), "Jenkins");
    }

    #[test]
    fn cluster_label_falls_back_to_key() {
        let cluster = Cluster {
            env: None,
            masters: vec![],
            workers: vec![],
            bastion: None,
            databases: vec![],
        };
        assert_eq!(cluster.label(Environment::Staging), "STG_CLUSTER");
    }

    #[test]
    fn env_overrides_take_precedence() {
        let mut inv: Inventory = serde_yaml::from_str("{}").expect("parse");
        inv.apply_env_overrides(|name| match name {
            "SSH_USER" => Some("ops".to_string()),
            "SSH_PRIVATE_KEY_PATH" => Some("  ".to_string()),
            _ => None,
        });
        assert_eq!(inv.ssh.default_user, "ops");
        assert_eq!(inv.ssh.private_key_path, "~/.ssh/id_rsa");
    }

    #[test]
    fn rejects_duplicate_node_names() {
        let yaml = r#"
prd_cluster:
  masters:
    - {name: m1, address: 10.3.0.1}
  workers:
    - {name: m1, address: 10.3.0.2}
"#;
        let inv: Inventory = serde_yaml::from_str(yaml).expect("parse");
        let err = inv.validate().expect_err("duplicate names");
        assert!(err.to_string().contains("must be unique"));
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = Inventory::load_from_file("/nonexistent/inventory.yaml").expect_err("missing");
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn load_from_file_reads_yaml() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(b"report:\n  type: monthly\n  team_name: SRE\n")
            .expect("write");
        let inv = Inventory::load_from_file(file.path()).expect("load");
        assert_eq!(inv.report.kind, ReportKind::Monthly);
        assert_eq!(inv.report.team_name, "SRE");
    }

    #[test]
    fn bundled_example_is_valid() {
        let inv: Inventory = serde_yaml::from_str(Inventory::example_yaml()).expect("parse");
        inv.validate().expect("valid");
        assert!(inv.cluster(Environment::Production).is_some());
    }

    #[test]
    fn mask_address_hides_host_part() {
        assert_eq!(mask_address("10.20.30.40"), "10.20.xxx.xxx");
        assert_eq!(mask_address("db.internal"), "xxx.xxx.xxx.xxx");
    }
}
