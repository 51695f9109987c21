pub mod hosts;
pub mod kubernetes;
pub mod probes;

use crate::catalog::CheckCatalog;
use crate::config::{Environment, Inventory};
use crate::model::CheckOutcome;
use crate::runner::RemoteRunner;
use tracing::{debug, info};

/// Everything a collector needs for one run.
pub struct CheckRun<'a> {
    pub runner: &'a dyn RemoteRunner,
    pub catalog: &'a CheckCatalog,
    pub expected_http_status: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    All,
    Only(Environment),
}

impl Selection {
    pub fn includes(self, env: Environment) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(only) => only == env,
        }
    }

    /// CI/CD services are not tied to an environment and only run in a full sweep.
    pub fn includes_cicd(self) -> bool {
        self == Selection::All
    }
}

/// Runs every check in fixed order: CI/CD, then each environment
/// (hosts, cluster, workloads, databases). Environments missing from the
/// inventory contribute nothing.
pub async fn run_all(
    run: &CheckRun<'_>,
    inventory: &Inventory,
    selection: Selection,
) -> Vec<CheckOutcome> {
    let mut outcomes = Vec::new();

    if selection.includes_cicd() {
        info!(servers = inventory.cicd_servers.len(), "checking CI/CD services");
        outcomes.extend(probes::check_cicd_services(run, &inventory.cicd_servers).await);
    }

    for env in Environment::ALL {
        if !selection.includes(env) {
            continue;
        }
        let Some(cluster) = inventory.cluster(env) else {
            debug!(environment = env.inventory_key(), "not in inventory, skipped");
            continue;
        };

        let label = cluster.label(env);
        info!(
            environment = %label,
            masters = cluster.masters.len(),
            workers = cluster.workers.len(),
            "checking environment"
        );
        outcomes.extend(hosts::check_hosts(run, cluster, &label).await);
        outcomes.extend(kubernetes::check_cluster(run, cluster, &label).await);
        outcomes.extend(kubernetes::check_workloads(run, cluster, &label).await);
        outcomes.extend(probes::check_databases(run, cluster, &label).await);
    }

    outcomes
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::runner::{ExecOutput, HttpProbe, RemoteRunner};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Scripted runner that records every call.
    #[derive(Default)]
    pub struct FakeRunner {
        pub outputs: Vec<(String, ExecOutput)>,
        pub http_ok: bool,
        pub tcp_open: bool,
        pub calls: Mutex<Vec<String>>,
    }

    impl FakeRunner {
        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().map(|c| c.clone()).unwrap_or_default()
        }

        fn record(&self, call: String) {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push(call);
            }
        }
    }

    #[async_trait]
    impl RemoteRunner for FakeRunner {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn execute(
            &self,
            host: &str,
            _address: &str,
            command: &str,
            _port: u16,
            _timeout: Option<Duration>,
        ) -> ExecOutput {
            self.record(format!("exec {host} {command}"));
            self.outputs
                .iter()
                .find(|(cmd, _)| cmd == command)
                .map(|(_, out)| out.clone())
                .unwrap_or_else(|| ExecOutput::succeeded("0"))
        }

        async fn probe_tcp(&self, address: &str, port: u16, _timeout: Option<Duration>) -> bool {
            self.record(format!("tcp {address}:{port}"));
            self.tcp_open
        }

        async fn probe_http(
            &self,
            url: &str,
            expected_status: u16,
            _timeout: Option<Duration>,
        ) -> HttpProbe {
            self.record(format!("http {url}"));
            if self.http_ok {
                HttpProbe {
                    ok: true,
                    status_code: expected_status,
                }
            } else {
                HttpProbe {
                    ok: false,
                    status_code: 0,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::FakeRunner;
    use super::*;

    const INVENTORY: &str = r#"
cicd_servers:
  jenkins:
    name: Jenkins
    address: 10.0.0.5
    services:
      - {name: Jenkins, port: 8080}
prd_cluster:
  env: PRD
  masters:
    - {name: prd-master-01, hostname: pm1, address: 10.3.0.1}
  databases:
    - name: prd-db1
      address: 10.3.0.50
      services:
        - {name: MySQL, port: 3306}
dev_cluster:
  env: DEV
  masters:
    - {name: dev-master-01, hostname: dm1, address: 10.1.0.1}
  workers:
    - {name: dev-worker-01, hostname: dw1, address: 10.1.0.2}
"#;

    const CATALOG: &str = r#"
host_checks:
  - {id: OS-001, name: Disk, description: d, command: df, threshold: 80}
cluster_checks:
  - {id: K8S-001, name: Nodes, description: d, command: nodes, expected: Ready}
workload_checks:
  - {id: SVC-007, name: Pending, description: d, command: pending, threshold: 1}
"#;

    fn fixtures() -> (Inventory, CheckCatalog) {
        (
            serde_yaml::from_str(INVENTORY).expect("inventory"),
            serde_yaml::from_str(CATALOG).expect("catalog"),
        )
    }

    #[tokio::test]
    async fn run_all_keeps_fixed_order() {
        let (inventory, catalog) = fixtures();
        let runner = FakeRunner {
            http_ok: true,
            tcp_open: true,
            ..FakeRunner::default()
        };
        let run = CheckRun {
            runner: &runner,
            catalog: &catalog,
            expected_http_status: 200,
        };

        let outcomes = run_all(&run, &inventory, Selection::All).await;
        let order: Vec<(&str, &str)> = outcomes
            .iter()
            .map(|o| (o.environment.as_str(), o.id.as_str()))
            .collect();

        assert_eq!(
            order,
            vec![
                ("CI/CD Infrastructure", "CICD-JEN"),
                ("DEV", "OS-001"),
                ("DEV", "OS-001"),
                ("DEV", "K8S-001"),
                ("DEV", "SVC-007"),
                ("PRD", "OS-001"),
                ("PRD", "K8S-001"),
                ("PRD", "SVC-007"),
                ("PRD", "DB-P1"),
            ]
        );
        assert_eq!(outcomes[1].category, "DEV Master");
        assert_eq!(outcomes[2].category, "DEV Worker");
    }

    #[tokio::test]
    async fn missing_environment_is_silently_skipped() {
        let (inventory, catalog) = fixtures();
        let runner = FakeRunner::default();
        let run = CheckRun {
            runner: &runner,
            catalog: &catalog,
            expected_http_status: 200,
        };

        let outcomes = run_all(
            &run,
            &inventory,
            Selection::Only(Environment::Staging),
        )
        .await;
        assert!(outcomes.is_empty());
        assert!(runner.calls().is_empty());

        let dev_only = run_all(
            &run,
            &inventory,
            Selection::Only(Environment::Development),
        )
        .await;
        assert_eq!(dev_only.len(), 4);
        assert!(dev_only.iter().all(|o| o.environment == "DEV"));
    }

    #[test]
    fn selection_rules() {
        assert!(Selection::All.includes_cicd());
        assert!(!Selection::Only(Environment::Production).includes_cicd());
        assert!(Selection::Only(Environment::Production).includes(Environment::Production));
        assert!(!Selection::Only(Environment::Production).includes(Environment::Staging));
    }
}
