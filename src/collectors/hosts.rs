use super::CheckRun;
use crate::config::{Cluster, Node};
use crate::evaluate::{evaluate, Scope, Target};
use crate::model::CheckOutcome;
use tracing::debug;

/// Host checks on every control-plane node, then every worker.
pub async fn check_hosts(run: &CheckRun<'_>, cluster: &Cluster, env_label: &str) -> Vec<CheckOutcome> {
    let checks = &run.catalog.host_checks;
    let node_count = cluster.masters.len() + cluster.workers.len();
    let mut outcomes = Vec::with_capacity(checks.len() * node_count);

    for (role, nodes) in [("Master", &cluster.masters), ("Worker", &cluster.workers)] {
        let category = format!("{env_label} {role}");
        for node in nodes {
            let ctx = Target {
                scope: Scope::Host,
                category: &category,
                environment: env_label,
                target: &node.name,
            };
            for check in checks {
                let output = run
                    .runner
                    .execute(
                        ssh_host(node),
                        &node.address,
                        &check.command,
                        node.ssh_port,
                        None,
                    )
                    .await;
                let outcome = evaluate(run.catalog, check, &output, &ctx);
                debug!(check = %outcome.id, node = %node.name, status = outcome.status.as_str(), "host check");
                outcomes.push(outcome);
            }
        }
    }

    outcomes
}

fn ssh_host(node: &Node) -> &str {
    if node.hostname.is_empty() {
        &node.name
    } else {
        &node.hostname
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CheckCatalog;
    use crate::collectors::testing::FakeRunner;
    use crate::model::Status;
    use crate::runner::{ExecOutput, TransportFailure};

    #[tokio::test]
    async fn every_node_gets_every_check() {
        let cluster: Cluster = serde_yaml::from_str(
            r#"
masters:
  - {name: m1, hostname: m1.internal, address: 10.0.0.1}
workers:
  - {name: w1, address: 10.0.0.2, ssh_port: 2200}
  - {name: w2, address: 10.0.0.3}
"#,
        )
        .expect("cluster");
        let catalog: CheckCatalog = serde_yaml::from_str(
            r#"
host_checks:
  - {id: OS-001, name: Disk, description: d, command: disk, threshold: 80, unit: "%"}
  - {id: OS-010, name: Kernel, description: d, command: kernel}
"#,
        )
        .expect("catalog");
        let runner = FakeRunner {
            outputs: vec![
                ("disk".to_string(), ExecOutput::succeeded("91%")),
                (
                    "kernel".to_string(),
                    ExecOutput::failed(TransportFailure::ClientNotFound),
                ),
            ],
            ..FakeRunner::default()
        };
        let run = CheckRun {
            runner: &runner,
            catalog: &catalog,
            expected_http_status: 200,
        };

        let outcomes = check_hosts(&run, &cluster, "STG").await;
        assert_eq!(outcomes.len(), 6);

        let targets: Vec<&str> = outcomes.iter().map(|o| o.target.as_str()).collect();
        assert_eq!(targets, vec!["m1", "m1", "w1", "w1", "w2", "w2"]);
        assert_eq!(outcomes[0].category, "STG Master");
        assert_eq!(outcomes[2].category, "STG Worker");

        assert_eq!(outcomes[0].status, Status::Critical);
        assert_eq!(outcomes[0].value, "91%");
        assert_eq!(outcomes[1].status, Status::Unknown);
        assert_eq!(outcomes[1].message, "ssh client not found");

        let calls = runner.calls();
        assert_eq!(calls[0], "exec m1.internal disk");
        assert_eq!(calls[2], "exec w1 disk");
    }
}
