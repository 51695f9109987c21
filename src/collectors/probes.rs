use super::CheckRun;
use crate::config::{CicdServer, Cluster};
use crate::evaluate::{Reachability, ReachabilityCheck};
use crate::model::CheckOutcome;
use indexmap::IndexMap;
use tracing::debug;

pub const CICD_CATEGORY: &str = "CI/CD";
pub const CICD_ENVIRONMENT: &str = "CI/CD Infrastructure";

/// HTTP first, TCP as fallback, for every exposed CI/CD service.
pub async fn check_cicd_services(
    run: &CheckRun<'_>,
    servers: &IndexMap<String, CicdServer>,
) -> Vec<CheckOutcome> {
    let mut outcomes = Vec::new();

    for (key, server) in servers {
        let server_name = server.display_name(key);
        for service in &server.services {
            let url = format!("http://{}:{}/", server.address, service.port);
            let probe = run
                .runner
                .probe_http(&url, run.expected_http_status, None)
                .await;

            let reach = if probe.ok {
                Reachability::Http {
                    status_code: probe.status_code,
                }
            } else if run
                .runner
                .probe_tcp(&server.address, service.port, None)
                .await
            {
                Reachability::Tcp { port: service.port }
            } else {
                Reachability::Unreachable
            };
            debug!(server = server_name, service = %service.name, ?reach, "cicd probe");

            let check = ReachabilityCheck {
                id: cicd_check_id(key),
                name: format!("{} service", service.name),
                category: CICD_CATEGORY.to_string(),
                environment: CICD_ENVIRONMENT.to_string(),
                description: format!("{server_name} {} service status", service.name),
                target: server_name.to_string(),
            };
            outcomes.push(check.service_outcome(reach));
        }
    }

    outcomes
}

pub async fn check_databases(run: &CheckRun<'_>, cluster: &Cluster, env_label: &str) -> Vec<CheckOutcome> {
    let mut outcomes = Vec::new();

    for db in &cluster.databases {
        for service in &db.services {
            let reach = if run.runner.probe_tcp(&db.address, service.port, None).await {
                Reachability::Tcp { port: service.port }
            } else {
                Reachability::Unreachable
            };
            debug!(database = %db.name, service = %service.name, ?reach, "database probe");

            let check = ReachabilityCheck {
                id: database_check_id(env_label, &db.name),
                name: format!("{} connection", service.name),
                category: "Database".to_string(),
                environment: env_label.to_string(),
                description: format!("{} {} port connectivity", db.name, service.name),
                target: format!("{env_label} {}", db.name),
            };
            outcomes.push(check.database_outcome(reach));
        }
    }

    outcomes
}

/// First three letters of the server key. Not unique across services of one server.
pub fn cicd_check_id(key: &str) -> String {
    let prefix: String = key.to_uppercase().chars().take(3).collect();
    format!("CICD-{prefix}")
}

/// First letter of the environment plus last letter of the database name.
pub fn database_check_id(env_label: &str, db_name: &str) -> String {
    let env: String = env_label.chars().take(1).collect();
    let db: String = db_name.chars().last().map(String::from).unwrap_or_default();
    format!("DB-{env}{db}")
}
