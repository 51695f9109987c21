use super::CheckRun;
use crate::catalog::CheckDefinition;
use crate::config::Cluster;
use crate::evaluate::{evaluate, Scope, Target};
use crate::model::CheckOutcome;
use tracing::{debug, warn};

pub async fn check_cluster(run: &CheckRun<'_>, cluster: &Cluster, env_label: &str) -> Vec<CheckOutcome> {
    let target = format!("{env_label} Cluster");
    let ctx = Target {
        scope: Scope::Cluster,
        category: "Kubernetes",
        environment: env_label,
        target: &target,
    };
    run_on_control_plane(run, cluster, &run.catalog.cluster_checks, &ctx).await
}

pub async fn check_workloads(
    run: &CheckRun<'_>,
    cluster: &Cluster,
    env_label: &str,
) -> Vec<CheckOutcome> {
    let target = format!("{env_label} Services");
    let ctx = Target {
        scope: Scope::Workload,
        category: "Services",
        environment: env_label,
        target: &target,
    };
    run_on_control_plane(run, cluster, &run.catalog.workload_checks, &ctx).await
}

/// kubectl runs on the first control-plane node only.
async fn run_on_control_plane(
    run: &CheckRun<'_>,
    cluster: &Cluster,
    checks: &[CheckDefinition],
    ctx: &Target<'_>,
) -> Vec<CheckOutcome> {
    let Some(master) = cluster.masters.first() else {
        warn!(environment = ctx.environment, category = ctx.category, "no control-plane node, skipped");
        return Vec::new();
    };
    let host = if master.hostname.is_empty() {
        master.name.as_str()
    } else {
        master.hostname.as_str()
    };

    let mut outcomes = Vec::with_capacity(checks.len());
    for check in checks {
        let output = run
            .runner
            .execute(host, &master.address, &check.command, master.ssh_port, None)
            .await;
        let outcome = evaluate(run.catalog, check, &output, ctx);
        debug!(check = %outcome.id, target = ctx.target, status = outcome.status.as_str(), "cluster check");
        outcomes.push(outcome);
    }
    outcomes
}
