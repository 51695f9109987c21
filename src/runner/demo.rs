use super::{ExecOutput, HttpProbe, RemoteRunner};
use async_trait::async_trait;
use std::time::Duration;

/// Canned command outputs keyed by command fragments. First entry whose
/// fragments all occur in the command wins, so specific entries go first.
const DEMO_OUTPUTS: &[(&[&str], &str)] = &[
    (&["kubectl get deploy"], ""),
    (&["kubectl get statefulset"], ""),
    (&["kubectl get daemonset"], ""),
    (&["kubectl get endpoints"], "0"),
    (&["kubectl get ingress"], "5"),
    (&["kubectl get cronjobs"], "3"),
    (&["kubectl get jobs"], "0"),
    (&["status.phase=Pending"], "0"),
    (&["status.phase=Failed"], "0"),
    (&["kubectl get pods -A", "$5 > 10"], "0"),
    (&["type=Warning"], "2"),
    (&["kubectl top nodes", "$3"], "52"),
    (&["kubectl top nodes", "$5"], "71"),
    (&["kubectl get nodes", "wc -l"], "0"),
    (
        &["kubectl get nodes"],
        "master-01:Ready\nmaster-02:Ready\nmaster-03:Ready\nworker-01:Ready\nworker-02:Ready\nworker-03:Ready",
    ),
    (
        &["component=etcd"],
        "etcd-master-01:Running\netcd-master-02:Running\netcd-master-03:Running",
    ),
    (
        &["kube-system"],
        "coredns-5d78c9869d-2xkqp:Running\netcd-master-01:Running\nkube-apiserver-master-01:Running\nkube-scheduler-master-01:Running",
    ),
    (&["kubectl get pvc"], "pvc-data-01:Bound\npvc-data-02:Bound"),
    (&["kubectl get pv"], "pv-data-01:Bound\npv-data-02:Bound"),
    (&["kubectl version"], "v1.28.4"),
    (&["df -h"], "45"),
    (&["free -m", "NR==3"], "12.3"),
    (&["free -m"], "62.5"),
    (&["top -bn1"], "23"),
    (&["uptime"], "up 15 days, 4 hours"),
    (&["ps aux"], "0"),
    (&["/proc/loadavg"], "1.25"),
    (&["file-nr"], "3456"),
    (&["ss -t"], "128"),
    (&["uname -r"], "5.15.0-91-generic"),
];

const DEMO_FALLBACK: &str = "OK";

/// Stand-in for the SSH runner: no connections, deterministic outputs, probes always succeed.
#[derive(Debug, Default, Clone, Copy)]
pub struct DemoRunner;

impl DemoRunner {
    pub fn output_for(command: &str) -> &'static str {
        DEMO_OUTPUTS
            .iter()
            .find(|(needles, _)| needles.iter().all(|n| command.contains(n)))
            .map(|(_, output)| *output)
            .unwrap_or(DEMO_FALLBACK)
    }
}

#[async_trait]
impl RemoteRunner for DemoRunner {
    fn name(&self) -> &'static str {
        "demo"
    }

    async fn execute(
        &self,
        _host: &str,
        _address: &str,
        command: &str,
        _port: u16,
        _timeout: Option<Duration>,
    ) -> ExecOutput {
        let mut out = ExecOutput::succeeded(Self::output_for(command));
        out.elapsed = Duration::from_millis(100);
        out
    }

    async fn probe_tcp(&self, _address: &str, _port: u16, _timeout: Option<Duration>) -> bool {
        true
    }

    async fn probe_http(
        &self,
        _url: &str,
        expected_status: u16,
        _timeout: Option<Duration>,
    ) -> HttpProbe {
        HttpProbe {
            ok: true,
            status_code: expected_status,
        }
    }
}
