//! Compute-node reachability via one ping per host
//!
//! Two counts come out of the capture: how many hosts were attempted
//! (delimiter lines) and how many answered (success marker lines). Both must
//! equal the expected capacity.

use crate::config::Config;
use crate::probes::{count_matching, host_hint, per_host_command, Probe};
use crate::types::{ProbeResult, Subsystem};

#[derive(Debug, Clone)]
pub struct ConnectivityProbe {
    pub hosts: Vec<String>,
    pub delimiter: String,
    pub host_command: String,
    pub success_marker: String,
    pub expected: u32,
}

impl ConnectivityProbe {
    pub fn from_config(config: &Config) -> Self {
        let probe = &config.probes.executors;
        Self {
            hosts: config.cluster.hosts_for(probe.expected),
            delimiter: config.cluster.host_delimiter.clone(),
            host_command: probe.host_command.clone(),
            success_marker: probe.success_marker.clone(),
            expected: probe.expected,
        }
    }

    /// `(attempts, successes)` observed in the capture
    pub fn tally(&self, lines: &[String]) -> (u32, u32) {
        (
            count_matching(lines, &self.delimiter),
            count_matching(lines, &self.success_marker),
        )
    }
}

/// Both comparisons must hold independently.
pub fn connectivity_ok(attempts: u32, successes: u32, expected: u32) -> bool {
    attempts == expected && successes == expected
}

impl Probe for ConnectivityProbe {
    fn subsystem(&self) -> Subsystem {
        Subsystem::Connectivity
    }

    fn command(&self) -> String {
        per_host_command(&self.hosts, &self.delimiter, &self.host_command)
    }

    fn inspection_hint(&self) -> String {
        host_hint(&self.host_command)
    }

    fn interpret(&self, lines: &[String]) -> ProbeResult {
        let (attempts, successes) = self.tally(lines);
        let result = ProbeResult::new(Subsystem::Connectivity, successes, self.expected);
        if attempts != self.expected {
            result.with_anomaly(format!("{} of {} hosts probed", attempts, self.expected))
        } else {
            result
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probes::lines;
    use crate::types::Status;

    fn probe() -> ConnectivityProbe {
        ConnectivityProbe {
            hosts: (1..=9).map(|i| format!("slave{}", i)).collect(),
            delimiter: "==>".to_string(),
            host_command: "ping -c 1 -W 2 {host}".to_string(),
            success_marker: "transmitted, 1".to_string(),
            expected: 9,
        }
    }

    fn ping_output(attempted: u32, answered: u32) -> Vec<String> {
        let mut text = String::new();
        for i in 1..=attempted {
            text.push_str(&format!("==> slave{}\n", i));
            text.push_str(&format!("PING slave{} (10.0.0.{}) 56(84) bytes of data.\n", i, i));
            text.push_str(&format!("--- slave{} ping statistics ---\n", i));
            if i <= answered {
                text.push_str("1 packets transmitted, 1 received, 0% packet loss, time 0ms\n");
            } else {
                text.push_str("1 packets transmitted, 0 received, 100% packet loss, time 0ms\n");
            }
        }
        lines(&text)
    }

    /// How the expression `a == e & a == s` evaluates under Python's
    /// chained-comparison and precedence rules.
    fn chained_bitand(attempts: u32, successes: u32, expected: u32) -> bool {
        let middle = expected & attempts;
        attempts == middle && middle == successes
    }

    #[test]
    fn test_all_hosts_answer() {
        let result = probe().interpret(&ping_output(9, 9));
        assert_eq!(result.healthy, 9);
        assert_eq!(result.status, Status::Ok);
        assert_eq!(result.anomaly, None);
    }

    #[test]
    fn test_attempts_match_but_one_host_silent() {
        let output = ping_output(9, 8);
        assert_eq!(probe().tally(&output), (9, 8));

        let result = probe().interpret(&output);
        assert_eq!(result.healthy, 8);
        assert_eq!(result.status, Status::Degraded);
    }

    #[test]
    fn test_missing_host_sections_degrade() {
        let result = probe().interpret(&ping_output(8, 8));
        assert_eq!(result.status, Status::Degraded);
        assert_eq!(result.anomaly.as_deref(), Some("8 of 9 hosts probed"));
    }

    #[test]
    fn test_logical_and_where_bitwise_precedence_diverges() {
        // 8 & 9 == 8, so the chained form reports 8 of 9 hosts as healthy
        assert!(chained_bitand(8, 8, 9));
        assert!(!connectivity_ok(8, 8, 9));
        assert_eq!(probe().interpret(&ping_output(8, 8)).status, Status::Degraded);

        // 1 & 9 == 1, a single reachable host passes the chained form too
        assert!(chained_bitand(1, 1, 9));
        assert!(!connectivity_ok(1, 1, 9));
        assert_eq!(probe().interpret(&ping_output(1, 1)).status, Status::Degraded);

        // and both agree on the genuinely healthy case
        assert!(chained_bitand(9, 9, 9));
        assert!(connectivity_ok(9, 9, 9));
    }

    #[test]
    fn test_status_agrees_with_connectivity_ok() {
        for attempted in 0..=10 {
            for answered in 0..=attempted {
                let result = probe().interpret(&ping_output(attempted, answered));
                assert_eq!(
                    result.status == Status::Ok,
                    connectivity_ok(attempted, answered, 9),
                    "attempted={} answered={}",
                    attempted,
                    answered
                );
            }
        }
    }

    #[test]
    fn test_command_visits_every_host() {
        let command = probe().command();
        assert!(command.starts_with("echo '==> slave1'; ping -c 1 -W 2 slave1"));
        assert!(command.ends_with("ping -c 1 -W 2 slave9"));
        assert_eq!(probe().inspection_hint(), "ping -c 1 -W 2 <host>");
    }
}
