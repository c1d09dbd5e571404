//! Host-tuned read timeouts (spec.md §4.3, §6 `*_READ_TIMEOUT`).

use std::collections::HashMap;
use std::time::Duration;

use url::Url;

/// Hosts known to need a longer read timeout than the default, paired with
/// the env var that overrides them (spec.md §6, documentation/testing
/// entry). Passed to [`HostTimeouts::from_env`] at startup.
pub const KNOWN_SLOW_HOSTS: &[(&str, &str)] = &[("slow.example", "SLOW_HOST_READ_TIMEOUT")];

/// A lookup table of per-host read timeouts, falling back to a default.
#[derive(Clone, Debug)]
pub struct HostTimeouts {
    default: Duration,
    overrides: HashMap<String, Duration>,
}

impl HostTimeouts {
    pub fn new(default: Duration) -> Self {
        Self {
            default,
            overrides: HashMap::new(),
        }
    }

    /// Build from `(host, env_var)` pairs, reading each env var as seconds.
    /// Unset or unparsable entries are skipped, leaving the default in
    /// effect for that host.
    pub fn from_env(default: Duration, hosts: &[(&str, &str)]) -> Self {
        let mut table = Self::new(default);
        for (host, env_var) in hosts {
            if let Ok(secs) = std::env::var(env_var) {
                if let Ok(secs) = secs.parse::<u64>() {
                    table.overrides.insert((*host).to_string(), Duration::from_secs(secs));
                }
            }
        }
        table
    }

    pub fn set(&mut self, host: impl Into<String>, timeout: Duration) {
        self.overrides.insert(host.into(), timeout);
    }

    /// Resolve the read timeout to use for a URL, falling back to the
    /// default when the host has no entry or the URL doesn't parse.
    pub fn for_url(&self, url: &str) -> Duration {
        Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .and_then(|host| self.overrides.get(&host).copied())
            .unwrap_or(self.default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_default_for_unknown_host() {
        let table = HostTimeouts::new(Duration::from_secs(40));
        assert_eq!(table.for_url("https://unknown.example/x"), Duration::from_secs(40));
    }

    #[test]
    fn honours_a_known_slow_host_override() {
        let mut table = HostTimeouts::new(Duration::from_secs(40));
        table.set("slow.example", Duration::from_secs(80));
        assert_eq!(table.for_url("https://slow.example/x"), Duration::from_secs(80));
        assert_eq!(table.for_url("https://other.example/x"), Duration::from_secs(40));
    }

    #[test]
    fn malformed_url_uses_default() {
        let table = HostTimeouts::new(Duration::from_secs(40));
        assert_eq!(table.for_url("not a url"), Duration::from_secs(40));
    }
}
