use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;

/// Host identifier supplied by the caller, hostname or IP literal.
///
/// Construction never fails; syntax is validated when the target is
/// probed so that malformed input classifies as [`ProbeResult::Error`]
/// instead of panicking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostTarget(String);

impl HostTarget {
    pub fn new(host: impl Into<String>) -> Self {
        Self(host.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.0.is_empty() {
            return Err("invalid host".to_string());
        }
        let ok = self
            .0
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | ':'));
        if !ok {
            return Err(format!("invalid host {:?}", self.0));
        }
        Ok(())
    }
}

impl From<&str> for HostTarget {
    fn from(host: &str) -> Self {
        Self::new(host)
    }
}

impl fmt::Display for HostTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of one probe call.
///
/// `Unreachable` is a remote condition (no reply, refused, unresolvable
/// name). `Error` is a local fault, the probe never made it out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeResult {
    Reachable { rtt: Duration },
    Unreachable,
    Error(String),
}

impl ProbeResult {
    pub fn is_up(&self) -> bool {
        matches!(self, ProbeResult::Reachable { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ProbeResult::Error(_))
    }
}

impl fmt::Display for ProbeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeResult::Reachable { .. } => f.write_str("UP"),
            ProbeResult::Unreachable => f.write_str("DOWN"),
            ProbeResult::Error(reason) => write!(f, "ERROR: {}", reason),
        }
    }
}

/// How the checker reaches the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeMethod {
    Icmp,
    Tcp { port: u16 },
}

#[derive(Debug)]
pub struct ProbeReport {
    pub target: HostTarget,
    pub send_at: DateTime<Utc>,
    pub result: ProbeResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_host_is_invalid() {
        let err = HostTarget::new("").validate().unwrap_err();
        assert_eq!(err, "invalid host");
    }

    #[test]
    fn hostname_and_ip_literals_are_valid() {
        assert!(HostTarget::new("127.0.0.1").validate().is_ok());
        assert!(HostTarget::new("example.com").validate().is_ok());
        assert!(HostTarget::new("::1").validate().is_ok());
    }

    #[test]
    fn whitespace_and_shell_chars_are_invalid() {
        assert!(HostTarget::new("two hosts").validate().is_err());
        assert!(HostTarget::new("host;rm").validate().is_err());
    }

    #[test]
    fn result_display_matches_report_lines() {
        let up = ProbeResult::Reachable {
            rtt: Duration::from_millis(3),
        };
        assert_eq!(up.to_string(), "UP");
        assert_eq!(ProbeResult::Unreachable.to_string(), "DOWN");
        assert!(up.is_up());
        assert!(!ProbeResult::Unreachable.is_up());
    }
}
