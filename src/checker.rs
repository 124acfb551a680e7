use crate::probes::{icmp, tcp};
use crate::structures::{HostTarget, ProbeMethod, ProbeReport, ProbeResult};
use chrono::Utc;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::net::lookup_host;
use tokio::time;
use tracing::debug;

/// Stateless reachability checker. One probe per call, no retries;
/// cadence and retry policy belong to the caller.
#[derive(Debug, Clone, Copy)]
pub struct LivenessChecker {
    method: ProbeMethod,
}

impl LivenessChecker {
    pub fn new(method: ProbeMethod) -> Self {
        Self { method }
    }

    pub fn icmp() -> Self {
        Self::new(ProbeMethod::Icmp)
    }

    pub fn tcp(port: u16) -> Self {
        Self::new(ProbeMethod::Tcp { port })
    }

    /// Issues exactly one probe to `target`, waiting up to `timeout`.
    ///
    /// Name resolution, dispatch and the wait for a reply all run under
    /// the same timeout, so the call always returns within `timeout`
    /// plus scheduling overhead. The probe socket lives only for the
    /// duration of the call.
    pub async fn check(&self, target: &HostTarget, timeout: Duration) -> ProbeResult {
        if let Err(reason) = target.validate() {
            return ProbeResult::Error(reason);
        }
        if timeout.is_zero() {
            return ProbeResult::Error("timeout must be positive".to_string());
        }

        match time::timeout(timeout, self.probe(target)).await {
            Ok(result) => result,
            Err(_) => ProbeResult::Unreachable,
        }
    }

    /// [`check`](Self::check) plus the send timestamp, for reporting.
    pub async fn run(&self, target: HostTarget, timeout: Duration) -> ProbeReport {
        let send_at = Utc::now();
        let result = self.check(&target, timeout).await;
        ProbeReport {
            target,
            send_at,
            result,
        }
    }

    async fn probe(&self, target: &HostTarget) -> ProbeResult {
        let ip = match resolve(target.as_str()).await {
            Some(ip) => ip,
            None => return ProbeResult::Unreachable,
        };

        match self.method {
            ProbeMethod::Icmp => icmp::probe(ip).await,
            ProbeMethod::Tcp { port } => tcp::probe(SocketAddr::new(ip, port)).await,
        }
    }
}

async fn resolve(host: &str) -> Option<IpAddr> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Some(ip);
    }

    match lookup_host((host, 0u16)).await {
        Ok(mut addrs) => addrs.next().map(|a| a.ip()),
        Err(e) => {
            debug!("Resolve {} fail, {}", host, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;
    use tokio::time::Instant;

    const TIMEOUT: Duration = Duration::from_secs(1);

    async fn local_listener() -> (TcpListener, u16) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        (listener, port)
    }

    #[tokio::test]
    async fn loopback_listener_is_reachable() {
        let (_listener, port) = local_listener().await;
        let checker = LivenessChecker::tcp(port);
        let result = checker.check(&HostTarget::new("127.0.0.1"), TIMEOUT).await;
        assert!(result.is_up());
    }

    #[tokio::test]
    async fn refused_connect_is_unreachable() {
        let (listener, port) = local_listener().await;
        drop(listener);
        let checker = LivenessChecker::tcp(port);
        let result = checker.check(&HostTarget::new("127.0.0.1"), TIMEOUT).await;
        assert_eq!(result, ProbeResult::Unreachable);
    }

    #[tokio::test]
    async fn test_net_address_is_unreachable_within_timeout() {
        let timeout = Duration::from_millis(200);
        let checker = LivenessChecker::tcp(9);
        let start = Instant::now();
        let result = checker
            .check(&HostTarget::new("203.0.113.255"), timeout)
            .await;
        assert_eq!(result, ProbeResult::Unreachable);
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn unresolvable_name_is_unreachable() {
        let checker = LivenessChecker::tcp(80);
        let result = checker.check(&HostTarget::new("host.invalid"), TIMEOUT).await;
        assert_eq!(result, ProbeResult::Unreachable);
    }

    #[tokio::test]
    async fn empty_host_is_an_error() {
        let checker = LivenessChecker::tcp(80);
        let result = checker.check(&HostTarget::new(""), TIMEOUT).await;
        assert_eq!(result, ProbeResult::Error("invalid host".to_string()));
    }

    #[tokio::test]
    async fn malformed_host_is_an_error_not_a_panic() {
        let checker = LivenessChecker::icmp();
        let result = checker.check(&HostTarget::new("not a host"), TIMEOUT).await;
        assert!(result.is_error());
    }

    #[tokio::test]
    async fn zero_timeout_is_an_error() {
        let checker = LivenessChecker::tcp(80);
        let result = checker
            .check(&HostTarget::new("127.0.0.1"), Duration::ZERO)
            .await;
        assert!(result.is_error());
    }

    #[tokio::test]
    async fn classification_is_idempotent() {
        let (_listener, port) = local_listener().await;
        let checker = LivenessChecker::tcp(port);
        let target = HostTarget::new("127.0.0.1");
        let first = checker.check(&target, TIMEOUT).await;
        let second = checker.check(&target, TIMEOUT).await;
        assert!(first.is_up());
        assert!(second.is_up());
    }

    #[tokio::test]
    async fn report_carries_target_and_timestamp() {
        let (_listener, port) = local_listener().await;
        let checker = LivenessChecker::tcp(port);
        let report = checker.run(HostTarget::new("127.0.0.1"), TIMEOUT).await;
        assert_eq!(report.target.as_str(), "127.0.0.1");
        assert!(report.result.is_up());
    }
}
