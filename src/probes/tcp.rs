use crate::structures::ProbeResult;
use std::net::SocketAddr;
use tokio::net::TcpStream;
use tokio::time::Instant;
use tracing::debug;

/// One connect attempt to `addr`.
///
/// A completed handshake proves the host answers; a refused or
/// otherwise failed connect is a remote condition, not a local fault.
/// The caller bounds the attempt with a timeout.
pub(crate) async fn probe(addr: SocketAddr) -> ProbeResult {
    let send_at = Instant::now();
    match TcpStream::connect(addr).await {
        Ok(_) => ProbeResult::Reachable {
            rtt: send_at.elapsed(),
        },
        Err(e) => {
            debug!("Connect {} fail, {}", addr, e);
            ProbeResult::Unreachable
        }
    }
}
