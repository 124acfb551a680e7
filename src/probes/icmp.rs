use crate::structures::ProbeResult;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use rand::{rngs::SmallRng, Rng, SeedableRng};
use socket2::{Protocol, SockAddr, Socket, Type};
use std::{
    io::{Read, Result},
    net::{IpAddr, SocketAddrV4, SocketAddrV6},
};
use tokio::io::unix::AsyncFd;
use tokio::time::Instant;
use tracing::{debug, info};

const ECHO_PACKET_LEN: usize = 64;

const ECHO_REQUEST_V4: u8 = 8;
const ECHO_REQUEST_V6: u8 = 128;

/// One echo request to `ip`, waiting for a matching reply.
///
/// Not bounded in time by itself; the caller wraps it in a timeout.
pub(crate) async fn probe(ip: IpAddr) -> ProbeResult {
    let sock = match EchoSocket::new(ip) {
        Ok(s) => s,
        Err(e) => return ProbeResult::Error(format!("open echo socket: {}", e)),
    };
    let dst: SockAddr = match ip {
        IpAddr::V4(ip) => SocketAddrV4::new(ip, 0).into(),
        IpAddr::V6(ip) => SocketAddrV6::new(ip, 0, 0, 0).into(),
    };

    let seq = SmallRng::from_entropy().gen::<u16>();
    if let Err(e) = sock.send_request(seq, ECHO_PACKET_LEN, &dst).await {
        debug!("Send echo request to {} fail, {}", ip, e);
        return ProbeResult::Unreachable;
    }

    let send_at = Instant::now();
    match sock.recv_reply(seq, ECHO_PACKET_LEN).await {
        Ok(()) => ProbeResult::Reachable {
            rtt: send_at.elapsed(),
        },
        Err(e) => {
            debug!("Recv echo reply from {} fail, {}", ip, e);
            ProbeResult::Unreachable
        }
    }
}

pub(crate) struct EchoSocket {
    inner: AsyncFd<Socket>,
    echo_type: u8,
}

impl EchoSocket {
    pub(crate) fn new(ip: IpAddr) -> Result<Self> {
        let (domain, protocol, echo_type) = match ip {
            IpAddr::V4(_) => (
                socket2::Domain::IPV4,
                Some(Protocol::ICMPV4),
                ECHO_REQUEST_V4,
            ),
            IpAddr::V6(_) => (
                socket2::Domain::IPV6,
                Some(Protocol::ICMPV6),
                ECHO_REQUEST_V6,
            ),
        };
        let inner = Socket::new(domain, Type::DGRAM, protocol)?;
        inner.set_nonblocking(true)?;
        let inner = AsyncFd::new(inner)?;
        Ok(Self { inner, echo_type })
    }

    async fn send_to(&self, buf: &[u8], addr: &SockAddr) -> Result<usize> {
        loop {
            let mut guard = self.inner.writable().await?;

            match guard.try_io(|inner| inner.get_ref().send_to(buf, addr)) {
                Ok(s) => return s,
                Err(_) => continue,
            }
        }
    }

    async fn read(&self, buf: &mut [u8]) -> Result<usize> {
        loop {
            let mut guard = self.inner.readable().await?;
            match guard.try_io(|inner| inner.get_ref().read(buf)) {
                Ok(s) => return s,
                Err(_) => continue,
            }
        }
    }

    pub(crate) async fn send_request(&self, seq: u16, len: usize, addr: &SockAddr) -> Result<()> {
        let buf = build_request(self.echo_type, seq, len);
        let result = self.send_to(&buf, addr).await?;
        if result != buf.len() {
            info!("Send packet len:{} less than buf len:{}", result, buf.len());
        }
        Ok(())
    }

    pub(crate) async fn recv_reply(&self, expect_seq: u16, len: usize) -> Result<()> {
        loop {
            let mut buf = BytesMut::with_capacity(len);
            buf.resize(len, 0);
            let reply_len = self.read(&mut buf).await?;
            if reply_len != len {
                info!("Recv packet len:{} less than expect len:{}", reply_len, len);
                continue;
            }
            let buf = buf.freeze();
            let seq = buf.slice(6..8).get_u16();
            if seq == expect_seq {
                return Ok(());
            } else {
                info!("Recv packet seq:{} != expect seq:{}", seq, expect_seq);
                continue;
            }
        }
    }
}

fn build_request(echo_type: u8, seq: u16, len: usize) -> Bytes {
    let mut buf = BytesMut::with_capacity(len);
    // set icmp type and code
    buf.put_u8(echo_type);
    buf.put_u8(0);
    // set icmp check sum and id. linux kernel will handle it, so just put 0.
    buf.put_u16(0);
    buf.put_u16(0);
    // set seq
    buf.put_u16(seq);
    // fill
    buf.resize(len, 1);
    buf.freeze()
}
