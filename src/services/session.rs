//! One blocking request/response exchange with an NTP server.

use std::io;
use std::net::{SocketAddr, SocketAddrV4};
use std::time::{Duration, Instant};

use tracing::{debug, instrument};

use crate::adapters::resolver::resolve_ipv4;
use crate::adapters::{
    Clock, Connector, Resolver, SystemClock, SystemResolver, Transport, UdpConnector,
};
use crate::error::{NtpError, Result};
use crate::ntp::timestamp::to_ntp_time;
use crate::ntp::{ExchangeResult, Packet};

pub const DEFAULT_PORT: u16 = 123;
pub const DEFAULT_VERSION: u8 = 2;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

const SUPPORTED_VERSIONS: std::ops::RangeInclusive<u8> = 2..=4;

/// Stateless NTP client.
///
/// Every call to [`NtpClient::request`] opens its own transport and drops it
/// before returning, so one client can be shared freely between threads as
/// long as its collaborators are `Sync`.
#[derive(Clone, Debug, Default)]
pub struct NtpClient<R = SystemResolver, C = UdpConnector, K = SystemClock> {
    resolver: R,
    connector: C,
    clock: K,
}

impl NtpClient {
    /// Client using the system resolver, a UDP socket and the system clock.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<R, C, K> NtpClient<R, C, K>
where
    R: Resolver,
    C: Connector,
    K: Clock,
{
    pub fn with_parts(resolver: R, connector: C, clock: K) -> Self {
        NtpClient {
            resolver,
            connector,
            clock,
        }
    }

    /// Resolve `host` and run one exchange against it.
    ///
    /// The call blocks for at most `timeout` on the send and on the receive.
    /// Nothing is retried.
    #[instrument(level = "debug", skip(self, timeout))]
    pub fn request(
        &self,
        host: &str,
        version: u8,
        port: u16,
        timeout: Duration,
    ) -> Result<ExchangeResult> {
        check_version(version)?;
        let ip = resolve_ipv4(&self.resolver, host)?;
        self.request_peer(host, SocketAddrV4::new(ip, port), version, timeout)
    }

    /// Run one exchange against an already resolved address. `host` only
    /// labels errors.
    pub fn request_peer(
        &self,
        host: &str,
        peer: SocketAddrV4,
        version: u8,
        timeout: Duration,
    ) -> Result<ExchangeResult> {
        check_version(version)?;
        let peer = SocketAddr::V4(peer);
        let transport_error = |source: io::Error| NtpError::Transport {
            host: host.to_string(),
            source,
        };

        let request = Packet::client_request(version, to_ntp_time(self.clock.now()));
        let buf = request.to_bytes()?;

        let mut transport = self.connector.connect(peer).map_err(transport_error)?;
        transport.send(&buf, timeout).map_err(transport_error)?;
        debug!(%peer, version, "request sent");

        let (response, dest_timestamp) = self
            .await_response(&mut transport, peer, timeout)
            .map_err(transport_error)?;
        drop(transport);
        debug!(%peer, len = response.len(), "response received");

        let packet = Packet::from_bytes(&response)?;
        Ok(ExchangeResult::new(packet, dest_timestamp))
    }

    /// Receive until a datagram from `peer` arrives. The destination
    /// timestamp is read as soon as the receive call returns.
    fn await_response(
        &self,
        transport: &mut C::Transport,
        peer: SocketAddr,
        timeout: Duration,
    ) -> io::Result<(Vec<u8>, f64)> {
        // No deadline when the timeout does not fit an Instant; every
        // receive then gets the full timeout.
        let deadline = Instant::now().checked_add(timeout);
        loop {
            let remaining = match deadline {
                Some(deadline) => deadline.saturating_duration_since(Instant::now()),
                None => timeout,
            };
            if remaining.is_zero() {
                return Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    "no response before timeout",
                ));
            }
            let (buf, from) = transport.receive(remaining)?;
            let dest_timestamp = to_ntp_time(self.clock.now());
            if from.ip() == peer.ip() {
                return Ok((buf, dest_timestamp));
            }
            debug!(%from, "ignoring datagram from unexpected source");
        }
    }
}

fn check_version(version: u8) -> Result<()> {
    if !SUPPORTED_VERSIONS.contains(&version) {
        return Err(NtpError::Encoding(format!(
            "unsupported NTP version {version}, expected 2, 3 or 4"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ntp::timestamp::NTP_EPOCH_DELTA;
    use crate::ntp::{MODE_CLIENT, MODE_SERVER};
    use std::collections::VecDeque;
    use std::net::{IpAddr, Ipv4Addr};
    use std::sync::{Arc, Mutex};

    const SERVER: Ipv4Addr = Ipv4Addr::new(192, 0, 2, 1);

    struct StaticResolver(Vec<IpAddr>);

    impl Resolver for StaticResolver {
        fn resolve(&self, _host: &str) -> io::Result<Vec<IpAddr>> {
            Ok(self.0.clone())
        }
    }

    /// Clock returning scripted values in order, repeating the last one.
    struct ScriptedClock(Mutex<VecDeque<f64>>);

    impl ScriptedClock {
        fn new(values: &[f64]) -> Self {
            ScriptedClock(Mutex::new(values.iter().copied().collect()))
        }
    }

    impl Clock for ScriptedClock {
        fn now(&self) -> f64 {
            let mut q = self.0.lock().unwrap();
            if q.len() > 1 {
                q.pop_front().unwrap()
            } else {
                q[0]
            }
        }
    }

    #[derive(Default)]
    struct Shared {
        sent: Vec<Vec<u8>>,
        peer: Option<SocketAddr>,
        receive_timeouts: Vec<Duration>,
        dropped: bool,
    }

    struct FakeConnector {
        shared: Arc<Mutex<Shared>>,
        replies: Mutex<VecDeque<io::Result<(Vec<u8>, SocketAddr)>>>,
    }

    impl FakeConnector {
        fn new(replies: Vec<io::Result<(Vec<u8>, SocketAddr)>>) -> Self {
            FakeConnector {
                shared: Arc::default(),
                replies: Mutex::new(replies.into()),
            }
        }
    }

    struct FakeTransport {
        shared: Arc<Mutex<Shared>>,
        replies: VecDeque<io::Result<(Vec<u8>, SocketAddr)>>,
    }

    impl Connector for FakeConnector {
        type Transport = FakeTransport;

        fn connect(&self, peer: SocketAddr) -> io::Result<FakeTransport> {
            self.shared.lock().unwrap().peer = Some(peer);
            let replies = std::mem::take(&mut *self.replies.lock().unwrap());
            Ok(FakeTransport {
                shared: self.shared.clone(),
                replies,
            })
        }
    }

    impl Transport for FakeTransport {
        fn send(&mut self, buf: &[u8], _timeout: Duration) -> io::Result<()> {
            self.shared.lock().unwrap().sent.push(buf.to_vec());
            Ok(())
        }

        fn receive(&mut self, timeout: Duration) -> io::Result<(Vec<u8>, SocketAddr)> {
            self.shared.lock().unwrap().receive_timeouts.push(timeout);
            self.replies
                .pop_front()
                .unwrap_or_else(|| Err(io::Error::new(io::ErrorKind::WouldBlock, "timed out")))
        }
    }

    impl Drop for FakeTransport {
        fn drop(&mut self) {
            self.shared.lock().unwrap().dropped = true;
        }
    }

    fn server_addr() -> SocketAddr {
        SocketAddr::from((SERVER, DEFAULT_PORT))
    }

    fn server_reply(origin: f64) -> Vec<u8> {
        Packet {
            version: 3,
            mode: MODE_SERVER,
            stratum: 2,
            ref_id: u32::from_be_bytes([10, 1, 1, 1]),
            orig_timestamp: origin,
            recv_timestamp: origin + 2.0,
            tx_timestamp: origin + 2.5,
            ..Packet::default()
        }
        .to_bytes()
        .unwrap()
        .to_vec()
    }

    fn client(
        connector: FakeConnector,
        clock: &[f64],
    ) -> NtpClient<StaticResolver, FakeConnector, ScriptedClock> {
        NtpClient::with_parts(
            StaticResolver(vec![IpAddr::V4(SERVER)]),
            connector,
            ScriptedClock::new(clock),
        )
    }

    #[test]
    fn request_builds_client_packet_and_computes_statistics() {
        let origin = NTP_EPOCH_DELTA + 1000.0;
        let connector = FakeConnector::new(vec![Ok((server_reply(origin), server_addr()))]);
        let shared = connector.shared.clone();
        let client = client(connector, &[1000.0, 1003.0]);

        let result = client
            .request("ntp.example", 3, DEFAULT_PORT, DEFAULT_TIMEOUT)
            .unwrap();

        assert_eq!(result.offset(), 0.75);
        assert_eq!(result.delay(), 2.5);
        assert_eq!(result.dest_time(), 1003.0);
        assert_eq!(result.stratum(), 2);

        let shared = shared.lock().unwrap();
        assert_eq!(shared.peer, Some(server_addr()));
        assert!(shared.dropped);
        let sent = Packet::from_bytes(&shared.sent[0]).unwrap();
        assert_eq!(sent.mode, MODE_CLIENT);
        assert_eq!(sent.version, 3);
        assert_eq!(sent.tx_timestamp, origin);
        assert_eq!(sent.stratum, 0);
        assert_eq!(sent.orig_timestamp, 0.0);
    }

    #[test]
    fn datagrams_from_other_hosts_are_ignored() {
        let origin = NTP_EPOCH_DELTA + 1000.0;
        let stranger = SocketAddr::from((Ipv4Addr::new(198, 51, 100, 9), DEFAULT_PORT));
        let connector = FakeConnector::new(vec![
            Ok((vec![0u8; 3], stranger)),
            Ok((server_reply(origin), server_addr())),
        ]);
        let client = client(connector, &[1000.0, 1001.0, 1003.0]);

        let result = client
            .request("ntp.example", 4, DEFAULT_PORT, DEFAULT_TIMEOUT)
            .unwrap();
        assert_eq!(result.dest_time(), 1003.0);
    }

    #[test]
    fn unbounded_timeout_waits_without_deadline() {
        let origin = NTP_EPOCH_DELTA + 1000.0;
        let stranger = SocketAddr::from((Ipv4Addr::new(198, 51, 100, 9), DEFAULT_PORT));
        let connector = FakeConnector::new(vec![
            Ok((vec![0u8; 3], stranger)),
            Ok((server_reply(origin), server_addr())),
        ]);
        let shared = connector.shared.clone();
        let client = client(connector, &[1000.0, 1001.0, 1003.0]);

        let result = client
            .request("ntp.example", 3, DEFAULT_PORT, Duration::MAX)
            .unwrap();
        assert_eq!(result.delay(), 2.5);

        let shared = shared.lock().unwrap();
        assert_eq!(shared.receive_timeouts, vec![Duration::MAX, Duration::MAX]);
        assert!(shared.dropped);
    }

    #[test]
    fn unbounded_timeout_still_reports_transport_errors() {
        let connector = FakeConnector::new(vec![]);
        let client = client(connector, &[1000.0]);

        let err = client
            .request("slow.example", 3, DEFAULT_PORT, Duration::MAX)
            .unwrap_err();
        assert!(err.is_timeout());
    }

    #[test]
    fn timeout_is_a_transport_error_with_host() {
        let connector = FakeConnector::new(vec![]);
        let shared = connector.shared.clone();
        let client = client(connector, &[1000.0]);

        let err = client
            .request("slow.example", 3, DEFAULT_PORT, Duration::from_millis(10))
            .unwrap_err();
        assert!(err.is_timeout());
        assert!(matches!(err, NtpError::Transport { ref host, .. } if host == "slow.example"));
        assert!(shared.lock().unwrap().dropped);
    }

    #[test]
    fn short_response_is_a_decoding_error() {
        let connector = FakeConnector::new(vec![Ok((vec![0u8; 47], server_addr()))]);
        let shared = connector.shared.clone();
        let client = client(connector, &[1000.0]);

        let err = client
            .request("ntp.example", 3, DEFAULT_PORT, DEFAULT_TIMEOUT)
            .unwrap_err();
        assert!(matches!(err, NtpError::Decoding(_)));
        assert!(shared.lock().unwrap().dropped);
    }

    #[test]
    fn unresolvable_host_never_opens_a_socket() {
        let connector = FakeConnector::new(vec![]);
        let shared = connector.shared.clone();
        let client = NtpClient::with_parts(
            StaticResolver(vec![]),
            connector,
            ScriptedClock::new(&[0.0]),
        );
        let err = client
            .request("nowhere.example", 3, DEFAULT_PORT, DEFAULT_TIMEOUT)
            .unwrap_err();
        assert!(matches!(err, NtpError::Resolution { .. }));
        assert!(shared.lock().unwrap().peer.is_none());
    }

    #[test]
    fn rejects_unsupported_versions() {
        let client = client(FakeConnector::new(vec![]), &[1000.0]);
        for version in [0, 1, 5, 8] {
            assert!(matches!(
                client.request("ntp.example", version, DEFAULT_PORT, DEFAULT_TIMEOUT),
                Err(NtpError::Encoding(_))
            ));
        }
    }
}
