//! Datagram transport used by the client session.

use std::io;
use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::time::Duration;

/// Large enough for a header with extension fields; anything longer is
/// truncated and then rejected by the decoder.
const RECV_BUFFER_SIZE: usize = 1024;

/// One connected datagram channel. Dropping it releases the socket.
pub trait Transport {
    fn send(&mut self, buf: &[u8], timeout: Duration) -> io::Result<()>;

    /// Block until a datagram arrives or `timeout` elapses.
    fn receive(&mut self, timeout: Duration) -> io::Result<(Vec<u8>, SocketAddr)>;
}

/// Opens a fresh [`Transport`] for each exchange.
pub trait Connector {
    type Transport: Transport;

    fn connect(&self, peer: SocketAddr) -> io::Result<Self::Transport>;
}

/// Connector producing [`UdpTransport`]s bound to an ephemeral IPv4 port.
#[derive(Clone, Copy, Debug, Default)]
pub struct UdpConnector;

impl Connector for UdpConnector {
    type Transport = UdpTransport;

    fn connect(&self, peer: SocketAddr) -> io::Result<UdpTransport> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
        Ok(UdpTransport { socket, peer })
    }
}

#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    peer: SocketAddr,
}

impl UdpTransport {
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

impl Transport for UdpTransport {
    fn send(&mut self, buf: &[u8], timeout: Duration) -> io::Result<()> {
        self.socket.set_write_timeout(Some(timeout))?;
        let sent = self.socket.send_to(buf, self.peer)?;
        if sent != buf.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short send: {sent} of {} bytes", buf.len()),
            ));
        }
        Ok(())
    }

    fn receive(&mut self, timeout: Duration) -> io::Result<(Vec<u8>, SocketAddr)> {
        self.socket.set_read_timeout(Some(timeout))?;
        let mut buf = [0u8; RECV_BUFFER_SIZE];
        let (len, from) = self.socket.recv_from(&mut buf)?;
        Ok((buf[..len].to_vec(), from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn udp_transport_round_trip_on_loopback() {
        let server = UdpSocket::bind("127.0.0.1:0").unwrap();
        let server_addr = server.local_addr().unwrap();

        let mut transport = UdpConnector.connect(server_addr).unwrap();
        transport.send(b"ping", Duration::from_secs(1)).unwrap();

        let mut buf = [0u8; 16];
        let (len, client) = server.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..len], b"ping");
        server.send_to(b"pong", client).unwrap();

        let (reply, from) = transport.receive(Duration::from_secs(1)).unwrap();
        assert_eq!(reply, b"pong");
        assert_eq!(from, server_addr);
    }

    #[test]
    fn receive_times_out() {
        let server = UdpSocket::bind("127.0.0.1:0").unwrap();
        let mut transport = UdpConnector.connect(server.local_addr().unwrap()).unwrap();
        let err = transport.receive(Duration::from_millis(50)).unwrap_err();
        assert!(matches!(
            err.kind(),
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
        ));
    }
}
