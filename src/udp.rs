use log::debug;
use std::{
    io,
    net::{Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SendError {
    #[error("refusing to send an empty datagram")]
    EmptyPayload,
    #[error("failed to open udp socket")]
    Socket(#[source] io::Error),
    #[error("send to {dst} failed")]
    Io {
        dst: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error("partial send: {sent} of {len} bytes")]
    Partial { sent: usize, len: usize },
}

/// Fire-and-forget datagram delivery.
pub trait Transport {
    /// Sends `payload` as one datagram, returning the number of bytes handed
    /// to the network stack.
    fn send_to(&mut self, payload: &[u8], dst: SocketAddr) -> Result<usize, SendError>;
}

/// Sends datagrams from a single unconnected, non-blocking socket bound to an
/// ephemeral port.
///
/// The socket is opened by the first send and reused afterwards. Any failed
/// send closes it and the next send opens a fresh one, so a sender never holds
/// more than one socket. Dropping the sender closes it.
#[derive(Debug, Default)]
pub struct UdpSender {
    socket: Option<UdpSocket>,
}

impl UdpSender {
    pub fn new() -> UdpSender {
        UdpSender { socket: None }
    }

    pub fn is_open(&self) -> bool {
        self.socket.is_some()
    }

    fn open(dst: SocketAddr) -> io::Result<UdpSocket> {
        // 0 is random port
        let src = match dst {
            SocketAddr::V4(_) => SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
            SocketAddr::V6(_) => SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0)),
        };

        let socket = UdpSocket::bind(src)?;
        socket.set_nonblocking(true)?;
        debug!("opened udp socket on {}", socket.local_addr()?);

        Ok(socket)
    }
}

impl Transport for UdpSender {
    fn send_to(&mut self, payload: &[u8], dst: SocketAddr) -> Result<usize, SendError> {
        if payload.is_empty() {
            return Err(SendError::EmptyPayload);
        }

        let socket = match self.socket.take() {
            Some(socket) => socket,
            None => Self::open(dst).map_err(SendError::Socket)?,
        };

        // On error the socket is dropped here instead of being put back.
        let sent = socket
            .send_to(payload, dst)
            .map_err(|source| SendError::Io { dst, source })?;
        if sent != payload.len() {
            return Err(SendError::Partial {
                sent,
                len: payload.len(),
            });
        }

        self.socket = Some(socket);
        Ok(sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    fn listener() -> UdpSocket {
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        socket
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        socket
    }

    #[test]
    fn test_datagram_arrives_intact() {
        let receiver = listener();
        let dst = receiver.local_addr().unwrap();
        let mut sender = UdpSender::new();

        let sent = sender.send_to(b"{\"v\": 1}", dst).unwrap();
        assert_eq!(sent, 8);

        let mut buf = [0u8; 64];
        let (len, _) = receiver.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..len], b"{\"v\": 1}");
    }

    #[test]
    fn test_socket_is_reused() {
        let receiver = listener();
        let dst = receiver.local_addr().unwrap();
        let mut sender = UdpSender::new();
        assert!(!sender.is_open());

        let mut buf = [0u8; 16];
        sender.send_to(b"one", dst).unwrap();
        let (_, first_src) = receiver.recv_from(&mut buf).unwrap();
        sender.send_to(b"two", dst).unwrap();
        let (_, second_src) = receiver.recv_from(&mut buf).unwrap();

        assert!(sender.is_open());
        assert_eq!(first_src.port(), second_src.port());
    }

    #[test]
    fn test_empty_payload_rejected() {
        let mut sender = UdpSender::new();
        let dst: SocketAddr = "127.0.0.1:6666".parse().unwrap();

        match sender.send_to(&[], dst) {
            Err(SendError::EmptyPayload) => {}
            other => panic!("expected empty payload error, got {:?}", other),
        }
        assert!(!sender.is_open());
    }

    #[test]
    fn test_oversized_datagram_closes_socket() {
        let receiver = listener();
        let dst = receiver.local_addr().unwrap();
        let mut sender = UdpSender::new();

        sender.send_to(b"warm up", dst).unwrap();
        assert!(sender.is_open());

        // Larger than the maximum UDP payload.
        let payload = vec![b'x'; 70_000];
        assert!(sender.send_to(&payload, dst).is_err());
        assert!(!sender.is_open());

        sender.send_to(b"again", dst).unwrap();
        assert!(sender.is_open());
    }
}
