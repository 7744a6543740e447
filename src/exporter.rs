use std::{
    io,
    net::{Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket},
};

use crate::{codec::Packet, config::Destination};

/// Hands a finished packet to the collector. Implementations do not buffer
/// or retry: a failed export is reported once and the packet is gone.
pub trait Exporter {
    fn export(&mut self, packet: &Packet, destination: &Destination) -> io::Result<()>;
}

/// Fire-and-forget UDP, one datagram per packet.
#[derive(Debug, Default)]
pub struct UdpExporter {
    socket: Option<UdpSocket>,
}
impl UdpExporter {
    pub fn new() -> Self {
        Self { socket: None }
    }

    fn socket(&mut self, peer: SocketAddr) -> io::Result<&UdpSocket> {
        let reusable = match &self.socket {
            Some(socket) => socket.local_addr()?.is_ipv4() == peer.is_ipv4(),
            None => false,
        };
        let socket = match self.socket.take() {
            Some(socket) if reusable => socket,
            _ => {
                let local = match peer {
                    SocketAddr::V4(_) => SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
                    SocketAddr::V6(_) => SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0)),
                };
                UdpSocket::bind(local)?
            }
        };
        Ok(self.socket.insert(socket))
    }
}
impl Exporter for UdpExporter {
    /// Blocking I/O
    fn export(&mut self, packet: &Packet, destination: &Destination) -> io::Result<()> {
        let peer = (destination.host.as_str(), destination.port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::AddrNotAvailable,
                    format!("{destination} resolved to no address"),
                )
            })?;
        let result = self
            .socket(peer)
            .and_then(|socket| socket.send_to(packet.as_bytes(), peer));
        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                // Re-bind on the next export.
                self.socket = None;
                Err(e)
            }
        }
    }
}

/// Keeps every exported packet in memory.
#[derive(Debug, Default)]
pub struct InMemExporter {
    packets: Vec<(Destination, Packet)>,
    fail_next: Option<io::ErrorKind>,
}
impl InMemExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn packets(&self) -> impl Iterator<Item = &Packet> + '_ {
        self.packets.iter().map(|(_, packet)| packet)
    }
    pub fn last(&self) -> Option<&Packet> {
        self.packets().last()
    }
    pub fn destinations(&self) -> impl Iterator<Item = &Destination> + '_ {
        self.packets.iter().map(|(destination, _)| destination)
    }
    pub fn clear(&mut self) {
        self.packets.clear();
    }

    /// Makes the next export fail with `kind` without recording the packet.
    pub fn fail_next(&mut self, kind: io::ErrorKind) {
        self.fail_next = Some(kind);
    }
}
impl Exporter for InMemExporter {
    fn export(&mut self, packet: &Packet, destination: &Destination) -> io::Result<()> {
        if let Some(kind) = self.fail_next.take() {
            return Err(io::Error::new(kind, "injected export failure"));
        }
        self.packets.push((destination.clone(), packet.clone()));
        Ok(())
    }
}
