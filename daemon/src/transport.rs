//! Per-bandeau UDP sockets and the fire-and-forget datagram send.

use std::collections::BTreeMap;
use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use anyhow::{Context, Result};
use log::{debug, info};
use socket2::{Domain, Protocol, Socket, Type};
use tallybridge::{Screen, TallyState, payload};
use thiserror::Error;
use tokio::net::UdpSocket;

use crate::config::Config;

/// A send that did not reach the network. Never fatal: the protocol has no
/// acknowledgements, and the keepalive loop covers a missed datagram on
/// its next pass.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("bandeau {0} is not configured")]
    UnknownBand(u8),
    #[error("udp send failed: {0}")]
    Io(#[from] io::Error),
}

struct BandeauLink {
    socket: UdpSocket,
    dest: SocketAddr,
}

/// One long-lived socket per bandeau, bound at startup and held until the
/// process exits. All sockets share the fixed source port the panels
/// expect datagrams to come from.
pub struct TallyTransport {
    links: BTreeMap<u8, BandeauLink>,
}

impl TallyTransport {
    /// Bind one socket per configured bandeau. Must run inside the tokio
    /// runtime. Any bind failure aborts startup rather than leaving a
    /// partial registry behind.
    pub fn bind(config: &Config) -> Result<Self> {
        let mut links = BTreeMap::new();
        for bandeau in &config.bandeaux {
            let socket = bind_source_socket(config.udp_source_port).with_context(|| {
                format!(
                    "failed to bind udp source port {} for bandeau {}",
                    config.udp_source_port, bandeau.id
                )
            })?;
            let dest = SocketAddr::from((bandeau.addr, config.udp_dest_port));
            info!(
                "bandeau {} ready, destination {dest}, source port {}",
                bandeau.id, config.udp_source_port
            );
            links.insert(bandeau.id, BandeauLink { socket, dest });
        }
        Ok(TallyTransport { links })
    }

    /// Encode and transmit one tally datagram. One datagram per call, no
    /// batching, no retry.
    pub async fn send(&self, band: u8, screen: Screen, state: TallyState) -> Result<(), SendError> {
        let link = self
            .links
            .get(&band)
            .ok_or(SendError::UnknownBand(band))?;
        let datagram = payload::encode(screen, state);
        link.socket.send_to(&datagram, link.dest).await?;
        debug!("udp {state} -> bandeau {band} screen {screen} ({})", link.dest);
        Ok(())
    }

    pub fn contains(&self, band: u8) -> bool {
        self.links.contains_key(&band)
    }

    /// Configured bandeau ids, ascending.
    pub fn bands(&self) -> impl Iterator<Item = u8> + '_ {
        self.links.keys().copied()
    }
}

/// The panels drop datagrams whose source port is not the one they were
/// paired with, so every bandeau socket binds that same port. SO_REUSEADDR
/// must be set before the bind or every socket after the first fails with
/// "address in use".
fn bind_source_socket(source_port: u16) -> Result<UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    let bind_addr = SocketAddr::from(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, source_port));
    socket.bind(&bind_addr.into())?;
    socket.set_nonblocking(true)?;
    UdpSocket::from_std(socket.into()).context("failed to register socket with the runtime")
}
