use super::{ActuatorLink, Command, LinkConfig, SendOutcome};
use crate::error::LinkError;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use tracing::{info, warn};

/// Sends each command as a single unacknowledged datagram.
pub struct UdpLink {
    socket: UdpSocket,
    target: SocketAddr,
    config: LinkConfig,
}

impl UdpLink {
    /// Resolve the endpoint and bind an ephemeral local socket.
    pub fn connect(config: LinkConfig) -> Result<Self, LinkError> {
        let target = (config.host.as_str(), config.port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| LinkError::Unresolved {
                host: config.host.clone(),
                port: config.port,
            })?;

        let bind_addr: SocketAddr = if target.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            (std::net::Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(bind_addr)?;
        socket.set_write_timeout(Some(config.timeout()))?;

        info!(%target, "actuator link ready");
        Ok(Self {
            socket,
            target,
            config,
        })
    }
}

impl ActuatorLink for UdpLink {
    fn send(&mut self, command: Command) -> SendOutcome {
        let literal = self.config.literal(command);
        match self.socket.send_to(literal.as_bytes(), self.target) {
            Ok(_) => {
                info!(command = literal, target = %self.target, "sent");
                SendOutcome::Unconfirmed
            }
            Err(err) => {
                warn!(command = literal, target = %self.target, error = %err, "failed to send");
                SendOutcome::Failed
            }
        }
    }
}
