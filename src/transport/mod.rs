//! Telemetry delivery from the node to the hub.
//!
//! Two wire shapes share one delivery policy:
//! - [`line`]: newline-framed CSV pushed to the raw ingest socket
//! - [`signed`]: token-and-signature JSON POST to the hub's HTTP port
//!
//! Delivery resolves the hub by service name and, when that connect
//! fails, falls back once to a fixed secondary address. Every socket
//! operation is timeout-bounded; a failed delivery is logged and
//! reported, never propagated as fatal; the acquisition cycle must
//! keep its cadence regardless of the network.

pub mod line;
pub mod signed;

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use log::{debug, warn};

use crate::config::SystemConfig;
use crate::error::TransportError;
use crate::frame::SensorFrame;

/// Outcome of one delivery attempt. Failures carry the reason but are
/// not process errors; the caller moves on either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryResult {
    Delivered,
    Failed(TransportError),
}

impl DeliveryResult {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }
}

pub struct Telemetry {
    hub_host: String,
    hub_http_port: u16,
    ingest_port: u16,
    fallback_addr: String,
    api_token: String,
    response_timeout: Duration,
}

impl Telemetry {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            hub_host: config.hub_host.clone(),
            hub_http_port: config.hub_http_port,
            ingest_port: config.ingest_port,
            fallback_addr: config.fallback_addr.clone(),
            api_token: config.api_token.clone(),
            response_timeout: Duration::from_millis(u64::from(config.response_timeout_ms)),
        }
    }

    /// POST one frame as a signed JSON update and await the response.
    pub fn send(&self, frame: &SensorFrame) -> DeliveryResult {
        let body = match serde_json::to_string(&signed::UpdateBody::from_frame(frame)) {
            Ok(b) => b,
            Err(e) => {
                warn!("telemetry: body serialization failed: {}", e);
                return DeliveryResult::Failed(TransportError::BadResponse);
            }
        };
        let request = signed::build_update_request(&self.hub_host, &self.api_token, &body);

        let mut stream = match self.connect(self.hub_http_port) {
            Ok(s) => s,
            Err(e) => return DeliveryResult::Failed(e),
        };

        if stream.write_all(request.as_bytes()).is_err() {
            warn!("telemetry: request write failed");
            return DeliveryResult::Failed(TransportError::ConnectFailed);
        }

        let mut response = String::new();
        match stream.read_to_string(&mut response) {
            Ok(_) if response.starts_with("HTTP/1.1 200") => {
                debug!("telemetry: frame ts={} delivered", frame.timestamp);
                DeliveryResult::Delivered
            }
            Ok(_) => {
                warn!(
                    "telemetry: hub rejected frame: {}",
                    response.lines().next().unwrap_or("<empty>")
                );
                DeliveryResult::Failed(TransportError::BadResponse)
            }
            Err(_) => {
                warn!("telemetry: no response within {:?}", self.response_timeout);
                DeliveryResult::Failed(TransportError::ResponseTimeout)
            }
        }
    }

    /// Push one frame as a CSV line to the raw ingest socket.
    /// Fire-and-forget: no response is read on this channel.
    pub fn send_line(&self, frame: &SensorFrame) -> DeliveryResult {
        let wire = line::format_line(frame);
        let mut stream = match self.connect(self.ingest_port) {
            Ok(s) => s,
            Err(e) => return DeliveryResult::Failed(e),
        };
        match stream.write_all(wire.as_bytes()) {
            Ok(()) => DeliveryResult::Delivered,
            Err(_) => {
                warn!("telemetry: line write failed");
                DeliveryResult::Failed(TransportError::ConnectFailed)
            }
        }
    }

    /// Primary-then-fallback connect with bounded timeouts on every step.
    fn connect(&self, port: u16) -> Result<TcpStream, TransportError> {
        if let Some(stream) = self.try_connect(&self.hub_host, port) {
            return Ok(stream);
        }
        warn!(
            "telemetry: primary {}:{} unreachable, trying fallback {}",
            self.hub_host, port, self.fallback_addr
        );
        self.try_connect(&self.fallback_addr, port)
            .ok_or(TransportError::ConnectFailed)
    }

    fn try_connect(&self, host: &str, port: u16) -> Option<TcpStream> {
        let addrs: Vec<SocketAddr> = (host, port).to_socket_addrs().ok()?.collect();
        for addr in addrs {
            if let Ok(stream) = TcpStream::connect_timeout(&addr, self.response_timeout) {
                // Bound the response wait; read_to_string errors out on expiry.
                let _ = stream.set_read_timeout(Some(self.response_timeout));
                let _ = stream.set_write_timeout(Some(self.response_timeout));
                return Some(stream);
            }
        }
        None
    }
}
