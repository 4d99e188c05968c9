//! The hub's two listening sockets, polled from the main loop.
//!
//! No per-connection threads: the main loop calls [`HubServer::poll`]
//! every iteration, which drains whatever connections are pending and
//! returns. Accepted sockets are serviced to completion with bounded
//! read timeouts, matching the one-request-per-connection HTTP subset.

use std::io::{BufRead, BufReader, ErrorKind};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::time::Duration;

use log::{debug, warn};

use crate::config::SystemConfig;
use crate::hub::http::{Request, Response};
use crate::hub::{ControlContext, HubService};
use crate::ticks::Ticks;

/// Per-connection I/O budget; LAN clients answer well inside this.
const CONN_TIMEOUT: Duration = Duration::from_secs(3);

pub struct HubServer {
    http: TcpListener,
    ingest: TcpListener,
}

impl HubServer {
    /// Bind both listeners on all interfaces at the configured ports.
    pub fn bind(config: &SystemConfig) -> std::io::Result<Self> {
        Self::bind_to(
            ("0.0.0.0", config.hub_http_port),
            ("0.0.0.0", config.ingest_port),
        )
    }

    /// Bind to explicit addresses; tests use port 0 for ephemeral ports.
    pub fn bind_to<A: std::net::ToSocketAddrs>(http: A, ingest: A) -> std::io::Result<Self> {
        let http = TcpListener::bind(http)?;
        let ingest = TcpListener::bind(ingest)?;
        http.set_nonblocking(true)?;
        ingest.set_nonblocking(true)?;
        Ok(Self { http, ingest })
    }

    pub fn http_addr(&self) -> std::io::Result<SocketAddr> {
        self.http.local_addr()
    }

    pub fn ingest_addr(&self) -> std::io::Result<SocketAddr> {
        self.ingest.local_addr()
    }

    /// Drain all pending connections on both sockets.
    pub fn poll(&self, service: &HubService, ctx: &mut ControlContext, now: Ticks) {
        loop {
            match self.http.accept() {
                Ok((stream, peer)) => {
                    debug!("hub: http connection from {}", peer);
                    if let Err(e) = serve_http(stream, service, ctx, now) {
                        warn!("hub: http connection error: {}", e);
                    }
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) => {
                    warn!("hub: http accept error: {}", e);
                    break;
                }
            }
        }

        loop {
            match self.ingest.accept() {
                Ok((stream, peer)) => {
                    debug!("hub: ingest connection from {}", peer);
                    if let Err(e) = serve_ingest(stream, service, ctx, now) {
                        warn!("hub: ingest connection error: {}", e);
                    }
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) => {
                    warn!("hub: ingest accept error: {}", e);
                    break;
                }
            }
        }
    }
}

fn serve_http(
    mut stream: TcpStream,
    service: &HubService,
    ctx: &mut ControlContext,
    now: Ticks,
) -> std::io::Result<()> {
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(CONN_TIMEOUT))?;
    stream.set_write_timeout(Some(CONN_TIMEOUT))?;

    let response = match Request::read_from(&mut stream) {
        Some(req) => service.handle(ctx, &req, now),
        None => Response::bad_request(),
    };
    response.write_to(&mut stream)
}

fn serve_ingest(
    stream: TcpStream,
    service: &HubService,
    ctx: &mut ControlContext,
    now: Ticks,
) -> std::io::Result<()> {
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(CONN_TIMEOUT))?;

    let reader = BufReader::new(stream);
    for line in reader.lines() {
        match line {
            Ok(raw) => service.ingest_line(ctx, &raw, now),
            // Timeout or reset mid-stream: keep what already arrived.
            Err(_) => break,
        }
    }
    Ok(())
}
