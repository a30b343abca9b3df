use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::handler;
use crate::http::{self, Response, StatusCode};
use crate::logger::Logger;

pub const READ_TIMEOUT_MS: u64 = 5000;
pub const WRITE_TIMEOUT_MS: u64 = 5000;
const ACCEPT_POLL_MS: u64 = 50;
const LISTEN_BACKLOG: i32 = 128;

#[derive(Debug, Default)]
pub struct ServerStats {
    pub requests: AtomicU64,
    pub successes: AtomicU64,
    pub client_errors: AtomicU64,
    pub server_errors: AtomicU64,
    pub dropped_connections: AtomicU64,
}

impl ServerStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, status: StatusCode) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        let counter = if status.is_server_error() {
            &self.server_errors
        } else if status.is_client_error() {
            &self.client_errors
        } else {
            &self.successes
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn summary(&self) -> String {
        format!(
            "{} requests: {} ok, {} client errors, {} server errors, {} dropped",
            self.requests.load(Ordering::Relaxed),
            self.successes.load(Ordering::Relaxed),
            self.client_errors.load(Ordering::Relaxed),
            self.server_errors.load(Ordering::Relaxed),
            self.dropped_connections.load(Ordering::Relaxed),
        )
    }
}

/// Non-blocking listener with address reuse, so the accept loop can poll
/// the shutdown flag and restarts do not trip over `TIME_WAIT`.
pub fn create_listener(addr: SocketAddr) -> io::Result<TcpListener> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;

    socket.set_reuse_address(true)?;
    socket.bind(&SockAddr::from(addr))?;
    socket.listen(LISTEN_BACKLOG)?;
    socket.set_nonblocking(true)?;

    Ok(socket.into())
}

fn configure_stream(stream: &TcpStream) -> io::Result<()> {
    stream.set_nonblocking(false)?;
    stream.set_nodelay(true)?;
    stream.set_read_timeout(Some(Duration::from_millis(READ_TIMEOUT_MS)))?;
    stream.set_write_timeout(Some(Duration::from_millis(WRITE_TIMEOUT_MS)))?;
    Ok(())
}

fn handle_connection(mut stream: TcpStream, peer: SocketAddr, logger: &Logger, stats: &ServerStats) {
    let response = match http::read_request(&mut stream) {
        Ok(request) => handler::route(&request, logger),
        Err(e) => match e.status() {
            Some(status) => {
                logger.log(&format!("Bad Request from {}: {}", peer, e));
                Response::json(status, &handler::CalculateResponse::error(e.to_string()))
            }
            None => {
                logger.log(&format!("Dropped connection from {}: {}", peer, e));
                stats.dropped_connections.fetch_add(1, Ordering::Relaxed);
                return;
            }
        },
    };

    stats.record(response.status);
    if let Err(e) = response.write_to(&mut stream) {
        eprintln!("[{}] ✗ Write error to {}: {}", logger.prefix(), peer, e);
    }
}

pub struct Server {
    listener: TcpListener,
    logger: Logger,
    stats: Arc<ServerStats>,
}

impl Server {
    pub fn bind(addr: SocketAddr, logger: Logger) -> io::Result<Self> {
        Ok(Server {
            listener: create_listener(addr)?,
            logger,
            stats: Arc::new(ServerStats::new()),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn stats(&self) -> Arc<ServerStats> {
        Arc::clone(&self.stats)
    }

    /// Accepts connections until `running` is cleared, then waits for the
    /// in-flight workers.
    pub fn run(&self, running: &AtomicBool) {
        let mut workers: Vec<JoinHandle<()>> = Vec::new();

        while running.load(Ordering::SeqCst) {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    if let Err(e) = configure_stream(&stream) {
                        self.logger.log(&format!("✗ Socket setup failed for {}: {}", peer, e));
                        self.stats.dropped_connections.fetch_add(1, Ordering::Relaxed);
                        continue;
                    }
                    let logger = self.logger.clone();
                    let stats = Arc::clone(&self.stats);
                    workers.push(thread::spawn(move || {
                        handle_connection(stream, peer, &logger, &stats);
                    }));
                    workers.retain(|h| !h.is_finished());
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(ACCEPT_POLL_MS));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.logger.log(&format!("✗ Accept failed: {}", e));
                    thread::sleep(Duration::from_millis(ACCEPT_POLL_MS));
                }
            }
        }

        for worker in workers {
            if worker.join().is_err() {
                self.logger.log("✗ Worker panicked");
            }
        }
    }
}
