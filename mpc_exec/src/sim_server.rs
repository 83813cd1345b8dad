//! # Simulator Server
//!
//! The simulator connects to the bridge as a websocket client. The server accepts connections and
//! runs each one on its own worker thread with its own solver, feeding every text message through
//! the shared [`ControlPipeline`] and sending back whatever response it produces.
//!
//! Steering responses are held back by the [`ActuationDelay`] before being sent, which mimics the
//! time a real actuator takes to respond. The delay only ever blocks its own connection.
//!
//! All threads watch the server's run flag, clearing it stops the accept loop and every worker.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    io,
    net::{SocketAddr, TcpListener, TcpStream},
    sync::{Arc, atomic::{AtomicBool, Ordering}},
    thread::{self, JoinHandle},
    time::{Duration, Instant}
};
use log::{debug, error, info, trace, warn};
use tungstenite::{Message, WebSocket};

use crate::{
    params::MpcExecParams,
    pipeline::{ControlPipeline, TickOutcome},
    solver::{Solver, SolverFactory}
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Time to wait between checks for new connections.
const ACCEPT_POLL_PERIOD: Duration = Duration::from_millis(20);

/// Read timeout on connection sockets, bounds how long a worker takes to notice the run flag.
const READ_POLL_PERIOD: Duration = Duration::from_millis(50);

/// Longest single sleep while waiting out the actuation delay.
const DELAY_SLICE: Duration = Duration::from_millis(10);

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct SimServer {
    listener: TcpListener,
    pipeline: Arc<ControlPipeline>,
    solver_factory: Arc<dyn SolverFactory>,
    actuation_delay: Duration,
    run: Arc<AtomicBool>,
}

/// A cancellable wait applied before steering responses are sent.
#[derive(Debug, Clone)]
pub struct ActuationDelay {
    delay: Duration,
    run: Arc<AtomicBool>,
}

/// A single simulator connection, owned by its worker thread.
struct Connection {
    id: usize,
    peer: SocketAddr,
    ws: WebSocket<TcpStream>,
    solver: Box<dyn Solver>,
    state: ConnState,
    pipeline: Arc<ControlPipeline>,
    delay: ActuationDelay,
    run: Arc<AtomicBool>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// State of a connection.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConnState {
    /// Connected, but no response has been sent yet.
    Idle,

    /// At least one response has been sent.
    Streaming,
}

#[derive(Debug, thiserror::Error)]
pub enum SimServerError {
    #[error("Could not bind the server to {0}: {1}")]
    BindError(String, io::Error),

    #[error("Could not configure the listener: {0}")]
    ListenerError(io::Error),

    #[error("Websocket handshake with {0} failed: {1}")]
    HandshakeError(SocketAddr, String),

    #[error("Websocket error: {0}")]
    WebSocketError(#[from] tungstenite::Error),

    #[error("Could not spawn a worker thread: {0}")]
    SpawnError(io::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimServer {
    /// Bind the server to the address in the parameters.
    ///
    /// Nothing is accepted until [`SimServer::run`] is called.
    pub fn bind(
        params: &MpcExecParams,
        pipeline: ControlPipeline,
        solver_factory: Arc<dyn SolverFactory>
    ) -> Result<Self, SimServerError> {
        let listener = TcpListener::bind(&params.bind_addr)
            .map_err(|e| SimServerError::BindError(params.bind_addr.clone(), e))?;

        // The accept loop polls so it can watch the run flag
        listener
            .set_nonblocking(true)
            .map_err(SimServerError::ListenerError)?;

        Ok(Self {
            listener,
            pipeline: Arc::new(pipeline),
            solver_factory,
            actuation_delay: params.actuation_delay(),
            run: Arc::new(AtomicBool::new(true))
        })
    }

    /// The address the server is listening on.
    pub fn local_addr(&self) -> Result<SocketAddr, SimServerError> {
        self.listener.local_addr().map_err(SimServerError::ListenerError)
    }

    /// Get the run flag, clearing it stops the server.
    pub fn run_flag(&self) -> Arc<AtomicBool> {
        self.run.clone()
    }

    /// Accept connections until the run flag is cleared, then wait for all workers to finish.
    pub fn run(self) -> Result<(), SimServerError> {
        let mut workers: Vec<JoinHandle<()>> = Vec::new();
        let mut next_id = 0usize;

        info!("SimServer listening on {}", self.local_addr()?);

        while self.run.load(Ordering::Relaxed) {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    let id = next_id;
                    next_id += 1;

                    match self.spawn_worker(id, stream, peer) {
                        Ok(jh) => workers.push(jh),
                        Err(e) => error!("[conn {}] {}", id, e)
                    }
                },
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_PERIOD)
                },
                Err(e) => {
                    warn!("Error accepting a connection: {}", e);
                    thread::sleep(ACCEPT_POLL_PERIOD)
                }
            }

            workers.retain(|jh| !jh.is_finished());
        }

        info!("SimServer stopping, waiting for {} connection(s) to close", workers.len());

        for jh in workers {
            if jh.join().is_err() {
                error!("A connection worker panicked");
            }
        }

        info!("SimServer stopped");

        Ok(())
    }

    fn spawn_worker(
        &self,
        id: usize,
        stream: TcpStream,
        peer: SocketAddr
    ) -> Result<JoinHandle<()>, SimServerError> {
        let pipeline = self.pipeline.clone();
        let solver = self.solver_factory.create();
        let delay = ActuationDelay::new(self.actuation_delay, self.run.clone());
        let run = self.run.clone();

        thread::Builder::new()
            .name(format!("conn-{}", id))
            .spawn(move || {
                let conn = match Connection::accept(
                    id, stream, peer, solver, pipeline, delay, run
                ) {
                    Ok(c) => c,
                    Err(e) => {
                        warn!("[conn {}] {}", id, e);
                        return
                    }
                };

                info!("[conn {}] Simulator connected from {}", id, peer);

                match conn.serve() {
                    Ok(()) => info!("[conn {}] Simulator disconnected", id),
                    Err(e) => warn!("[conn {}] Connection closed with error: {}", id, e)
                }
            })
            .map_err(SimServerError::SpawnError)
    }
}

impl ActuationDelay {
    pub fn new(delay: Duration, run: Arc<AtomicBool>) -> Self {
        Self {
            delay,
            run
        }
    }

    /// Wait out the delay.
    ///
    /// Returns `false` if the run flag was cleared during the wait, in which case the response
    /// must be discarded.
    pub fn wait(&self) -> bool {
        let start = Instant::now();

        loop {
            if !self.run.load(Ordering::Relaxed) {
                return false
            }

            let elapsed = start.elapsed();
            if elapsed >= self.delay {
                return true
            }

            thread::sleep((self.delay - elapsed).min(DELAY_SLICE));
        }
    }
}

impl Connection {
    /// Perform the websocket handshake on a newly accepted stream.
    fn accept(
        id: usize,
        stream: TcpStream,
        peer: SocketAddr,
        solver: Box<dyn Solver>,
        pipeline: Arc<ControlPipeline>,
        delay: ActuationDelay,
        run: Arc<AtomicBool>
    ) -> Result<Self, SimServerError> {
        // Accepted streams may inherit the listener's non-blocking mode
        stream
            .set_nonblocking(false)
            .map_err(SimServerError::ListenerError)?;

        let ws = tungstenite::accept(stream)
            .map_err(|e| SimServerError::HandshakeError(peer, e.to_string()))?;

        ws.get_ref()
            .set_read_timeout(Some(READ_POLL_PERIOD))
            .map_err(SimServerError::ListenerError)?;

        Ok(Self {
            id,
            peer,
            ws,
            solver,
            state: ConnState::Idle,
            pipeline,
            delay,
            run,
        })
    }

    /// Serve the connection until it closes or the server stops.
    fn serve(mut self) -> Result<(), SimServerError> {
        loop {
            if !self.run.load(Ordering::Relaxed) {
                debug!("[conn {}] Server stopping, closing connection", self.id);
                self.ws.close(None).ok();
                self.ws.flush().ok();
                return Ok(())
            }

            let msg = match self.ws.read() {
                Ok(m) => m,
                Err(tungstenite::Error::Io(e))
                    if e.kind() == io::ErrorKind::WouldBlock
                        || e.kind() == io::ErrorKind::TimedOut =>
                {
                    continue
                },
                Err(tungstenite::Error::ConnectionClosed)
                | Err(tungstenite::Error::AlreadyClosed) => return Ok(()),
                Err(e) => return Err(e.into())
            };

            match msg {
                Message::Text(raw) => self.handle_text(&raw)?,
                Message::Close(frame) => {
                    // The close reply is sent by subsequent reads
                    debug!("[conn {}] Close requested by {}: {:?}", self.id, self.peer, frame);
                },
                m => trace!("[conn {}] Ignoring non-text message: {:?}", self.id, m)
            }
        }
    }

    /// Run one tick and send the response, if any.
    fn handle_text(&mut self, raw: &str) -> Result<(), SimServerError> {
        trace!("[conn {}] <- {}", self.id, raw);

        let outcome = match self.pipeline.tick(raw, self.solver.as_mut()) {
            Ok(o) => o,
            Err(e) => {
                warn!("[conn {}] Dropping tick: {}", self.id, e);
                return Ok(())
            }
        };

        let frame = match outcome.encode() {
            Ok(Some(f)) => f,
            Ok(None) => return Ok(()),
            Err(e) => {
                warn!("[conn {}] Dropping tick: {}", self.id, e);
                return Ok(())
            }
        };

        if let TickOutcome::Steer(_) = outcome {
            if !self.delay.wait() {
                debug!("[conn {}] Actuation delay cancelled, response discarded", self.id);
                return Ok(())
            }
        }

        self.ws.send(Message::Text(frame))?;

        if self.state == ConnState::Idle {
            info!("[conn {}] Streaming to the simulator", self.id);
            self.state = ConnState::Streaming;
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_delay_waits() {
        let run = Arc::new(AtomicBool::new(true));
        let delay = ActuationDelay::new(Duration::from_millis(30), run);

        let start = Instant::now();
        assert!(delay.wait());
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_zero_delay() {
        let delay = ActuationDelay::new(Duration::from_millis(0), Arc::new(AtomicBool::new(true)));
        assert!(delay.wait());
    }

    #[test]
    fn test_delay_cancelled() {
        let run = Arc::new(AtomicBool::new(true));
        let delay = ActuationDelay::new(Duration::from_secs(10), run.clone());

        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            run.store(false, Ordering::Relaxed);
        });

        let start = Instant::now();
        assert!(!delay.wait());
        assert!(start.elapsed() < Duration::from_secs(5));

        canceller.join().unwrap();
    }
}
