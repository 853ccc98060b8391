//! Session state machine for the SoundBridge control connection
//!
//! A session owns one command channel to one device and walks the
//! `Closed -> Handshaking -> Open` lifecycle: connect to the control port,
//! wait for one of the device's command prompts, then issue `sketch` and
//! `irman` commands until the transport fails or the caller closes.
//!
//! The `irman` keypress-interception sub-protocol temporarily forwards one
//! remote-control keypress to this session (`Open -> Intercepting -> Open`):
//! the device is armed with `irman intercept`, the captured code arrives as
//! an `irman: <code>` event line, and the code is handed back with
//! `irman dispatch` so the device's own input handling is not starved.
//!
//! The session never retries anything. Any transport failure while
//! established forces `Closed` and surfaces a transport error; reconnect
//! and backoff policy belong to the caller.

use std::io;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::channel::{CommandChannel, Connector, TcpConnector};
use crate::error::{SessionError, SessionResult};

/// Prompt strings that confirm the peer is a SoundBridge control session
const PROMPTS: [&str; 2] = ["SoundBridge> ", "sketch> "];

/// Prefix of the event line carrying an intercepted keypress code
const EVENT_PREFIX: &str = "irman: ";

/// Commands sent best-effort while closing, in order
const SHUTDOWN_SEQUENCE: [&str; 4] = ["sketch -c clear", "sketch -c exit", "irman off", "exit"];

/// Default bound on the prompt wait during `open`
pub const DEFAULT_OPEN_TIMEOUT: Duration = Duration::from_secs(2);

/// Session lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No transport; only `open`/`reopen` are valid
    Closed,
    /// Transport up, waiting for a recognized prompt
    Handshaking,
    /// Established; commands may be issued
    Open,
    /// Established and waiting for a captured keypress event
    Intercepting,
}

/// Outcome of an `intercept` wait
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterceptOutcome {
    /// A remote keypress was observed; the payload is the captured code
    Key(String),
    /// The wait elapsed without a matching event — a normal outcome
    TimedOut,
}

/// Control session for one SoundBridge device
pub struct SketchSession {
    state: SessionState,
    host: Option<String>,
    channel: CommandChannel,
    connector: Box<dyn Connector>,
    open_timeout: Duration,
}

impl SketchSession {
    /// Session over plain TCP to the standard control port
    pub fn new() -> Self {
        Self::with_connector(Box::new(TcpConnector::default()), DEFAULT_OPEN_TIMEOUT)
    }

    /// Session over a caller-supplied connector. Tests use this to inject
    /// scripted transports; it is also the hook for a custom port or a
    /// tighter open deadline.
    pub fn with_connector(connector: Box<dyn Connector>, open_timeout: Duration) -> Self {
        Self {
            state: SessionState::Closed,
            host: None,
            channel: CommandChannel::new(),
            connector,
            open_timeout,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// True while commands may be issued (`Open` or `Intercepting`)
    pub fn is_established(&self) -> bool {
        matches!(self.state, SessionState::Open | SessionState::Intercepting)
    }

    /// Host recorded by the last successful `open`, if any
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Establish the transport and perform the prompt handshake.
    ///
    /// Valid only from `Closed`. On success the host is recorded for
    /// `reopen` and a default text encoding is selected on the device. On
    /// failure the transport is closed and the session stays `Closed`.
    pub fn open(&mut self, host: &str) -> SessionResult<()> {
        if self.state != SessionState::Closed {
            return Err(SessionError::InvalidState {
                operation: "open",
                state: self.state,
            });
        }

        debug!("connecting to {host}");
        let transport = self
            .connector
            .connect(host, self.open_timeout)
            .map_err(|err| SessionError::Connect {
                host: host.to_string(),
                reason: err.to_string(),
            })?;
        self.channel.attach(transport);
        self.state = SessionState::Handshaking;

        if let Err(err) = self.expect_prompt(host) {
            self.channel.shutdown();
            self.state = SessionState::Closed;
            return Err(err);
        }

        self.host = Some(host.to_string());
        self.state = SessionState::Open;
        info!("session open to {host}");

        // Text commands carry UTF-8 from here on.
        self.command("sketch -c encoding utf8")?;
        Ok(())
    }

    /// Reconnect to the host recorded by a previous successful `open`
    pub fn reopen(&mut self) -> SessionResult<()> {
        if self.state != SessionState::Closed {
            return Err(SessionError::InvalidState {
                operation: "reopen",
                state: self.state,
            });
        }
        let host = self.host.clone().ok_or(SessionError::NotConfigured)?;
        self.open(&host)
    }

    /// Issue one command line on the established session.
    ///
    /// A transport failure closes the session; the caller must `reopen`
    /// before issuing further operations.
    pub fn command(&mut self, line: &str) -> SessionResult<()> {
        if !self.is_established() {
            return Err(SessionError::InvalidState {
                operation: "command",
                state: self.state,
            });
        }
        match self.channel.send(line) {
            Ok(()) => Ok(()),
            Err(err) => Err(self.fail_transport(&err)),
        }
    }

    /// Best-effort graceful shutdown: leave drawing mode, release key
    /// capture, end the telnet session, then close the transport.
    ///
    /// Command failures during the sequence are recorded but never
    /// surfaced; the transport is always closed. A `close` on an already
    /// closed session is a no-op.
    pub fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        for line in SHUTDOWN_SEQUENCE {
            if let Err(err) = self.channel.send(line) {
                debug!("shutdown command {line:?} failed: {err}");
                break;
            }
        }
        self.channel.shutdown();
        self.state = SessionState::Closed;
        info!("session closed");
    }

    /// Arm one-shot remote-input capture and wait up to `timeout` for a
    /// keypress event.
    ///
    /// On a captured code the device is released (`irman off`) and told to
    /// re-dispatch the code itself, and the code is returned. An elapsed
    /// wait is the normal `TimedOut` outcome, not an error. A transport
    /// failure at any point closes the session.
    pub fn intercept(&mut self, timeout: Duration) -> SessionResult<InterceptOutcome> {
        if self.state != SessionState::Open {
            return Err(SessionError::InvalidState {
                operation: "intercept",
                state: self.state,
            });
        }

        if let Err(err) = self.channel.send("irman intercept") {
            return Err(self.fail_transport(&err));
        }
        self.state = SessionState::Intercepting;

        match self.wait_for_event(timeout) {
            Ok(Some(code)) => {
                debug!("intercepted keypress {code}");
                self.command("irman off")?;
                self.command(&format!("irman dispatch {code}"))?;
                self.state = SessionState::Open;
                Ok(InterceptOutcome::Key(code))
            }
            Ok(None) => {
                self.command("irman off")?;
                self.state = SessionState::Open;
                Ok(InterceptOutcome::TimedOut)
            }
            Err(err) => Err(err),
        }
    }

    /// Demote the session to `Closed` after a transport-level failure
    fn fail_transport(&mut self, err: &io::Error) -> SessionError {
        warn!("transport failure, closing session: {err}");
        self.channel.shutdown();
        self.state = SessionState::Closed;
        SessionError::transport(err)
    }

    /// Wait for one of the recognized prompts within the open timeout
    fn expect_prompt(&mut self, host: &str) -> SessionResult<()> {
        let deadline = Instant::now() + self.open_timeout;
        let mut seen = String::new();
        let mut buf = [0u8; 512];

        loop {
            let now = Instant::now();
            if now >= deadline {
                debug!("handshake timed out; received {seen:?}");
                return Err(SessionError::HandshakeTimeout {
                    waited_ms: self.open_timeout.as_millis() as u64,
                });
            }

            // Bound the blocking read by what is left of the wait.
            let remaining = (deadline - now).max(Duration::from_millis(1));
            if let Err(err) = self.channel.set_read_timeout(Some(remaining)) {
                return Err(SessionError::Connect {
                    host: host.to_string(),
                    reason: err.to_string(),
                });
            }

            match self.channel.read_some(&mut buf) {
                Ok(0) => {
                    return Err(SessionError::Connect {
                        host: host.to_string(),
                        reason: "connection closed before prompt".to_string(),
                    });
                }
                Ok(n) => {
                    seen.push_str(&String::from_utf8_lossy(&buf[..n]));
                    if PROMPTS.iter().any(|prompt| seen.contains(prompt)) {
                        return Ok(());
                    }
                }
                Err(err) if is_timeout(&err) => continue,
                Err(err) => {
                    return Err(SessionError::Connect {
                        host: host.to_string(),
                        reason: err.to_string(),
                    });
                }
            }
        }
    }

    /// Wait for an `irman: <code>` event line; `None` means the deadline
    /// elapsed. Non-matching lines are ignored.
    fn wait_for_event(&mut self, timeout: Duration) -> SessionResult<Option<String>> {
        let deadline = Instant::now() + timeout;
        let mut pending = String::new();
        let mut buf = [0u8; 512];

        loop {
            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }

            let remaining = (deadline - now).max(Duration::from_millis(1));
            if let Err(err) = self.channel.set_read_timeout(Some(remaining)) {
                return Err(self.fail_transport(&err));
            }

            match self.channel.read_some(&mut buf) {
                Ok(0) => {
                    let err = io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "connection closed by device",
                    );
                    return Err(self.fail_transport(&err));
                }
                Ok(n) => {
                    pending.push_str(&String::from_utf8_lossy(&buf[..n]));
                    while let Some(pos) = pending.find('\n') {
                        let line: String = pending.drain(..=pos).collect();
                        if let Some(code) = parse_event_line(line.trim_end_matches(['\n', '\r'])) {
                            return Ok(Some(code));
                        }
                    }
                }
                Err(err) if is_timeout(&err) => continue,
                Err(err) => return Err(self.fail_transport(&err)),
            }
        }
    }
}

impl Default for SketchSession {
    fn default() -> Self {
        Self::new()
    }
}

fn is_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}

/// Extract the payload code from an interception event line
fn parse_event_line(line: &str) -> Option<String> {
    let rest = line.strip_prefix(EVENT_PREFIX)?;
    rest.split_whitespace().next().map(str::to_string)
}
