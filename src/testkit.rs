//! Scripted transports for exercising the session without a device
//!
//! The harness plays the device side of the control connection from a
//! fixed script: bytes to emit, an optional end-of-stream, and an optional
//! point at which writes start failing. Every command line the session
//! writes is recorded for assertions. Nothing here touches the network.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::channel::{Connector, LineTransport};
use crate::session::SketchSession;

/// One scripted action on the device side of the transport
pub enum Step {
    /// Bytes the device sends
    Recv(&'static str),
    /// The device closes the connection
    Eof,
}

/// A transport that replays a script and records written lines
pub struct ScriptTransport {
    steps: VecDeque<Step>,
    written: Arc<Mutex<Vec<String>>>,
    fail_writes_after: Option<usize>,
    writes: usize,
    carry: Vec<u8>,
}

impl Read for ScriptTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.carry.is_empty() {
            let n = self.carry.len().min(buf.len());
            buf[..n].copy_from_slice(&self.carry[..n]);
            self.carry.drain(..n);
            return Ok(n);
        }
        match self.steps.pop_front() {
            Some(Step::Recv(text)) => {
                let bytes = text.as_bytes();
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                self.carry.extend_from_slice(&bytes[n..]);
                Ok(n)
            }
            Some(Step::Eof) => Ok(0),
            None => {
                // Script exhausted: behave like a timed-out blocking read.
                thread::sleep(Duration::from_millis(5));
                Err(io::Error::new(io::ErrorKind::TimedOut, "scripted silence"))
            }
        }
    }
}

impl Write for ScriptTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Some(limit) = self.fail_writes_after {
            if self.writes >= limit {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "peer gone"));
            }
        }
        self.writes += 1;
        let line = String::from_utf8_lossy(buf).trim_end().to_string();
        self.written.lock().unwrap().push(line);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl LineTransport for ScriptTransport {
    fn set_read_timeout(&mut self, _timeout: Option<Duration>) -> io::Result<()> {
        Ok(())
    }

    fn shutdown(&mut self) {}
}

/// Shared state behind a harness and the connectors it hands out
struct HarnessInner {
    transports: Mutex<VecDeque<ScriptTransport>>,
    written: Arc<Mutex<Vec<String>>>,
    hosts: Mutex<Vec<String>>,
}

/// Builds scripted sessions and exposes what they wrote
pub struct ScriptHarness {
    inner: Arc<HarnessInner>,
}

struct ScriptConnector {
    inner: Arc<HarnessInner>,
}

impl Connector for ScriptConnector {
    fn connect(&self, host: &str, _timeout: Duration) -> io::Result<Box<dyn LineTransport>> {
        self.inner.hosts.lock().unwrap().push(host.to_string());
        self.inner
            .transports
            .lock()
            .unwrap()
            .pop_front()
            .map(|t| Box::new(t) as Box<dyn LineTransport>)
            .ok_or_else(|| io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused"))
    }
}

impl ScriptHarness {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(HarnessInner {
                transports: Mutex::new(VecDeque::new()),
                written: Arc::new(Mutex::new(Vec::new())),
                hosts: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Queue the script for the next accepted connection. `fail_writes_after`
    /// makes writes fail once that many have succeeded.
    pub fn push_script(&self, steps: Vec<Step>, fail_writes_after: Option<usize>) {
        self.inner.transports.lock().unwrap().push_back(ScriptTransport {
            steps: steps.into_iter().collect(),
            written: Arc::clone(&self.inner.written),
            fail_writes_after,
            writes: 0,
            carry: Vec::new(),
        });
    }

    /// A connection script that answers with the standard prompt
    pub fn push_prompt_script(&self) {
        self.push_script(vec![Step::Recv("SoundBridge> ")], None);
    }

    /// A session wired to this harness
    pub fn session(&self, open_timeout: Duration) -> SketchSession {
        SketchSession::with_connector(
            Box::new(ScriptConnector {
                inner: Arc::clone(&self.inner),
            }),
            open_timeout,
        )
    }

    /// Snapshot of every command line written so far
    pub fn lines(&self) -> Vec<String> {
        self.inner.written.lock().unwrap().clone()
    }

    /// Hosts passed to `connect`, in order
    pub fn hosts(&self) -> Vec<String> {
        self.inner.hosts.lock().unwrap().clone()
    }
}

impl Default for ScriptHarness {
    fn default() -> Self {
        Self::new()
    }
}
