//! Command channel for the SoundBridge control connection
//!
//! This module provides the line-oriented command writer used by the
//! session: newline-terminated UTF-8 commands over a persistent blocking
//! TCP connection, with a locally tracked connected flag. Retry and
//! backoff policy live above this layer; the channel never retries and
//! never buffers an unsent command.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

use log::trace;

/// Telnet control port of the SoundBridge sketch interface
pub const SKETCH_PORT: u16 = 4444;

/// Default transport-level I/O timeout applied at connect time
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(2);

// A transport the channel can drive: blocking reads and writes plus
// read-timeout control and an orderly shutdown. TcpStream is the
// production implementation; tests substitute scripted streams.
pub trait LineTransport: Read + Write + Send {
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()>;
    fn shutdown(&mut self);
}

impl LineTransport for TcpStream {
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        TcpStream::set_read_timeout(self, timeout)
    }

    fn shutdown(&mut self) {
        let _ = TcpStream::shutdown(self, Shutdown::Both);
    }
}

/// Establishes a transport to a device host
pub trait Connector: Send {
    fn connect(&self, host: &str, timeout: Duration) -> io::Result<Box<dyn LineTransport>>;
}

/// Plain-TCP connector for the device control port
pub struct TcpConnector {
    pub port: u16,
    /// Read/write timeout fixed on the stream for its lifetime
    pub io_timeout: Duration,
}

impl Default for TcpConnector {
    fn default() -> Self {
        Self {
            port: SKETCH_PORT,
            io_timeout: DEFAULT_IO_TIMEOUT,
        }
    }
}

impl Connector for TcpConnector {
    fn connect(&self, host: &str, timeout: Duration) -> io::Result<Box<dyn LineTransport>> {
        let address = format!("{}:{}", host, self.port);
        let addr = address.to_socket_addrs()?.next().ok_or_else(|| {
            io::Error::new(io::ErrorKind::AddrNotAvailable, "no socket addresses resolved")
        })?;

        let stream = TcpStream::connect_timeout(&addr, timeout)?;
        stream.set_read_timeout(Some(self.io_timeout))?;
        stream.set_write_timeout(Some(self.io_timeout))?;
        Ok(Box::new(stream))
    }
}

/// Line-oriented command writer over an attached transport
pub struct CommandChannel {
    transport: Option<Box<dyn LineTransport>>,
    connected: bool,
}

impl CommandChannel {
    pub fn new() -> Self {
        Self {
            transport: None,
            connected: false,
        }
    }

    /// Take ownership of a freshly connected transport
    pub fn attach(&mut self, transport: Box<dyn LineTransport>) {
        self.transport = Some(transport);
        self.connected = true;
    }

    /// Reports the locally tracked connection state without performing I/O
    pub fn is_connected(&self) -> bool {
        self.connected && self.transport.is_some()
    }

    /// Send one command line: append the newline and write the UTF-8 bytes
    /// as a single write. On I/O failure the channel marks itself
    /// disconnected and propagates the error to the caller.
    pub fn send(&mut self, command: &str) -> io::Result<()> {
        let transport = self.transport.as_mut().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotConnected, "channel has no transport")
        })?;

        let mut line = Vec::with_capacity(command.len() + 1);
        line.extend_from_slice(command.as_bytes());
        line.push(b'\n');

        trace!("send: {command}");
        match transport.write_all(&line).and_then(|()| transport.flush()) {
            Ok(()) => Ok(()),
            Err(err) => {
                self.connected = false;
                Err(err)
            }
        }
    }

    /// Blocking read of whatever bytes the device has produced, bounded by
    /// the transport read timeout. Timeout-kind errors pass through for the
    /// caller's deadline loop; hard errors mark the channel disconnected.
    pub fn read_some(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let transport = self.transport.as_mut().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotConnected, "channel has no transport")
        })?;

        match transport.read(buf) {
            Ok(n) => Ok(n),
            Err(err)
                if err.kind() == io::ErrorKind::WouldBlock
                    || err.kind() == io::ErrorKind::TimedOut =>
            {
                Err(err)
            }
            Err(err) => {
                self.connected = false;
                Err(err)
            }
        }
    }

    /// Adjust the read timeout for a bounded wait
    pub fn set_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        match self.transport.as_mut() {
            Some(transport) => transport.set_read_timeout(timeout),
            None => Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "channel has no transport",
            )),
        }
    }

    /// Close and drop the transport. Always succeeds; the descriptor is
    /// released even when the peer is already gone.
    pub fn shutdown(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.shutdown();
        }
        self.connected = false;
    }
}

impl Default for CommandChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct RecordingTransport {
        written: Arc<Mutex<Vec<u8>>>,
        fail_writes: bool,
    }

    impl Read for RecordingTransport {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::TimedOut, "no data"))
        }
    }

    impl Write for RecordingTransport {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.fail_writes {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "peer gone"));
            }
            self.written.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl LineTransport for RecordingTransport {
        fn set_read_timeout(&mut self, _timeout: Option<Duration>) -> io::Result<()> {
            Ok(())
        }

        fn shutdown(&mut self) {}
    }

    #[test]
    fn test_send_appends_newline() {
        let written = Arc::new(Mutex::new(Vec::new()));
        let mut channel = CommandChannel::new();
        channel.attach(Box::new(RecordingTransport {
            written: Arc::clone(&written),
            fail_writes: false,
        }));

        channel.send("sketch -c clear").unwrap();
        assert_eq!(written.lock().unwrap().as_slice(), b"sketch -c clear\n");
        assert!(channel.is_connected());
    }

    #[test]
    fn test_send_failure_marks_disconnected() {
        let mut channel = CommandChannel::new();
        channel.attach(Box::new(RecordingTransport {
            written: Arc::new(Mutex::new(Vec::new())),
            fail_writes: true,
        }));

        let err = channel.send("sketch -c clear").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert!(!channel.is_connected(), "failed write must drop the connected flag");
    }

    #[test]
    fn test_send_without_transport_is_not_connected() {
        let mut channel = CommandChannel::new();
        let err = channel.send("exit").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotConnected);
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let mut channel = CommandChannel::new();
        channel.attach(Box::new(RecordingTransport {
            written: Arc::new(Mutex::new(Vec::new())),
            fail_writes: false,
        }));

        channel.shutdown();
        assert!(!channel.is_connected());
        channel.shutdown();
        assert!(!channel.is_connected());
    }
}
