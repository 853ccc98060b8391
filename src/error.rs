//! Error types for sbsketch
//!
//! This module provides the structured error types used across the crate:
//! bitmap decoding failures, session/transport failures, and the top-level
//! error the display driver surfaces to callers.

use std::fmt;
use std::io;
use std::error::Error as StdError;

use crate::session::SessionState;

/// Errors produced while decoding a P1 PBM icon resource
#[derive(Debug)]
pub enum BitmapError {
    /// The stream does not begin with the `P1` magic token
    BadMagic { found: Option<String> },
    /// Width/height token missing, non-numeric, or non-positive
    InvalidHeader { token: String },
    /// A pixel token that is neither `0` nor `1`
    InvalidBit { token: String },
    /// The stream ended before `width * height` pixel tokens were read
    Truncated { expected: usize, received: usize },
}

/// Errors produced by the session state machine and its command channel
#[derive(Debug)]
pub enum SessionError {
    /// The TCP transport could not be established
    Connect { host: String, reason: String },
    /// No recognized prompt arrived within the open timeout
    HandshakeTimeout { waited_ms: u64 },
    /// A write or read failed on an established connection
    Transport { reason: String },
    /// `reopen` was called before any successful `open`
    NotConfigured,
    /// An operation was issued from a state that forbids it
    InvalidState { operation: &'static str, state: SessionState },
}

/// Top-level error type for display driver operations
#[derive(Debug)]
pub enum SketchError {
    /// Icon bitmap decoding errors
    Bitmap(BitmapError),
    /// Session and transport errors
    Session(SessionError),
    /// An icon resource file could not be opened or read
    Resource { path: String, reason: String },
}

impl fmt::Display for BitmapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BitmapError::BadMagic { found: Some(token) } =>
                write!(f, "not a P1 PBM stream (leading token {token:?})"),
            BitmapError::BadMagic { found: None } =>
                write!(f, "not a P1 PBM stream (empty input)"),
            BitmapError::InvalidHeader { token } =>
                write!(f, "invalid PBM dimension token {token:?}"),
            BitmapError::InvalidBit { token } =>
                write!(f, "invalid PBM pixel token {token:?} (expected 0 or 1)"),
            BitmapError::Truncated { expected, received } =>
                write!(f, "PBM pixel data truncated: expected {expected} tokens, got {received}"),
        }
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Connect { host, reason } =>
                write!(f, "cannot connect to {host}: {reason}"),
            SessionError::HandshakeTimeout { waited_ms } =>
                write!(f, "no recognized prompt after {waited_ms}ms"),
            SessionError::Transport { reason } =>
                write!(f, "transport failure: {reason}"),
            SessionError::NotConfigured =>
                write!(f, "reopen requested but no host has been recorded"),
            SessionError::InvalidState { operation, state } =>
                write!(f, "{operation} is not valid while the session is {state:?}"),
        }
    }
}

impl fmt::Display for SketchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SketchError::Bitmap(err) => write!(f, "bitmap error: {err}"),
            SketchError::Session(err) => write!(f, "session error: {err}"),
            SketchError::Resource { path, reason } =>
                write!(f, "icon resource {path}: {reason}"),
        }
    }
}

impl StdError for BitmapError {}
impl StdError for SessionError {}

impl StdError for SketchError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            SketchError::Bitmap(err) => Some(err),
            SketchError::Session(err) => Some(err),
            SketchError::Resource { .. } => None,
        }
    }
}

impl From<BitmapError> for SketchError {
    fn from(err: BitmapError) -> Self {
        SketchError::Bitmap(err)
    }
}

impl From<SessionError> for SketchError {
    fn from(err: SessionError) -> Self {
        SketchError::Session(err)
    }
}

impl SessionError {
    /// Build a `Transport` error from an I/O failure
    pub fn transport(err: &io::Error) -> Self {
        SessionError::Transport { reason: err.to_string() }
    }
}

/// Result type alias for display driver operations
pub type SketchResult<T> = Result<T, SketchError>;

/// Specialized result types for the component layers
pub type BitmapResult<T> = Result<T, BitmapError>;
pub type SessionResult<T> = Result<T, SessionError>;
