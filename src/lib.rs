//! sbsketch - weather panels for Roku SoundBridge line displays
//!
//! The library drives a SoundBridge front panel over its telnet control
//! port: a session state machine owns the line-oriented command channel,
//! and a small display driver turns text, clears, and PBM weather icons
//! into `sketch` draw commands.

/// Error types and result aliases
pub mod error;

/// Line-oriented command channel and transport seams
pub mod channel;

/// Session state machine: open/handshake/close and keypress interception
pub mod session;

/// P1 PBM bitmap decoding
pub mod bitmap;

/// Bitmap to draw-op rasterization
pub mod raster;

/// Condition-code to icon-identifier lookup
pub mod icons;

/// Weather feed model and sources
pub mod weather;

/// Display driver facade and profiles
pub mod display;

/// Rotating display panels
pub mod panels;

/// Scripted transports for tests
pub mod testkit;
