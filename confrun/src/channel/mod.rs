//! Channel layer for prompt-driven reads over a device transport.
//!
//! This module turns the raw byte stream of a [`Transport`](crate::transport::Transport)
//! into line-oriented command exchanges: write a line, then read until a
//! prompt pattern shows up at the tail of the output.

mod buffer;
mod device;

pub use buffer::PatternBuffer;
pub use device::DeviceChannel;
