//! Test harness for driving sessions against a fake gateway.
//!
//! This module provides a gateway that speaks the server side of the
//! handshake, plus helpers for reading packets off in-memory pipes.

#![allow(dead_code)]

mod gateway;
mod transport;
mod wire;

pub use gateway::{FakeGateway, GatewayStats};
pub use transport::BrokenWriter;
pub use wire::{drain_packets, frame, wait_until};
