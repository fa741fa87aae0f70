//! Host-side logic analyzer acquisition and decoding engine.
//!
//! This crate is THE CORE described in the system specification: serial
//! ingest and per-sample fan-out, bounded ring buffers, an edge-triggered
//! trigger evaluator, a command codec for the acquisition device, and three
//! streaming protocol decoders (I²C, SPI, UART). It accepts a byte stream
//! and a command sink and emits decoded events — it has no opinion about
//! GUIs, plotting, or port-enumeration dialogs; those are external
//! collaborators.

pub mod buffer;
pub mod command;
pub mod config;
pub mod decode;
pub mod error;
pub mod event;
pub mod format;
pub mod framer;
pub mod supervisor;
pub mod trigger;

pub use buffer::RingBuffers;
pub use config::CoreConfig;
pub use error::CoreError;
pub use event::DecodedEvent;
pub use format::DataFormat;
pub use supervisor::Supervisor;
pub use trigger::{BitSet8, TriggerEvaluator};
