//! IO modules - external system interfaces
//!
//! This module contains all external IO operations:
//! - `udp` - UDP listener for station firmware datagrams
//! - `stations` - Station file loading
//! - `vote_log` - Touch event log (JSONL format)
//! - `emit_channel` - Typed channel for rendering emissions
//! - `bubble_writer` - Drains the emit channel to file (JSONL format)

pub mod bubble_writer;
pub mod emit_channel;
pub mod stations;
pub mod udp;
pub mod vote_log;

// Re-export commonly used types
pub use bubble_writer::BubbleWriter;
pub use emit_channel::{
    create_emit_channel, BubblePayload, EmitMessage, EmitSender, VotePayload,
};
pub use udp::{start_udp_listener, UdpListenerConfig};
pub use vote_log::{VoteLog, VoteRecord};
