//! Services - business logic and state management
//!
//! This module contains the core business logic services:
//! - `station_index` - Immutable-after-load station lookup
//! - `tracker` - Touch session state machine and event orchestration

pub mod station_index;
pub mod tracker;

// Re-export commonly used types
pub use station_index::StationIndex;
pub use tracker::TouchTracker;
