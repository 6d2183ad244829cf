//! Domain models - core types for stations and touch sessions
//!
//! This module contains the canonical data types used throughout the system:
//! - `Station` - a physical voting button identified by (source, choice)
//! - `TouchSession` - open/closed touch state at one station key
//! - `TouchMsg` - parsed inbound event from station firmware
//! - `Flavor` - classification of inbound events
//! - `RadiusMap` - duration-to-radius mapping for bubbles

pub mod radius;
pub mod types;
