//! Domain layer - Pure computational logic
//!
//! This module contains pure functions and algorithms without I/O dependencies.

pub mod bit_set;
pub mod bits;
pub mod bloom;
pub mod count_min;
pub mod cuckoo;
pub mod error;
pub mod hash;
pub mod hyper_log_log;
pub mod min_hash;
pub mod sketch;
pub mod sketch_format;
