//! Motion-control core for a differential-drive robot on no-std embedded platforms.
//!
//! For a runnable host simulation, see the `mock-robot` application crate.
#![no_std]

pub mod utils;
