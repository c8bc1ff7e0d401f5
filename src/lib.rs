//! GDEMU ROM support library
//!
//! Core functionality for normalizing Dreamcast disc images into the layout
//! the GDEMU optical drive emulator reads from its SD card.

pub mod config;
pub mod rom;
