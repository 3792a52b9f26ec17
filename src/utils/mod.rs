//! Utility modules

pub mod memory;

pub use memory::MemoryProbe;
