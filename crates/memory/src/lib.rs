//! Guest physical memory access for DMA-capable device models.
//!
//! Devices never own guest RAM. They borrow a [`MemoryBus`] for the duration of a register access
//! or a frame delivery and perform their DMA through it. [`DenseMemory`] is a flat RAM backend
//! suitable for small machines and device-level tests.

#![forbid(unsafe_code)]

mod bus;
mod dense;

pub use bus::MemoryBus;
pub use dense::{DenseMemory, DenseMemoryError, DenseMemoryResult};
