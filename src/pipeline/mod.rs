//! Pipeline stages for fetching and binding an image sequence.
//!
//! Each submodule implements exactly one step, so each can be tested alone
//! and the network source can be swapped without touching the rest.
//!
//! ## Data Flow
//!
//! ```text
//! id range ──▶ pool ──▶ fetch ──▶ normalize ──▶ collect ──▶ encode ──▶ document
//!             (N workers) (HTTP)   (RGBA8)     (reorder)    (PNG)     (lopdf)
//! ```
//!
//! 1. [`pool`]: bounded worker pool over a sealed identifier queue
//! 2. [`fetch`]: one download per identifier; the only network I/O
//! 3. [`normalize`]: decode (format sniffed) and copy into RGBA8; runs in
//!    `spawn_blocking`
//! 4. [`collect`]: slot arena that restores ascending identifier order
//! 5. [`encode`]: serialise each bitmap as PNG for the builder
//! 6. [`document`]: one PDF page per bitmap

pub mod collect;
pub mod document;
pub mod encode;
pub mod fetch;
pub mod normalize;
pub mod pool;

#[cfg(test)]
pub(crate) mod testing;
