//! Filesystem utilities for kvmutex.
//!
//! File-backed lease records must never be observed half-written by another
//! process, so every write goes through [`atomic_write`].

pub mod atomic;

pub use atomic::atomic_write;
