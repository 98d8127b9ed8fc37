//! Background Tasks Module
//!
//! Contains background tasks that run for the lifetime of a cache context.
//!
//! # Tasks
//! - Expired-entry sweep: removes expired cache entries at configured intervals

mod sweep;

pub use sweep::spawn_sweep_task;
