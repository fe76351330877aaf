//! Common utilities and shared types for folio.
//!
//! This crate provides foundational components used across all folio crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//! - **Counter store**: Redis-backed derived counters and membership flags
//!   via [`CounterStore`]
//!
//! # Example
//!
//! ```no_run
//! use folio_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate();
//!     println!("Generated ID: {}", id);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod counter_store;
pub mod error;
pub mod id;

pub use config::Config;
pub use counter_store::{
    CounterBackend, CounterStore, MemoryCounterStore, NoScanCounterStore, RedisCounterStore, keys,
};
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
