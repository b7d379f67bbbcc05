//! # tessie-client
//!
//! Resilient async client for the Tessie vehicle telemetry and control API,
//! built to back AI tool-calling integrations.
//!
//! ## Overview
//!
//! Tool handlers that expose vehicle data to AI agents hammer the same few
//! endpoints in bursts. This crate puts a resilience layer between those
//! handlers and the upstream REST API so that bursty, repetitive access
//! stays cheap and failures come back normalized:
//!
//! - **Request cache**: per-operation TTLs with ±10% jitter and
//!   least-recently-touched eviction under a size bound ([`cache`])
//! - **In-flight coalescing**: concurrent callers for the same logical
//!   request share one upstream call ([`cache::CacheStore`])
//! - **Retry with backoff**: classification-driven exponential backoff,
//!   with a conservative policy for mutating commands ([`retry`])
//! - **Error classification**: HTTP failures become structured
//!   [`ApiError`] descriptors with sanitized diagnostics ([`classify`])
//! - **VIN-scoped invalidation**: commands purge the affected vehicle's
//!   cached entries and the roster
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tessie_client::{Command, VehicleClientBuilder};
//!
//! #[tokio::main]
//! async fn main() -> tessie_client::Result<()> {
//!     let client = VehicleClientBuilder::from_env().build()?;
//!
//!     for vehicle in client.vehicles().await? {
//!         let battery = client.battery(&vehicle.vin).await?;
//!         println!("{}: {:?}%", vehicle.vin, battery.battery_level);
//!     }
//!
//!     client.send_command("5YJ3E1EA7KF000316", Command::Lock).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | [`VehicleClient`], builder, configuration |
//! | [`cache`] | Keyed TTL/jitter/LRU store with in-flight coalescing |
//! | [`retry`] | Exponential backoff around transport attempts |
//! | [`classify`] | Error classification and metadata sanitization |
//! | [`transport`] | `Transport` trait and reqwest implementation |
//! | [`decode`] | Response shape normalization and typed decode |
//! | [`types`] | serde models for vehicles, drives, commands |

pub mod cache;
pub mod classify;
pub mod client;
pub mod decode;
pub mod error;
pub mod retry;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use cache::{CacheConfig, CacheKey, CacheStats, CacheStore};
pub use client::{ClientConfig, TtlConfig, VehicleClient, VehicleClientBuilder};
pub use error::{ApiError, Error, ErrorKind, Result};
pub use retry::{RetryMode, RetryPolicy};
pub use types::{
    BatteryState, Command, CommandOutcome, Drive, PathPoint, StateSnapshot, TimeRange, Vehicle,
    VehicleState,
};
