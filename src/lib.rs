//! Math Lab - shared data exchange for the lab tabs
//!
//! Math Lab is a desktop application made of independent educational tabs:
//! circuit simulation, quantum gates, matrix algebra, calculus plotting,
//! statistics, neuroscience models, complex-number visualization and neural
//! network training. This crate holds the part the tabs share: the
//! [`DataHub`], an in-process store through which one tab publishes a result
//! and another picks it up.
//!
//! # Core Features
//!
//! - **Typed exchange**: payloads are a closed set of matrix, array, scalar,
//!   function, complex, dataset and vector values
//! - **Copy isolation**: every read returns an independent copy
//! - **Events**: observers hear about exports, removals, clears and
//!   cross-tab "use this" requests
//! - **Queries**: per-category listings, recency-ordered listings, counts and
//!   filtered search
//! - **Snapshots**: optional JSON persistence between sessions
//!
//! # Module Organization
//!
//! - [`app::data_hub`] - store, event bus, query layer, snapshots, panel model
//! - [`app::notifications`] - notifications raised for failed hub requests
//! - [`app::config`] - application configuration

#![warn(clippy::all, rust_2018_idioms)]

// Include logging macros first
#[macro_use]
pub mod logging_macros;

pub mod app;
pub use app::data_hub::DataHub;
