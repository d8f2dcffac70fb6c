//! # MCPDict API
//!
//! A thin build-and-serve wrapper around the upstream MCPDict
//! Chinese-dialect pronunciation dataset.
//!
//! The upstream project owns the database generation logic; this crate
//! clones it, drives its build tool, stamps the resulting SQLite file with a
//! build-version marker, and serves two read-only queries over HTTP.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌───────────┐   ┌─────────────┐
//! │  Upstream    │──▶│  Stamp    │──▶│   SQLite     │
//! │  build tool  │   │ + verify  │   │ (immutable) │
//! └──────────────┘   └───────────┘   └──────┬──────┘
//!                                           │
//!                                           ▼
//!                                    ┌─────────────┐
//!                                    │  HTTP API    │
//!                                    │ /list-langs/ │
//!                                    │ /chars/      │
//!                                    └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! mcpdict build                 # clone upstream, run its build tool
//! mcpdict stamp                 # version-stamp the database
//! mcpdict check                 # verify before packaging
//! mcpdict serve                 # start the HTTP query API
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Language, reading, and reading-cell types |
//! | [`upstream`] | Upstream clone + build-tool wrapper |
//! | [`stamp`] | Version stamping |
//! | [`check`] | Pre-packaging database verification |
//! | [`query`] | Read-only queries and response shaping |
//! | [`server`] | HTTP API |
//! | [`db`] | Database connections |

pub mod check;
pub mod config;
pub mod db;
pub mod models;
pub mod query;
pub mod server;
pub mod stamp;
pub mod upstream;
