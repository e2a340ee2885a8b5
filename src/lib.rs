//! # Post Harness
//!
//! Fetch a profile's LinkedIn posts into a local store and query them as
//! MCP tools.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌──────────────┐
//! │  Posts API  │──▶│    ingest    │──▶│  PostStore   │
//! │ (RapidAPI)  │   │  normalize   │   │ (JSON file)  │
//! └─────────────┘   └──────────────┘   └──────┬───────┘
//!                                             │
//!                                       ┌─────▼─────┐
//!                                       │   query   │
//!                                       └─────┬─────┘
//!                        ┌────────────────────┼────────────────┐
//!                        ▼                    ▼                ▼
//!                   ┌─────────┐        ┌────────────┐    ┌──────────┐
//!                   │   CLI   │        │ MCP stdio  │    │   HTTP   │
//!                   │ (posts) │        │            │    │ API+MCP  │
//!                   └─────────┘        └────────────┘    └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! export RAPIDAPI_KEY=...
//! posts fetch satyanadella          # ingest, overwriting the store
//! posts list --start 0 --limit 5
//! posts search "copilot"
//! posts top --metric "Total Reactions" --top-n 3
//! posts by-date 2024-01-01 2024-01-31
//! posts serve stdio                 # MCP over stdin/stdout
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and startup credentials |
//! | [`models`] | `PostRecord` and the raw API payload types |
//! | [`store`] | `PostStore` trait, JSON file and in-memory backends |
//! | [`ingest`] | `fetch_and_save_posts`: API call, normalization, overwrite |
//! | [`query`] | Pagination, keyword search, top-N, date range |
//! | [`tools`] | `Tool` trait, `ToolContext`, `ToolRegistry`, built-in tools |
//! | [`mcp`] | MCP protocol bridge (`rmcp`) |
//! | [`server`] | stdio and HTTP transports |

pub mod config;
pub mod ingest;
pub mod mcp;
pub mod models;
pub mod query;
pub mod server;
pub mod store;
pub mod tools;

pub use models::PostRecord;
pub use store::{JsonFileStore, PostStore, StoreError};
pub use tools::{Tool, ToolContext, ToolRegistry};
