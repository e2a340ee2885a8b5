//! Tool trait, execution context, and the built-in post tools.
//!
//! Every operation an orchestrator can call is a [`Tool`] in a
//! [`ToolRegistry`]. The MCP bridge ([`crate::mcp`]), the HTTP API
//! ([`crate::server`]), and the CLI all dispatch through the same registry.
//!
//! ```text
//! ┌────────────────────────────────────────────────┐
//! │                 ToolRegistry                   │
//! │  fetch_and_save_posts   get_saved_posts        │
//! │  search_posts  get_top_posts  get_posts_by_date│
//! └──────────────────────┬─────────────────────────┘
//!                        ▼
//!        ToolContext { config, store, credentials }
//! ```
//!
//! Two error channels are kept apart on purpose. Query tools always return
//! `Ok`, with problems reported inside the value as `{ "message": ... }`.
//! `fetch_and_save_posts` returns `Err` when ingestion fails, which callers
//! surface as a failed tool call.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::config::{Config, Credentials};
use crate::ingest::fetch_and_save_posts;
use crate::query;
use crate::store::{JsonFileStore, PostStore};

/// A named operation with a JSON Schema for its parameters.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use anyhow::Result;
/// use serde_json::{json, Value};
/// use post_harness::store::PostStore;
/// use post_harness::tools::{Tool, ToolContext};
///
/// pub struct CountPosts;
///
/// #[async_trait]
/// impl Tool for CountPosts {
///     fn name(&self) -> &str { "count_posts" }
///     fn description(&self) -> &str { "Count saved posts" }
///
///     fn parameters_schema(&self) -> Value {
///         json!({ "type": "object", "properties": {} })
///     }
///
///     async fn execute(&self, _params: Value, ctx: &ToolContext) -> Result<Value> {
///         let count = ctx.store().load().map(|p| p.len()).unwrap_or(0);
///         Ok(json!({ "count": count }))
///     }
/// }
/// ```
#[async_trait]
pub trait Tool: Send + Sync {
    /// Lowercase identifier with underscores, used for dispatch.
    fn name(&self) -> &str;

    /// One-line description for agent discovery.
    fn description(&self) -> &str;

    /// Whether the tool leaves the store untouched. Defaults to `true`.
    fn read_only(&self) -> bool {
        true
    }

    /// JSON Schema (`type: "object"`) describing the parameters.
    fn parameters_schema(&self) -> Value;

    /// Run the tool. `params` is always a JSON object.
    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value>;
}

/// Everything a tool needs: configuration, the store, and the API key.
///
/// Cheap to clone; all parts are shared.
#[derive(Clone)]
pub struct ToolContext {
    config: Arc<Config>,
    store: Arc<dyn PostStore>,
    credentials: Credentials,
}

impl ToolContext {
    pub fn new(config: Arc<Config>, store: Arc<dyn PostStore>, credentials: Credentials) -> Self {
        Self {
            config,
            store,
            credentials,
        }
    }

    /// Context backed by the JSON file named in `[store].path`.
    pub fn from_config(config: Arc<Config>, credentials: Credentials) -> Self {
        let store: Arc<dyn PostStore> = Arc::new(JsonFileStore::new(config.store.path.clone()));
        Self::new(config, store, credentials)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &dyn PostStore {
        self.store.as_ref()
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}

fn parse_params<T: DeserializeOwned>(params: Value) -> Result<T> {
    serde_json::from_value(params).context("invalid parameters")
}

/// Negative indices from callers are treated as zero.
fn non_negative(n: i64) -> usize {
    usize::try_from(n).unwrap_or(0)
}

fn to_json<T: serde::Serialize>(value: T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

// ═══════════════════════════════════════════════════════════════════════
// Built-in tools
// ═══════════════════════════════════════════════════════════════════════

/// Fetch a profile's posts and overwrite the store.
pub struct FetchAndSavePostsTool;

#[derive(Deserialize)]
struct FetchParams {
    username: String,
}

#[async_trait]
impl Tool for FetchAndSavePostsTool {
    fn name(&self) -> &str {
        "fetch_and_save_posts"
    }

    fn description(&self) -> &str {
        "Fetch LinkedIn posts for a given username and save them to the local store."
    }

    fn read_only(&self) -> bool {
        false
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "username": { "type": "string", "description": "Profile handle to fetch posts for" }
            },
            "required": ["username"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let p: FetchParams = parse_params(params)?;
        let message =
            fetch_and_save_posts(ctx.config(), ctx.credentials(), ctx.store(), &p.username).await?;
        Ok(Value::String(message))
    }
}

/// Paginate through saved posts.
pub struct GetSavedPostsTool;

#[derive(Deserialize)]
struct PageParams {
    #[serde(default)]
    start: i64,
    #[serde(default = "default_page_limit")]
    limit: i64,
}

fn default_page_limit() -> i64 {
    query::PAGE_SIZE as i64
}

#[async_trait]
impl Tool for GetSavedPostsTool {
    fn name(&self) -> &str {
        "get_saved_posts"
    }

    fn description(&self) -> &str {
        "Retrieve saved posts with pagination (at most 5 per call)."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "start": { "type": "integer", "description": "Index of the first post", "default": 0 },
                "limit": { "type": "integer", "description": "Number of posts to return (max 5)", "default": 5 }
            }
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let p: PageParams = parse_params(params)?;
        to_json(query::get_saved_posts(
            ctx.store(),
            non_negative(p.start),
            non_negative(p.limit),
        ))
    }
}

/// Keyword search over post text.
pub struct SearchPostsTool;

#[derive(Deserialize)]
struct SearchParams {
    keyword: String,
}

#[async_trait]
impl Tool for SearchPostsTool {
    fn name(&self) -> &str {
        "search_posts"
    }

    fn description(&self) -> &str {
        "Search saved posts for a keyword in the post text (case-insensitive)."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "keyword": { "type": "string", "description": "Keyword to search for in post text" }
            },
            "required": ["keyword"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let p: SearchParams = parse_params(params)?;
        to_json(query::search_posts(ctx.store(), &p.keyword))
    }
}

/// Rank saved posts by an engagement metric.
pub struct GetTopPostsTool;

#[derive(Deserialize)]
struct TopParams {
    #[serde(default = "default_metric")]
    metric: String,
    #[serde(default = "default_top_n")]
    top_n: i64,
}

fn default_metric() -> String {
    query::Metric::LikeCount.to_string()
}

fn default_top_n() -> i64 {
    5
}

#[async_trait]
impl Tool for GetTopPostsTool {
    fn name(&self) -> &str {
        "get_top_posts"
    }

    fn description(&self) -> &str {
        "Get the top saved posts by an engagement metric."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "metric": {
                    "type": "string",
                    "enum": ["Like Count", "Total Reactions"],
                    "default": "Like Count"
                },
                "top_n": { "type": "integer", "description": "Number of posts to return", "default": 5 }
            }
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let p: TopParams = parse_params(params)?;
        to_json(query::get_top_posts(ctx.store(), &p.metric, p.top_n))
    }
}

/// Filter saved posts by an inclusive date range.
pub struct GetPostsByDateTool;

#[derive(Deserialize)]
struct DateParams {
    start_date: String,
    end_date: String,
}

#[async_trait]
impl Tool for GetPostsByDateTool {
    fn name(&self) -> &str {
        "get_posts_by_date"
    }

    fn description(&self) -> &str {
        "Retrieve saved posts posted within a date range (YYYY-MM-DD, inclusive)."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "start_date": { "type": "string", "description": "Start date, YYYY-MM-DD" },
                "end_date": { "type": "string", "description": "End date, YYYY-MM-DD" }
            },
            "required": ["start_date", "end_date"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let p: DateParams = parse_params(params)?;
        to_json(query::get_posts_by_date(
            ctx.store(),
            &p.start_date,
            &p.end_date,
        ))
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Registry
// ═══════════════════════════════════════════════════════════════════════

/// Ordered set of tools, looked up by name.
///
/// ```rust
/// use post_harness::tools::ToolRegistry;
///
/// let tools = ToolRegistry::with_builtins();
/// assert!(tools.find("search_posts").is_some());
/// ```
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// The five post tools.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(FetchAndSavePostsTool));
        registry.register(Box::new(GetSavedPostsTool));
        registry.register(Box::new(SearchPostsTool));
        registry.register(Box::new(GetTopPostsTool));
        registry.register(Box::new(GetPostsByDateTool));
        registry
    }

    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.push(tool);
    }

    pub fn tools(&self) -> &[Box<dyn Tool>] {
        &self.tools
    }

    pub fn find(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
