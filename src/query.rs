//! Read-only queries over the stored posts.
//!
//! Every query re-reads the store, so a fresh ingestion is visible to the
//! next call. None of them fail: problems (no store yet, corrupted store,
//! unknown metric, bad date) come back as a [`Notice`] inside
//! [`QueryOutcome::Reported`], which serializes to a `{ "message": ... }`
//! object and is told apart from real results by its shape.
//!
//! | Operation | Returns |
//! |-----------|---------|
//! | [`get_saved_posts`] | one page of at most [`PAGE_SIZE`] posts |
//! | [`search_posts`] | case-insensitive matches in the post text |
//! | [`get_top_posts`] | posts ranked by a [`Metric`] |
//! | [`get_posts_by_date`] | posts within an inclusive date range |

use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::PostRecord;
use crate::store::{PostStore, StoreError};

/// Upper bound on posts returned by any windowed query.
pub const PAGE_SIZE: usize = 5;

/// Date format for range bounds and stored `Posted Date` values.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const MSG_NO_DATA_PAGINATE: &str =
    "No data found. Fetch posts first using fetch_and_save_posts().";
const MSG_NO_DATA: &str = "No data found. Fetch posts first.";
const MSG_CORRUPT: &str = "Error reading data file. JSON might be corrupted.";
const MSG_INVALID_METRIC: &str = "Invalid metric. Use 'Like Count' or 'Total Reactions'.";
const MSG_INVALID_DATE: &str = "Invalid date format. Use 'YYYY-MM-DD'.";

/// A reported error: a message, plus an empty `posts` list for store
/// problems.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posts: Option<Vec<PostRecord>>,
}

impl Notice {
    fn with_empty_posts(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            posts: Some(Vec::new()),
        }
    }

    fn message_only(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            posts: None,
        }
    }
}

/// Either the query's result or a reported error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryOutcome<T> {
    Found(T),
    Reported(Notice),
}

impl<T> QueryOutcome<T> {
    pub fn is_reported(&self) -> bool {
        matches!(self, QueryOutcome::Reported(_))
    }

    pub fn found(self) -> Option<T> {
        match self {
            QueryOutcome::Found(v) => Some(v),
            QueryOutcome::Reported(_) => None,
        }
    }

    pub fn notice(&self) -> Option<&Notice> {
        match self {
            QueryOutcome::Found(_) => None,
            QueryOutcome::Reported(n) => Some(n),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub posts: Vec<PostRecord>,
    pub total_posts: usize,
    pub has_more: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResults {
    pub keyword: String,
    pub total_results: usize,
    pub posts: Vec<PostRecord>,
    pub has_more: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopPosts {
    pub metric: Metric,
    pub posts: Vec<PostRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateRangeResults {
    pub start_date: String,
    pub end_date: String,
    pub total_results: usize,
    pub posts: Vec<PostRecord>,
    pub has_more: bool,
}

/// Engagement metric used for ranking.
///
/// Serialized and parsed by its store key name (`"Like Count"`,
/// `"Total Reactions"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Metric {
    #[serde(rename = "Like Count")]
    LikeCount,
    #[serde(rename = "Total Reactions")]
    TotalReactions,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::LikeCount => "Like Count",
            Metric::TotalReactions => "Total Reactions",
        }
    }

    pub fn value_of(&self, post: &PostRecord) -> u64 {
        match self {
            Metric::LikeCount => post.like_count,
            Metric::TotalReactions => post.total_reactions,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown metric: {0}")]
pub struct UnknownMetric(pub String);

impl FromStr for Metric {
    type Err = UnknownMetric;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Like Count" | "like_count" | "like-count" => Ok(Metric::LikeCount),
            "Total Reactions" | "total_reactions" | "total-reactions" => Ok(Metric::TotalReactions),
            other => Err(UnknownMetric(other.to_string())),
        }
    }
}

/// Load the store, turning any failure into the matching notice.
fn load_posts(store: &dyn PostStore, missing_message: &str) -> Result<Vec<PostRecord>, Notice> {
    store.load().map_err(|e| match e {
        StoreError::Missing => Notice::with_empty_posts(missing_message),
        StoreError::Corrupt(err) => {
            tracing::warn!(location = %store.location(), error = %err, "store is corrupted");
            Notice::with_empty_posts(MSG_CORRUPT)
        }
        StoreError::Io(err) => {
            tracing::warn!(location = %store.location(), error = %err, "store read failed");
            Notice::with_empty_posts(format!("Error reading data file: {}", err))
        }
    })
}

/// First [`PAGE_SIZE`] of `matches`, with the full count and overflow flag.
fn window(matches: Vec<PostRecord>) -> (usize, Vec<PostRecord>, bool) {
    let total = matches.len();
    let mut posts = matches;
    posts.truncate(PAGE_SIZE);
    (total, posts, total > PAGE_SIZE)
}

/// Posts `[start, start + limit)` in stored order, `limit` capped at
/// [`PAGE_SIZE`].
///
/// A `start` past the end yields an empty page.
pub fn get_saved_posts(store: &dyn PostStore, start: usize, limit: usize) -> QueryOutcome<Page> {
    let all = match load_posts(store, MSG_NO_DATA_PAGINATE) {
        Ok(p) => p,
        Err(notice) => return QueryOutcome::Reported(notice),
    };

    let total_posts = all.len();
    let limit = limit.min(PAGE_SIZE);
    let posts: Vec<PostRecord> = all.into_iter().skip(start).take(limit).collect();

    QueryOutcome::Found(Page {
        posts,
        total_posts,
        has_more: start.saturating_add(limit) < total_posts,
    })
}

/// Posts whose text contains `keyword`, ignoring case.
pub fn search_posts(store: &dyn PostStore, keyword: &str) -> QueryOutcome<SearchResults> {
    let all = match load_posts(store, MSG_NO_DATA) {
        Ok(p) => p,
        Err(notice) => return QueryOutcome::Reported(notice),
    };
    if all.is_empty() {
        return QueryOutcome::Reported(Notice::with_empty_posts(MSG_NO_DATA));
    }

    let needle = keyword.to_lowercase();
    let matches: Vec<PostRecord> = all
        .into_iter()
        .filter(|p| p.text.to_lowercase().contains(&needle))
        .collect();

    let (total_results, posts, has_more) = window(matches);
    QueryOutcome::Found(SearchResults {
        keyword: keyword.to_string(),
        total_results,
        posts,
        has_more,
    })
}

/// The `top_n` posts by `metric`, highest first.
///
/// Ties keep their stored order. `top_n <= 0` returns no posts.
pub fn get_top_posts(store: &dyn PostStore, metric: &str, top_n: i64) -> QueryOutcome<TopPosts> {
    let mut posts = match load_posts(store, MSG_NO_DATA) {
        Ok(p) => p,
        Err(notice) => return QueryOutcome::Reported(notice),
    };

    let metric: Metric = match metric.parse() {
        Ok(m) => m,
        Err(_) => return QueryOutcome::Reported(Notice::message_only(MSG_INVALID_METRIC)),
    };

    // sort_by_key is stable
    posts.sort_by_key(|p| Reverse(metric.value_of(p)));
    posts.truncate(usize::try_from(top_n).unwrap_or(0));

    QueryOutcome::Found(TopPosts { metric, posts })
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).ok()
}

/// Posts with `start_date <= Posted Date <= end_date`.
///
/// Bounds that are not `YYYY-MM-DD` are reported. Stored posts whose date
/// does not parse are left out of the results.
pub fn get_posts_by_date(
    store: &dyn PostStore,
    start_date: &str,
    end_date: &str,
) -> QueryOutcome<DateRangeResults> {
    let all = match load_posts(store, MSG_NO_DATA) {
        Ok(p) => p,
        Err(notice) => return QueryOutcome::Reported(notice),
    };

    let (start, end) = match (parse_date(start_date), parse_date(end_date)) {
        (Some(s), Some(e)) => (s, e),
        _ => return QueryOutcome::Reported(Notice::message_only(MSG_INVALID_DATE)),
    };

    let mut skipped = 0usize;
    let matches: Vec<PostRecord> = all
        .into_iter()
        .filter(|p| match parse_date(&p.posted_date) {
            Some(d) => start <= d && d <= end,
            None => {
                skipped += 1;
                false
            }
        })
        .collect();

    if skipped > 0 {
        tracing::warn!(skipped, "posts with unparseable dates left out of range query");
    }

    let (total_results, posts, has_more) = window(matches);
    QueryOutcome::Found(DateRangeResults {
        start_date: start_date.to_string(),
        end_date: end_date.to_string(),
        total_results,
        posts,
        has_more,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use serde_json::json;

    fn post(text: &str, likes: u64, reactions: u64, date: &str) -> PostRecord {
        PostRecord {
            post_url: format!("https://example.com/{}", text),
            text: text.to_string(),
            like_count: likes,
            total_reactions: reactions,
            posted_date: date.to_string(),
            ..Default::default()
        }
    }

    fn three() -> InMemoryStore {
        InMemoryStore::with_posts(vec![
            post("one", 1, 10, "2024-01-01"),
            post("two", 2, 20, "2024-01-02"),
            post("three", 3, 30, "2024-01-03"),
        ])
    }

    fn many(n: usize) -> InMemoryStore {
        InMemoryStore::with_posts(
            (0..n)
                .map(|i| post(&format!("Rust post {}", i), i as u64, 0, "2024-03-10"))
                .collect(),
        )
    }

    // ── get_saved_posts ──

    #[test]
    fn test_limit_is_clamped() {
        let page = get_saved_posts(&three(), 0, 100).found().unwrap();
        assert_eq!(page.posts.len(), 3);
        assert_eq!(page.total_posts, 3);
        assert!(!page.has_more);

        let page = get_saved_posts(&many(12), 0, 100).found().unwrap();
        assert_eq!(page.posts.len(), PAGE_SIZE);
        assert!(page.has_more);
    }

    #[test]
    fn test_start_past_end_is_empty() {
        let page = get_saved_posts(&three(), 10, 5).found().unwrap();
        assert!(page.posts.is_empty());
        assert_eq!(page.total_posts, 3);
        assert!(!page.has_more);
    }

    #[test]
    fn test_pages_in_order() {
        let store = many(7);
        let first = get_saved_posts(&store, 0, 5).found().unwrap();
        assert!(first.has_more);
        let second = get_saved_posts(&store, 5, 5).found().unwrap();
        assert_eq!(second.posts.len(), 2);
        assert_eq!(second.posts[0].text, "Rust post 5");
        assert!(!second.has_more);
    }

    #[test]
    fn test_missing_store_reported() {
        let outcome = get_saved_posts(&InMemoryStore::new(), 0, 5);
        assert!(outcome.is_reported());
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["posts"], json!([]));
        assert!(value["message"].as_str().unwrap().contains("No data found"));
    }

    #[test]
    fn test_corrupt_store_reported() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("posts.json");
        std::fs::write(&path, "not json").unwrap();
        let store = crate::store::JsonFileStore::new(&path);

        let notice = get_saved_posts(&store, 0, 5).notice().cloned().unwrap();
        assert_eq!(notice.message, MSG_CORRUPT);
        assert_eq!(notice.posts, Some(vec![]));

        assert!(search_posts(&store, "x").is_reported());
        assert!(get_top_posts(&store, "Like Count", 5).is_reported());
        assert!(get_posts_by_date(&store, "2024-01-01", "2024-01-31").is_reported());
    }

    #[test]
    fn test_page_shape() {
        let value = serde_json::to_value(get_saved_posts(&three(), 1, 1)).unwrap();
        assert_eq!(value["total_posts"], json!(3));
        assert_eq!(value["has_more"], json!(true));
        assert_eq!(value["posts"][0]["Text"], json!("two"));
        assert!(value.get("message").is_none());
    }

    // ── search_posts ──

    #[test]
    fn test_search_is_case_insensitive() {
        let store = InMemoryStore::with_posts(vec![
            post("ABCdef", 0, 0, "2024-01-01"),
            post("nothing here", 0, 0, "2024-01-01"),
        ]);
        let results = search_posts(&store, "abc").found().unwrap();
        assert_eq!(results.keyword, "abc");
        assert_eq!(results.total_results, 1);
        assert_eq!(results.posts[0].text, "ABCdef");
        assert!(!results.has_more);
    }

    #[test]
    fn test_search_only_looks_at_text() {
        let mut p = post("plain", 0, 0, "2024-01-01");
        p.author_name = "Keyword Person".to_string();
        let results = search_posts(&InMemoryStore::with_posts(vec![p]), "keyword")
            .found()
            .unwrap();
        assert_eq!(results.total_results, 0);
    }

    #[test]
    fn test_search_counts_all_matches() {
        let results = search_posts(&many(8), "rust").found().unwrap();
        assert_eq!(results.total_results, 8);
        assert_eq!(results.posts.len(), PAGE_SIZE);
        assert!(results.has_more);
    }

    #[test]
    fn test_search_empty_or_missing_store() {
        assert!(search_posts(&InMemoryStore::new(), "x").is_reported());
        assert!(search_posts(&InMemoryStore::with_posts(vec![]), "x").is_reported());
    }

    // ── get_top_posts ──

    #[test]
    fn test_top_is_stable_on_ties() {
        let store = InMemoryStore::with_posts(vec![
            post("a", 5, 0, "2024-01-01"),
            post("b", 5, 0, "2024-01-01"),
            post("c", 3, 0, "2024-01-01"),
        ]);
        let top = get_top_posts(&store, "Like Count", 2).found().unwrap();
        assert_eq!(top.metric, Metric::LikeCount);
        let texts: Vec<&str> = top.posts.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b"]);
    }

    #[test]
    fn test_top_by_reactions_descending() {
        let top = get_top_posts(&three(), "Total Reactions", 5).found().unwrap();
        let reactions: Vec<u64> = top.posts.iter().map(|p| p.total_reactions).collect();
        assert_eq!(reactions, vec![30, 20, 10]);

        let value = serde_json::to_value(get_top_posts(&three(), "total_reactions", 1)).unwrap();
        assert_eq!(value["metric"], json!("Total Reactions"));
    }

    #[test]
    fn test_top_n_not_clamped() {
        let top = get_top_posts(&many(9), "Like Count", 8).found().unwrap();
        assert_eq!(top.posts.len(), 8);
        assert_eq!(top.posts[0].like_count, 8);
    }

    #[test]
    fn test_top_n_non_positive_is_empty() {
        assert!(get_top_posts(&three(), "Like Count", 0).found().unwrap().posts.is_empty());
        assert!(get_top_posts(&three(), "Like Count", -3).found().unwrap().posts.is_empty());
    }

    #[test]
    fn test_invalid_metric_reported() {
        let outcome = get_top_posts(&three(), "bogus", 5);
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value, json!({ "message": MSG_INVALID_METRIC }));
    }

    // ── get_posts_by_date ──

    #[test]
    fn test_date_range_inclusive() {
        let store = InMemoryStore::with_posts(vec![
            post("dec", 0, 0, "2023-12-31"),
            post("mid", 0, 0, "2024-01-15"),
            post("feb", 0, 0, "2024-02-01"),
        ]);
        let results = get_posts_by_date(&store, "2024-01-01", "2024-01-31")
            .found()
            .unwrap();
        assert_eq!(results.total_results, 1);
        assert_eq!(results.posts[0].text, "mid");
        assert!(!results.has_more);

        let results = get_posts_by_date(&store, "2023-12-31", "2024-02-01")
            .found()
            .unwrap();
        assert_eq!(results.total_results, 3);
    }

    #[test]
    fn test_invalid_bound_reported() {
        let outcome = get_posts_by_date(&three(), "bad", "2024-01-31");
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value, json!({ "message": MSG_INVALID_DATE }));
        assert!(get_posts_by_date(&three(), "2024-01-01", "2024-13-01").is_reported());
    }

    #[test]
    fn test_malformed_post_date_skipped() {
        let store = InMemoryStore::with_posts(vec![
            post("good", 0, 0, "2024-01-02"),
            post("bad", 0, 0, "2 days ago"),
            post("blank", 0, 0, ""),
        ]);
        let results = get_posts_by_date(&store, "2024-01-01", "2024-01-31")
            .found()
            .unwrap();
        assert_eq!(results.total_results, 1);
        assert_eq!(results.posts[0].text, "good");
    }

    #[test]
    fn test_date_range_windowed() {
        let results = get_posts_by_date(&many(6), "2024-03-01", "2024-03-31")
            .found()
            .unwrap();
        assert_eq!(results.total_results, 6);
        assert_eq!(results.posts.len(), PAGE_SIZE);
        assert!(results.has_more);
    }

    #[test]
    fn test_metric_parsing() {
        assert_eq!("Like Count".parse::<Metric>().unwrap(), Metric::LikeCount);
        assert_eq!("like-count".parse::<Metric>().unwrap(), Metric::LikeCount);
        assert_eq!("Total Reactions".parse::<Metric>().unwrap(), Metric::TotalReactions);
        assert!("likes".parse::<Metric>().is_err());
        assert_eq!(
            "likes".parse::<Metric>().unwrap_err().to_string(),
            "unknown metric: likes"
        );
    }

    #[test]
    fn test_file_with_nulls_is_queryable() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("linkedin_posts.json");
        std::fs::write(
            &path,
            r#"[
    {"Text": null, "Like Count": null, "Total Reactions": 4, "Posted Date": "2024-01-15"},
    {"Text": "rust", "Like Count": 2, "Total Reactions": 9, "Posted Date": "2024-01-20"}
]"#,
        )
        .unwrap();
        let store = crate::store::JsonFileStore::new(&path);

        let page = get_saved_posts(&store, 0, 5).found().unwrap();
        assert_eq!(page.total_posts, 2);

        let top = get_top_posts(&store, "Total Reactions", 5).found().unwrap();
        let reactions: Vec<u64> = top.posts.iter().map(|p| p.total_reactions).collect();
        assert_eq!(reactions, vec![9, 4]);
    }
}
