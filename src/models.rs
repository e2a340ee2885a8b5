//! Post records and the raw API payload they are normalized from.
//!
//! [`PostRecord`] is the unit of storage. Its JSON keys are the
//! human-readable names used in the store file (`"Post URL"`,
//! `"Like Count"`, ...), which is also how ranking metrics are named.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One normalized post, as persisted in the store.
///
/// A `null` value reads as the field's default, the same as a missing key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    #[serde(rename = "Post URL", default, deserialize_with = "null_as_default")]
    pub post_url: String,
    #[serde(rename = "Text", default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(rename = "Like Count", default, deserialize_with = "null_as_default")]
    pub like_count: u64,
    #[serde(rename = "Total Reactions", default, deserialize_with = "null_as_default")]
    pub total_reactions: u64,
    /// `YYYY-MM-DD`.
    #[serde(rename = "Posted Date", default, deserialize_with = "null_as_default")]
    pub posted_date: String,
    /// Opaque, stored as received.
    #[serde(rename = "Posted Timestamp", default = "empty_value")]
    pub posted_timestamp: Value,
    #[serde(rename = "Share URL", default, deserialize_with = "null_as_default")]
    pub share_url: String,
    #[serde(rename = "Author Name", default, deserialize_with = "null_as_default")]
    pub author_name: String,
    #[serde(rename = "Author Profile", default, deserialize_with = "null_as_default")]
    pub author_profile: String,
    #[serde(rename = "Author Headline", default, deserialize_with = "null_as_default")]
    pub author_headline: String,
    #[serde(rename = "Author Profile Picture", default, deserialize_with = "null_as_default")]
    pub author_profile_picture: String,
    #[serde(rename = "Main Image", default, deserialize_with = "null_as_default")]
    pub main_image: String,
    /// Comma-space joined.
    #[serde(rename = "All Images", default, deserialize_with = "null_as_default")]
    pub all_images: String,
}

fn empty_value() -> Value {
    Value::String(String::new())
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl Default for PostRecord {
    fn default() -> Self {
        Self {
            post_url: String::new(),
            text: String::new(),
            like_count: 0,
            total_reactions: 0,
            posted_date: String::new(),
            posted_timestamp: empty_value(),
            share_url: String::new(),
            author_name: String::new(),
            author_profile: String::new(),
            author_headline: String::new(),
            author_profile_picture: String::new(),
            main_image: String::new(),
            all_images: String::new(),
        }
    }
}

/// Top-level body returned by the posts endpoint.
///
/// Only `data` is read; a missing or `null` list means no posts.
#[derive(Debug, Default, Deserialize)]
pub struct PostsPayload {
    #[serde(default)]
    pub data: Option<Vec<RawPost>>,
}

/// A post as returned by the API. Every field may be absent or `null`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPost {
    #[serde(default)]
    pub post_url: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub like_count: Option<u64>,
    #[serde(default)]
    pub total_reaction_count: Option<u64>,
    #[serde(default)]
    pub posted_date: Option<String>,
    #[serde(default)]
    pub posted_date_timestamp: Option<Value>,
    #[serde(default)]
    pub share_url: Option<String>,
    #[serde(default)]
    pub author: Option<RawAuthor>,
    #[serde(default)]
    pub image: Option<Vec<RawImage>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAuthor {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub profile_pictures: Option<Vec<RawImage>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawImage {
    #[serde(default)]
    pub url: Option<String>,
}

impl RawImage {
    fn url(&self) -> &str {
        self.url.as_deref().unwrap_or("")
    }
}

impl From<RawPost> for PostRecord {
    fn from(raw: RawPost) -> Self {
        let author = raw.author.unwrap_or_default();
        let images = raw.image.unwrap_or_default();

        let author_name = format!(
            "{} {}",
            author.first_name.as_deref().unwrap_or(""),
            author.last_name.as_deref().unwrap_or("")
        );
        let author_profile_picture = author
            .profile_pictures
            .as_deref()
            .and_then(|pics| pics.first())
            .map(|p| p.url().to_string())
            .unwrap_or_default();
        let main_image = images
            .first()
            .map(|img| img.url().to_string())
            .unwrap_or_default();
        let all_images = images
            .iter()
            .map(RawImage::url)
            .collect::<Vec<_>>()
            .join(", ");

        PostRecord {
            post_url: raw.post_url.unwrap_or_default(),
            text: raw.text.unwrap_or_default(),
            like_count: raw.like_count.unwrap_or(0),
            total_reactions: raw.total_reaction_count.unwrap_or(0),
            posted_date: raw.posted_date.unwrap_or_default(),
            posted_timestamp: raw.posted_date_timestamp.unwrap_or_else(empty_value),
            share_url: raw.share_url.unwrap_or_default(),
            author_name,
            author_profile: author.url.unwrap_or_default(),
            author_headline: author.headline.unwrap_or_default(),
            author_profile_picture,
            main_image,
            all_images,
        }
    }
}

impl PostsPayload {
    /// Normalize every raw post, preserving response order.
    pub fn into_records(self) -> Vec<PostRecord> {
        self.data
            .unwrap_or_default()
            .into_iter()
            .map(PostRecord::from)
            .collect()
    }
}
