//! Shared types used across both pipeline stages.
//!
//! These mirror the content API's JSON documents. They are deserialized from
//! the API in the fetch stage, written to the manifest, and read back by the
//! generate stage, so every field must round-trip through serde unchanged.
//!
//! Content coming from an editor is not trusted to be well-formed: missing
//! strings become empty, a `null` heading becomes `""`, and a rich-text block
//! that does not match the expected shape becomes an empty block instead of
//! failing the whole document.

use serde::{Deserialize, Deserializer, Serialize};

/// A blog post document as returned by the content API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Document id. Used as the `after` cursor for neighbor lookups.
    #[serde(default)]
    pub id: String,
    /// Stable slug, unique per post.
    #[serde(default, deserialize_with = "null_as_default")]
    pub uid: String,
    #[serde(default)]
    pub first_publication_date: Option<String>,
    #[serde(default)]
    pub last_publication_date: Option<String>,
    #[serde(default)]
    pub data: PostData,
}

/// The editable fields of a post.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subtitle: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner: Option<Banner>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Banner {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub alt: Option<String>,
}

/// One section of a post: a heading followed by rich-text body.
///
/// Blocks have no identity beyond their position. Headings are not
/// guaranteed to be unique within a post.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(default, deserialize_with = "null_as_default")]
    pub heading: String,
    #[serde(default, deserialize_with = "lenient_rich_text")]
    pub body: Vec<RichTextBlock>,
}

/// A structured rich-text block (paragraph, heading, list item, image...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RichTextBlock {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub spans: Vec<Span>,
    /// Image URL, only present on `image` blocks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

/// Inline formatting over a character range of a block's text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<SpanData>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpanData {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

/// One page of search results from the content API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub results: Vec<Post>,
    /// Opaque cursor URL for the following page; `None` once exhausted.
    #[serde(default)]
    pub next_page: Option<String>,
}

/// The listing projection of a post.
///
/// Items seeded from the first page and items appended by later page loads
/// share this exact shape, so the listing renderer never needs to know where
/// an item came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    pub uid: String,
    pub first_publication_date: Option<String>,
    pub data: PostData,
}

impl From<Post> for PostSummary {
    fn from(post: Post) -> Self {
        Self {
            uid: post.uid,
            first_publication_date: post.first_publication_date,
            data: post.data,
        }
    }
}

/// A link to a neighboring post, as shown in the prior/next navigation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostLink {
    pub uid: String,
    pub title: String,
}

impl From<&Post> for PostLink {
    fn from(post: &Post) -> Self {
        Self {
            uid: post.uid.clone(),
            title: post.data.title.clone(),
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Deserialize a rich-text array, turning malformed entries into empty blocks.
fn lenient_rich_text<'de, D>(deserializer: D) -> Result<Vec<RichTextBlock>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    let blocks = match raw {
        Some(serde_json::Value::Array(items)) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).unwrap_or_default())
            .collect(),
        _ => Vec::new(),
    };
    Ok(blocks)
}
