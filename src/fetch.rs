//! Content fetching.
//!
//! Stage 1 of the build pipeline. Pulls everything the site needs from the
//! content source and writes it to a manifest the generate stage consumes.
//!
//! ## Steps
//!
//! 1. **Listing**: the first listing page seeds a [`PaginationState`], which is
//!    then grown one `load_next_page` at a time until the cursor runs out.
//!    The item count after every step is recorded so the generator can
//!    render each intermediate listing state.
//! 2. **Paths**: every post uid is collected with a larger page size, again
//!    by following cursors.
//! 3. **Posts**: each uid is resolved to its full document, and its older and
//!    newer neighbors are looked up with `after` cursors. A uid that no longer
//!    resolves is logged and skipped.
//!
//! Requests are issued one at a time.

use crate::client::{self, ContentError, ContentSource, Direction, Ordering, Query};
use crate::config::SiteConfig;
use crate::pagination::PaginationState;
use crate::preview::PreviewMode;
use crate::types::{Post, PostLink};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("content API error: {0}")]
    Content(#[from] ContentError),
}

/// Everything the generate stage needs, as fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub preview: PreviewMode,
    pub listing: Listing,
    pub posts: Vec<PostEntry>,
    pub config: SiteConfig,
}

/// The fully loaded listing plus the item count after each page load.
///
/// `steps[0]` is the size of the seeded first page; `steps[n]` the size
/// after the n-th `load_next_page`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub state: PaginationState,
    pub steps: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostEntry {
    pub post: Post,
    /// The closest older post.
    pub previous: Option<PostLink>,
    /// The closest newer post.
    pub next: Option<PostLink>,
}

/// Content problems worth reporting; none of them stop a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentWarning {
    /// Two sections of a post share a heading.
    DuplicateHeading { uid: String, heading: String },
    MissingPublicationDate { uid: String },
    EmptyContent { uid: String },
}

impl std::fmt::Display for ContentWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateHeading { uid, heading } => {
                write!(f, "{uid}: heading \"{heading}\" is used by more than one section")
            }
            Self::MissingPublicationDate { uid } => write!(f, "{uid}: no publication date"),
            Self::EmptyContent { uid } => write!(f, "{uid}: post has no content"),
        }
    }
}

fn newest_first() -> Ordering {
    Ordering::by_first_publication(Direction::Descending)
}

/// Run the fetch stage against `source`.
pub async fn fetch(
    source: &dyn ContentSource,
    config: &SiteConfig,
    preview: PreviewMode,
) -> Result<Manifest, FetchError> {
    let doc_type = config.api.document_type.as_str();

    let listing = load_listing(source, doc_type, config.api.listing_page_size).await?;
    info!(
        "listing: {} posts over {} pages",
        listing.state.items().len(),
        listing.steps.len()
    );

    let uids = collect_uids(source, doc_type, config.api.paths_page_size).await?;
    info!("found {} post paths", uids.len());

    let mut posts = Vec::with_capacity(uids.len());
    for uid in &uids {
        let Some(post) = source.get_by_uid(doc_type, uid).await? else {
            warn!("post {uid} is listed but could not be found, skipping");
            continue;
        };
        let (previous, next) = client::neighbors(source, doc_type, &post.id).await?;
        posts.push(PostEntry {
            previous: previous.as_ref().map(PostLink::from).filter(|l| is_slug(&l.uid)),
            next: next.as_ref().map(PostLink::from).filter(|l| is_slug(&l.uid)),
            post,
        });
    }

    Ok(Manifest {
        preview,
        listing,
        posts,
        config: config.clone(),
    })
}

/// Seed the listing and load pages until the cursor is exhausted.
pub async fn load_listing(
    source: &dyn ContentSource,
    doc_type: &str,
    page_size: u32,
) -> Result<Listing, ContentError> {
    let query = Query::of_type(doc_type, page_size)
        .listing_fields()
        .ordered(newest_first());
    let mut state = PaginationState::seed(source.query(&query).await?);
    let mut steps = vec![state.items().len()];
    let mut followed = HashSet::new();
    while state.has_more() {
        state = follow_cursor(&state, source, &mut followed).await?;
        steps.push(state.items().len());
    }
    Ok(Listing { state, steps })
}

/// Collect every post uid, newest first, without duplicates.
///
/// Uids end up in output paths, so anything that is not a slug is skipped.
pub async fn collect_uids(
    source: &dyn ContentSource,
    doc_type: &str,
    page_size: u32,
) -> Result<Vec<String>, ContentError> {
    let query = Query::of_type(doc_type, page_size)
        .listing_fields()
        .ordered(newest_first());
    let mut state = PaginationState::seed(source.query(&query).await?);
    let mut followed = HashSet::new();
    while state.has_more() {
        state = follow_cursor(&state, source, &mut followed).await?;
    }
    let mut seen = HashSet::new();
    let mut uids = Vec::new();
    for item in state.items() {
        if !is_slug(&item.uid) {
            warn!("skipping post with unusable uid {:?}", item.uid);
            continue;
        }
        if seen.insert(item.uid.as_str()) {
            uids.push(item.uid.clone());
        }
    }
    Ok(uids)
}

/// Load the next page, failing if its cursor was already followed.
async fn follow_cursor(
    state: &PaginationState,
    source: &dyn ContentSource,
    followed: &mut HashSet<String>,
) -> Result<PaginationState, ContentError> {
    if let Some(cursor) = state.next_page() {
        if !followed.insert(cursor.to_string()) {
            return Err(ContentError::RepeatedCursor(cursor.to_string()));
        }
    }
    state.load_next_page(source).await
}

/// True for a non-empty uid made of ASCII letters, digits, `-` and `_`.
pub fn is_slug(uid: &str) -> bool {
    !uid.is_empty()
        && uid
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Inspect fetched posts for content problems.
pub fn check_posts(posts: &[PostEntry]) -> Vec<ContentWarning> {
    let mut warnings = Vec::new();
    for entry in posts {
        let post = &entry.post;
        if post.first_publication_date.is_none() {
            warnings.push(ContentWarning::MissingPublicationDate {
                uid: post.uid.clone(),
            });
        }
        if post.data.content.is_empty() {
            warnings.push(ContentWarning::EmptyContent {
                uid: post.uid.clone(),
            });
        }
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for block in &post.data.content {
            let heading = block.heading.trim();
            if !heading.is_empty() {
                *counts.entry(heading).or_default() += 1;
            }
        }
        let mut duplicates: Vec<&str> = counts
            .into_iter()
            .filter(|(_, n)| *n > 1)
            .map(|(heading, _)| heading)
            .collect();
        duplicates.sort_unstable();
        warnings.extend(duplicates.into_iter().map(|heading| {
            ContentWarning::DuplicateHeading {
                uid: post.uid.clone(),
                heading: heading.to_string(),
            }
        }));
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ContentBlock, PostData, SearchResponse};

    /// Answers the listing query with `first` and every cursor with `rest`.
    struct CursorSource {
        first: SearchResponse,
        rest: SearchResponse,
    }

    #[async_trait::async_trait]
    impl ContentSource for CursorSource {
        async fn query(&self, _query: &Query) -> Result<SearchResponse, ContentError> {
            Ok(self.first.clone())
        }

        async fn fetch_page(&self, _cursor: &str) -> Result<SearchResponse, ContentError> {
            Ok(self.rest.clone())
        }

        async fn get_by_uid(&self, _: &str, _: &str) -> Result<Option<Post>, ContentError> {
            Ok(None)
        }
    }

    fn listing_page(uids: &[&str], next: Option<&str>) -> SearchResponse {
        SearchResponse {
            results: uids.iter().map(|uid| entry(uid, &[]).post).collect(),
            next_page: next.map(str::to_string),
            ..SearchResponse::default()
        }
    }

    fn entry(uid: &str, headings: &[&str]) -> PostEntry {
        PostEntry {
            post: Post {
                id: uid.to_string(),
                uid: uid.to_string(),
                first_publication_date: Some("2021-03-15T19:25:28+0000".to_string()),
                last_publication_date: None,
                data: PostData {
                    content: headings
                        .iter()
                        .map(|h| ContentBlock {
                            heading: h.to_string(),
                            body: Vec::new(),
                        })
                        .collect(),
                    ..PostData::default()
                },
            },
            previous: None,
            next: None,
        }
    }

    #[test]
    fn clean_posts_have_no_warnings() {
        assert!(check_posts(&[entry("a", &["One", "Two"])]).is_empty());
    }

    #[test]
    fn duplicate_headings_are_reported_once() {
        let warnings = check_posts(&[entry("a", &["Intro", "Body", "Intro", "Intro"])]);
        assert_eq!(
            warnings,
            vec![ContentWarning::DuplicateHeading {
                uid: "a".to_string(),
                heading: "Intro".to_string(),
            }]
        );
    }

    #[test]
    fn missing_date_and_empty_content_are_reported() {
        let mut e = entry("b", &[]);
        e.post.first_publication_date = None;
        let warnings = check_posts(&[e]);
        assert!(warnings.contains(&ContentWarning::MissingPublicationDate {
            uid: "b".to_string()
        }));
        assert!(warnings.contains(&ContentWarning::EmptyContent {
            uid: "b".to_string()
        }));
    }

    #[test]
    fn warning_messages_name_the_post() {
        let warning = ContentWarning::DuplicateHeading {
            uid: "a".to_string(),
            heading: "Intro".to_string(),
        };
        assert_eq!(
            warning.to_string(),
            "a: heading \"Intro\" is used by more than one section"
        );
    }

    #[tokio::test]
    async fn repeated_cursor_stops_the_listing() {
        let source = CursorSource {
            first: listing_page(&["a"], Some("loop")),
            rest: listing_page(&["b"], Some("loop")),
        };
        let err = load_listing(&source, "posts", 5).await.unwrap_err();
        assert!(matches!(err, ContentError::RepeatedCursor(ref c) if c == "loop"));

        let err = collect_uids(&source, "posts", 100).await.unwrap_err();
        assert!(matches!(err, ContentError::RepeatedCursor(ref c) if c == "loop"));
    }

    #[tokio::test]
    async fn uids_that_are_not_slugs_are_skipped() {
        let source = CursorSource {
            first: listing_page(&["first-post", "../evil", "say\"hi", ""], Some("p2")),
            rest: listing_page(&["second_post", "first-post", "a/b"], None),
        };
        let uids = collect_uids(&source, "posts", 100).await.unwrap();
        assert_eq!(uids, ["first-post", "second_post"]);
    }

    #[test]
    fn slug_shapes() {
        assert!(is_slug("como-utilizar-hooks"));
        assert!(is_slug("post_2"));
        assert!(!is_slug(""));
        assert!(!is_slug(".."));
        assert!(!is_slug("a b"));
        assert!(!is_slug("x\"]]"));
    }

    #[test]
    fn manifest_json_omits_access_token() {
        let mut config = SiteConfig::default();
        config.api.access_token = Some("s3cr3t-token".to_string());
        let manifest = Manifest {
            preview: PreviewMode::default(),
            listing: Listing::default(),
            posts: vec![entry("a", &["One"])],
            config,
        };
        let json = serde_json::to_string_pretty(&manifest).unwrap();
        assert!(!json.contains("s3cr3t-token"));
        assert!(!json.contains("access_token"));

        let back: Manifest = serde_json::from_str(&json).unwrap();
        assert_eq!(back.config.api.access_token, None);
    }
}
