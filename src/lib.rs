//! # spacetraveling
//!
//! A static blog generator backed by a headless content API. Posts live in
//! the CMS; this crate pulls them down and writes a plain HTML site with a
//! paginated listing, one page per post with reading-time estimation,
//! prior/next navigation and a comment widget.
//!
//! # Architecture: Two-Stage Pipeline
//!
//! ```text
//! 1. Fetch     content API  →  manifest.json   (documents → structured data)
//! 2. Generate  manifest     →  dist/           (final HTML site)
//! ```
//!
//! The manifest is human-readable JSON, so a build can be inspected between
//! stages, and generation can be re-run without touching the network.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`fetch`] | Stage 1 — walks the listing and every post, produces the manifest |
//! | [`generate`] | Stage 2 — renders the HTML site from the manifest using Maud |
//! | [`client`] | `ContentSource` trait and the reqwest-backed API client |
//! | [`pagination`] | Incremental listing state grown one page load at a time |
//! | [`reading_time`] | Word counting and reading-time estimation |
//! | [`richtext`] | Rich text → plain text and sanitized HTML |
//! | [`comments`] | Comment widget embed held as a scoped resource |
//! | [`preview`] | Draft preview builds |
//! | [`config`] | `config.toml` loading, validation, merging, and CSS generation |
//! | [`types`] | Content API documents shared between stages |
//! | [`output`] | CLI output formatting |
//! | [`logging`] | Terminal logger setup |
//!
//! # Design Decisions
//!
//! ## Listing Pages Are Pre-Rendered States
//!
//! The listing grows by "load more" steps. Instead of shipping a script that
//! appends posts in the browser, every intermediate listing state is rendered
//! to its own page: `/` has the first page of posts, `/page/2/` the first two
//! pages, and so on. Each state comes from
//! [`pagination::PaginationState::load_next_page`], the same operation a
//! live client would run.
//!
//! ## Sections Are Keyed by Position
//!
//! Post sections get `section-N` anchors. Headings are editor-controlled and
//! nothing guarantees they are unique; `check` reports duplicates.

pub mod client;
pub mod comments;
pub mod config;
pub mod fetch;
pub mod generate;
pub mod logging;
pub mod output;
pub mod pagination;
pub mod preview;
pub mod reading_time;
pub mod richtext;
pub mod types;
