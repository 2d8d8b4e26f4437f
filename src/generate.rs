//! HTML site generation.
//!
//! Stage 2 of the build pipeline. Takes the fetch manifest and generates the
//! final static HTML site.
//!
//! ## Generated Pages
//!
//! - **Listing** (`/index.html`, `/page/{n}/index.html`): one page per
//!   listing state. Page `n` shows every post loaded after `n` page loads, and
//!   its "load more" button leads to page `n + 1` while posts remain.
//! - **Posts** (`/post/{uid}/index.html`): banner, meta line with date, author
//!   and reading time, an "edited" line when the post changed after first
//!   publication, content sections, prior/next navigation and comments.
//! - **Not found** (`/404.html`).
//!
//! ## Output Structure
//!
//! ```text
//! dist/
//! ├── index.html
//! ├── 404.html
//! ├── page/
//! │   └── 2/index.html
//! └── post/
//!     ├── como-utilizar-hooks/index.html
//!     └── criando-um-app-cra-do-zero/index.html
//! ```
//!
//! ## HTML Generation
//!
//! Uses [maud](https://maud.lambda.xyz/) for compile-time HTML templating.
//! Templates are type-safe Rust code with automatic XSS escaping. Post bodies
//! come from [`richtext::as_html`], which escapes on its own.

use crate::comments::{CommentSlot, MarkupHost};
use crate::config::{self, SiteConfig};
use crate::fetch::{Manifest, PostEntry};
use crate::preview::{self, PreviewMode};
use crate::reading_time;
use crate::richtext;
use crate::types::{PostLink, PostSummary};
use chrono::{DateTime, FixedOffset};
use log::debug;
use maud::{DOCTYPE, Markup, PreEscaped, html};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// What the generate stage wrote, for CLI output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateReport {
    /// Output paths of listing pages, in order.
    pub listing_pages: Vec<String>,
    pub posts: Vec<GeneratedPost>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedPost {
    pub title: String,
    pub path: String,
    pub reading_minutes: usize,
}

const CSS_STATIC: &str = include_str!("../static/style.css");

/// Read a manifest file and render the site into `output_dir`.
pub fn generate(manifest_path: &Path, output_dir: &Path) -> Result<GenerateReport, GenerateError> {
    let manifest_content = fs::read_to_string(manifest_path)?;
    let manifest: Manifest = serde_json::from_str(&manifest_content)?;
    render_site(&manifest, output_dir)
}

/// Render every page of `manifest` into `output_dir`.
pub fn render_site(manifest: &Manifest, output_dir: &Path) -> Result<GenerateReport, GenerateError> {
    let config = &manifest.config;
    let css = format!("{}\n\n{}", config::generate_color_css(&config.colors), CSS_STATIC);
    let page = PageContext {
        config,
        preview: &manifest.preview,
        css: &css,
    };
    let mut report = GenerateReport::default();

    fs::create_dir_all(output_dir)?;

    for number in 1..=listing_steps(manifest).len() {
        let rel = listing_path(number);
        let html = render_listing(&page, manifest, number);
        write_page(output_dir, &rel, html)?;
        report.listing_pages.push(rel);
    }

    // One slot for the whole run: each post page re-keys the embed.
    let mut comments = CommentSlot::new(MarkupHost::default(), config.comments.clone());
    for entry in &manifest.posts {
        comments.mount(&entry.post.uid);
        let minutes =
            reading_time::estimate_minutes_at(&entry.post.data.content, config.reading.words_per_minute);
        let rel = post_path(&entry.post.uid);
        let html = render_post(&page, entry, minutes, comments.host().render());
        write_page(output_dir, &rel, html)?;
        debug!("generated {rel}");
        report.posts.push(GeneratedPost {
            title: entry.post.data.title.clone(),
            path: rel,
            reading_minutes: minutes,
        });
    }
    comments.release();

    write_page(output_dir, "404.html", render_not_found(&page))?;

    Ok(report)
}

/// Item counts of every listing page; an empty listing still gets one page.
fn listing_steps(manifest: &Manifest) -> Vec<usize> {
    if manifest.listing.steps.is_empty() {
        vec![manifest.listing.state.items().len()]
    } else {
        manifest.listing.steps.clone()
    }
}

fn listing_path(number: usize) -> String {
    if number <= 1 {
        "index.html".to_string()
    } else {
        format!("page/{number}/index.html")
    }
}

fn listing_href(number: usize) -> String {
    if number <= 1 {
        "/".to_string()
    } else {
        format!("/page/{number}/")
    }
}

fn post_path(uid: &str) -> String {
    format!("post/{uid}/index.html")
}

fn post_href(uid: &str) -> String {
    format!("/post/{uid}/")
}

fn write_page(output_dir: &Path, rel: &str, html: Markup) -> std::io::Result<()> {
    let path = output_dir.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, html.into_string())
}

// ============================================================================
// Dates
// ============================================================================

const MONTHS_PT: [&str; 12] = [
    "jan", "fev", "mar", "abr", "mai", "jun", "jul", "ago", "set", "out", "nov", "dez",
];
const MONTHS_EN: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Parse an API timestamp (`2021-03-25T19:25:28+0000` or RFC 3339).
fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z")
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
}

fn month_name(date: &DateTime<FixedOffset>, lang: &str) -> &'static str {
    use chrono::Datelike;
    let months = if lang.to_ascii_lowercase().starts_with("pt") {
        &MONTHS_PT
    } else {
        &MONTHS_EN
    };
    months[date.month0() as usize]
}

/// `19 mar 2021`, or an empty string for a missing or unparseable date.
pub fn format_date(raw: Option<&str>, lang: &str) -> String {
    match raw.and_then(parse_timestamp) {
        Some(date) => format!(
            "{} {} {}",
            date.format("%d"),
            month_name(&date, lang),
            date.format("%Y")
        ),
        None => String::new(),
    }
}

/// The "edited" line, shown only when the post changed after publication.
fn edited_line(first: Option<&str>, last: Option<&str>, lang: &str) -> Option<String> {
    let first = parse_timestamp(first?)?;
    let last = parse_timestamp(last?)?;
    if last <= first {
        return None;
    }
    let day = format!("{} {} {}", last.format("%d"), month_name(&last, lang), last.format("%Y"));
    let time = last.format("%H:%M");
    if lang.to_ascii_lowercase().starts_with("pt") {
        Some(format!("* editado em {day}, às {time}"))
    } else {
        Some(format!("* edited on {day}, at {time}"))
    }
}

// ============================================================================
// HTML Components
// ============================================================================

struct PageContext<'a> {
    config: &'a SiteConfig,
    preview: &'a PreviewMode,
    css: &'a str,
}

/// Renders the base HTML document structure
fn base_document(page: &PageContext, title: &str, content: Markup) -> Markup {
    let full_title = if title.is_empty() {
        page.config.site.title.clone()
    } else {
        format!("{} | {}", title, page.config.site.title)
    };
    html! {
        (DOCTYPE)
        html lang=(page.config.site.lang) {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (full_title) }
                style { (PreEscaped(page.css)) }
            }
            body {
                (site_header(&page.config.site.title))
                (content)
                (preview::exit_control(page.preview, &page.config.preview.exit_url))
            }
        }
    }
}

/// Renders the site header: the logo linking back to the listing.
fn site_header(site_title: &str) -> Markup {
    html! {
        header.site-header {
            a.logo href="/" { (site_title) span.logo-dot { "." } }
        }
    }
}

/// Date, author and (optionally) reading time.
fn post_info(date: Option<&str>, author: &str, lang: &str, minutes: Option<usize>) -> Markup {
    html! {
        div.info {
            time { (format_date(date, lang)) }
            span.author { (author) }
            @if let Some(minutes) = minutes {
                span.reading-time { (minutes) " min" }
            }
        }
    }
}

// ============================================================================
// Page Renderers
// ============================================================================

/// Renders listing page `number` (1-based).
fn render_listing(page: &PageContext, manifest: &Manifest, number: usize) -> Markup {
    let steps = listing_steps(manifest);
    let all = manifest.listing.state.items();
    let shown = steps
        .get(number - 1)
        .copied()
        .unwrap_or(all.len())
        .min(all.len());
    let items: &[PostSummary] = &all[..shown];
    let has_more = number < steps.len();
    let lang = page.config.site.lang.as_str();

    let content = html! {
        main.listing {
            @for item in items {
                article.post-card {
                    a href=(post_href(&item.uid)) {
                        strong.post-title { (item.data.title) }
                    }
                    p.post-subtitle { (item.data.subtitle) }
                    (post_info(item.first_publication_date.as_deref(), &item.data.author, lang, None))
                }
            }
            @if has_more {
                div.load-more {
                    a.button href=(listing_href(number + 1)) { "Carregar mais posts" }
                }
            }
        }
    };

    let title = if number <= 1 { "Home".to_string() } else { format!("Página {number}") };
    base_document(page, &title, content)
}

/// Renders one post page.
fn render_post(page: &PageContext, entry: &PostEntry, minutes: usize, comments: Markup) -> Markup {
    let post = &entry.post;
    let lang = page.config.site.lang.as_str();
    let banner = post.data.banner.as_ref();
    let banner_url = banner.and_then(|b| b.url.as_deref()).filter(|u| !u.is_empty());
    let edited = edited_line(
        post.first_publication_date.as_deref(),
        post.last_publication_date.as_deref(),
        lang,
    );

    let content = html! {
        @if let Some(url) = banner_url {
            div.banner {
                img src=(url) alt=(banner.and_then(|b| b.alt.as_deref()).unwrap_or("banner"));
            }
        }
        main.post {
            article {
                header.post-header {
                    h1 { (post.data.title) }
                    (post_info(post.first_publication_date.as_deref(), &post.data.author, lang, Some(minutes)))
                    @if let Some(edited) = &edited {
                        p.edited { (edited) }
                    }
                }
                div.post-content {
                    @for (index, block) in post.data.content.iter().enumerate() {
                        section id={ "section-" (index + 1) } {
                            @if !block.heading.is_empty() {
                                h2 { (block.heading) }
                            }
                            div.section-body { (richtext::as_html(&block.body)) }
                        }
                    }
                }
            }
            (neighbor_nav(entry.previous.as_ref(), entry.next.as_ref()))
            (comments)
        }
    };

    base_document(page, &post.data.title, content)
}

/// Prior/next post navigation.
fn neighbor_nav(previous: Option<&PostLink>, next: Option<&PostLink>) -> Markup {
    html! {
        @if previous.is_some() || next.is_some() {
            nav.post-navigation {
                @if let Some(prev) = previous {
                    a.previous href=(post_href(&prev.uid)) {
                        span.nav-title { (prev.title) }
                        span.nav-label { "Post anterior" }
                    }
                }
                @if let Some(next) = next {
                    a.next href=(post_href(&next.uid)) {
                        span.nav-title { (next.title) }
                        span.nav-label { "Próximo post" }
                    }
                }
            }
        }
    }
}

fn render_not_found(page: &PageContext) -> Markup {
    let content = html! {
        main.not-found {
            h1 { "Post não encontrado" }
            a href="/" { "Voltar para a página inicial" }
        }
    };
    base_document(page, "404", content)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::Listing;
    use crate::pagination::PaginationState;
    use crate::types::{Banner, ContentBlock, Post, PostData, RichTextBlock, SearchResponse};
    use tempfile::TempDir;

    fn post(uid: &str, title: &str) -> Post {
        Post {
            id: format!("id-{uid}"),
            uid: uid.to_string(),
            first_publication_date: Some("2021-03-15T19:25:28+0000".to_string()),
            last_publication_date: Some("2021-03-15T19:25:28+0000".to_string()),
            data: PostData {
                title: title.to_string(),
                subtitle: format!("{title} subtitle"),
                author: "Joseph Oliveira".to_string(),
                banner: Some(Banner {
                    url: Some("https://images.example/banner.png".to_string()),
                    alt: None,
                }),
                content: vec![ContentBlock {
                    heading: "Proin et varius".to_string(),
                    body: vec![RichTextBlock {
                        kind: "paragraph".to_string(),
                        text: "Lorem ipsum dolor sit amet".to_string(),
                        ..RichTextBlock::default()
                    }],
                }],
            },
        }
    }

    fn manifest() -> Manifest {
        let first = SearchResponse {
            results: vec![post("a", "Post A")],
            next_page: Some("cursor-2".to_string()),
            ..SearchResponse::default()
        };
        let second = SearchResponse {
            results: vec![post("b", "Post B")],
            next_page: None,
            ..SearchResponse::default()
        };
        let seeded = PaginationState::seed(first);
        let state = seeded.append(second);
        Manifest {
            preview: PreviewMode::Off,
            listing: Listing {
                state,
                steps: vec![1, 2],
            },
            posts: vec![
                PostEntry {
                    post: post("a", "Post A"),
                    previous: Some(PostLink {
                        uid: "b".to_string(),
                        title: "Post B".to_string(),
                    }),
                    next: None,
                },
                PostEntry {
                    post: post("b", "Post B"),
                    previous: None,
                    next: Some(PostLink {
                        uid: "a".to_string(),
                        title: "Post A".to_string(),
                    }),
                },
            ],
            config: SiteConfig::default(),
        }
    }

    fn page_context<'a>(manifest: &'a Manifest, css: &'a str) -> PageContext<'a> {
        PageContext {
            config: &manifest.config,
            preview: &manifest.preview,
            css,
        }
    }

    #[test]
    fn format_date_in_portuguese() {
        assert_eq!(
            format_date(Some("2021-03-15T19:25:28+0000"), "pt-BR"),
            "15 mar 2021"
        );
    }

    #[test]
    fn format_date_in_english_and_rfc3339() {
        assert_eq!(
            format_date(Some("2021-02-01T08:00:00+00:00"), "en"),
            "01 Feb 2021"
        );
    }

    #[test]
    fn format_date_missing_or_garbage_is_empty() {
        assert_eq!(format_date(None, "pt-BR"), "");
        assert_eq!(format_date(Some("yesterday"), "pt-BR"), "");
    }

    #[test]
    fn edited_line_only_when_changed() {
        let first = Some("2021-03-15T19:25:28+0000");
        assert_eq!(edited_line(first, first, "pt-BR"), None);
        assert_eq!(
            edited_line(first, Some("2021-03-25T15:49:00+0000"), "pt-BR").as_deref(),
            Some("* editado em 25 mar 2021, às 15:49")
        );
        assert_eq!(edited_line(first, None, "pt-BR"), None);
    }

    #[test]
    fn first_listing_page_links_to_second() {
        let m = manifest();
        let page = page_context(&m, "");
        let html = render_listing(&page, &m, 1).into_string();
        assert!(html.contains("Post A"));
        assert!(!html.contains("Post B"));
        assert!(html.contains(r#"href="/page/2/""#));
        assert!(html.contains("Carregar mais posts"));
    }

    #[test]
    fn last_listing_page_accumulates_and_has_no_button() {
        let m = manifest();
        let page = page_context(&m, "");
        let html = render_listing(&page, &m, 2).into_string();
        let a = html.find("Post A").unwrap();
        let b = html.find("Post B").unwrap();
        assert!(a < b);
        assert!(!html.contains("Carregar mais posts"));
    }

    #[test]
    fn listing_shows_meta_without_reading_time() {
        let m = manifest();
        let page = page_context(&m, "");
        let html = render_listing(&page, &m, 1).into_string();
        assert!(html.contains("15 mar 2021"));
        assert!(html.contains("Joseph Oliveira"));
        assert!(html.contains(r#"href="/post/a/""#));
        assert!(!html.contains("reading-time"));
    }

    #[test]
    fn post_page_has_reading_time_and_sections() {
        let m = manifest();
        let page = page_context(&m, "");
        let html = render_post(&page, &m.posts[0], 1, html! {}).into_string();
        assert!(html.contains("<h1>Post A</h1>"));
        assert!(html.contains("1 min"));
        assert!(html.contains(r#"id="section-1""#));
        assert!(html.contains("<h2>Proin et varius</h2>"));
        assert!(html.contains("<p>Lorem ipsum dolor sit amet</p>"));
        assert!(html.contains(r#"src="https://images.example/banner.png""#));
        assert!(!html.contains("editado"));
    }

    #[test]
    fn post_page_neighbor_navigation() {
        let m = manifest();
        let page = page_context(&m, "");
        let html = render_post(&page, &m.posts[0], 1, html! {}).into_string();
        assert!(html.contains("Post anterior"));
        assert!(html.contains(r#"href="/post/b/""#));
        assert!(!html.contains("Próximo post"));
    }

    #[test]
    fn preview_pages_render_exit_control() {
        let mut m = manifest();
        m.preview = PreviewMode::from_ref(Some("draft"));
        let page = page_context(&m, "");
        let html = render_listing(&page, &m, 1).into_string();
        assert!(html.contains("Sair do modo Preview"));
        assert!(html.contains(r#"href="/api/exit-preview""#));
    }

    #[test]
    fn titles_are_escaped() {
        let mut m = manifest();
        m.posts[0].post.data.title = "<script>alert('xss')</script>".to_string();
        let page = page_context(&m, "");
        let html = render_post(&page, &m.posts[0], 1, html! {}).into_string();
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn render_site_writes_all_pages() {
        let tmp = TempDir::new().unwrap();
        let mut m = manifest();
        m.config.comments.enabled = true;
        m.config.comments.repo = "owner/comments".to_string();

        let report = render_site(&m, tmp.path()).unwrap();
        assert_eq!(report.listing_pages, ["index.html", "page/2/index.html"]);
        assert_eq!(report.posts.len(), 2);
        assert_eq!(report.posts[0].path, "post/a/index.html");
        assert_eq!(report.posts[0].reading_minutes, 1);

        assert!(tmp.path().join("index.html").exists());
        assert!(tmp.path().join("page/2/index.html").exists());
        assert!(tmp.path().join("404.html").exists());

        let post_b = fs::read_to_string(tmp.path().join("post/b/index.html")).unwrap();
        assert!(post_b.contains(r#"data-post-id="b""#));
        assert!(!post_b.contains(r#"data-post-id="a""#));
    }

    #[test]
    fn generate_reads_manifest_file() {
        let tmp = TempDir::new().unwrap();
        let manifest_path = tmp.path().join("manifest.json");
        fs::write(&manifest_path, serde_json::to_string(&manifest()).unwrap()).unwrap();

        let out = tmp.path().join("dist");
        let report = generate(&manifest_path, &out).unwrap();
        assert_eq!(report.posts.len(), 2);
        assert!(out.join("post/a/index.html").exists());
    }

    #[test]
    fn empty_listing_still_gets_index() {
        let tmp = TempDir::new().unwrap();
        let m = Manifest {
            preview: PreviewMode::Off,
            listing: Listing::default(),
            posts: Vec::new(),
            config: SiteConfig::default(),
        };
        let report = render_site(&m, tmp.path()).unwrap();
        assert_eq!(report.listing_pages, ["index.html"]);
        assert!(tmp.path().join("index.html").exists());
    }
}
