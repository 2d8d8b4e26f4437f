//! CLI output formatting for both pipeline stages.
//!
//! # Information-First Display
//!
//! Every entity is shown by its semantic identity first (positional index
//! and title) with paths and details as indented context lines.
//!
//! ## Fetch
//!
//! ```text
//! Listing (2 pages)
//! 001 Como utilizar Hooks
//! 002 Criando um app CRA do zero
//!
//! Posts
//! 001 Como utilizar Hooks (4 min)
//!     Source: como-utilizar-hooks
//!     Previous: Criando um app CRA do zero
//! ```
//!
//! ## Generate
//!
//! ```text
//! Listing → index.html
//! Listing → page/2/index.html
//! 001 Como utilizar Hooks → post/como-utilizar-hooks/index.html
//!
//! Generated 2 listing pages, 1 post
//! ```
//!
//! # Architecture
//!
//! Each stage has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure —
//! no I/O, no side effects.

use crate::fetch::{ContentWarning, Manifest};
use crate::generate::GenerateReport;
use crate::reading_time;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Entity header: index + title, `(untitled)` for posts without one.
fn entity_header(index: usize, title: &str) -> String {
    if title.trim().is_empty() {
        format!("{} (untitled)", format_index(index))
    } else {
        format!("{} {}", format_index(index), title)
    }
}

fn plural(n: usize, singular: &str, plural: &str) -> String {
    if n == 1 {
        format!("{n} {singular}")
    } else {
        format!("{n} {plural}")
    }
}

// ============================================================================
// Stage 1: Fetch output
// ============================================================================

/// Format fetch stage output: the listing and every fetched post.
pub fn format_fetch_output(manifest: &Manifest) -> Vec<String> {
    let mut lines = Vec::new();
    let wpm = manifest.config.reading.words_per_minute;

    if let Some(ref_token) = manifest.preview.ref_token() {
        lines.push(format!("Preview ref: {ref_token}"));
        lines.push(String::new());
    }

    lines.push(format!(
        "Listing ({})",
        plural(manifest.listing.steps.len(), "page", "pages")
    ));
    for (i, item) in manifest.listing.state.items().iter().enumerate() {
        lines.push(entity_header(i + 1, &item.data.title));
    }

    lines.push(String::new());
    lines.push("Posts".to_string());
    for (i, entry) in manifest.posts.iter().enumerate() {
        let minutes = reading_time::estimate_minutes_at(&entry.post.data.content, wpm);
        lines.push(format!(
            "{} ({} min)",
            entity_header(i + 1, &entry.post.data.title),
            minutes
        ));
        lines.push(format!("{}Source: {}", indent(1), entry.post.uid));
        if let Some(prev) = &entry.previous {
            lines.push(format!("{}Previous: {}", indent(1), prev.title));
        }
        if let Some(next) = &entry.next {
            lines.push(format!("{}Next: {}", indent(1), next.title));
        }
    }

    lines
}

pub fn print_fetch_output(manifest: &Manifest) {
    for line in format_fetch_output(manifest) {
        println!("{}", line);
    }
}

/// Format content warnings, one per line.
pub fn format_warnings(warnings: &[ContentWarning]) -> Vec<String> {
    if warnings.is_empty() {
        return Vec::new();
    }
    let mut lines = vec!["Warnings".to_string()];
    lines.extend(
        warnings
            .iter()
            .map(|warning| format!("{}{}", indent(1), warning)),
    );
    lines
}

pub fn print_warnings(warnings: &[ContentWarning]) {
    for line in format_warnings(warnings) {
        println!("{}", line);
    }
}

// ============================================================================
// Stage 2: Generate output
// ============================================================================

/// Format generate stage output: every written page and a summary line.
pub fn format_generate_output(report: &GenerateReport) -> Vec<String> {
    let mut lines = Vec::new();
    for path in &report.listing_pages {
        lines.push(format!("Listing → {}", path));
    }
    for (i, post) in report.posts.iter().enumerate() {
        lines.push(format!("{} → {}", entity_header(i + 1, &post.title), post.path));
    }
    lines.push(String::new());
    lines.push(format!(
        "Generated {}, {}",
        plural(report.listing_pages.len(), "listing page", "listing pages"),
        plural(report.posts.len(), "post", "posts")
    ));
    lines
}

pub fn print_generate_output(report: &GenerateReport) {
    for line in format_generate_output(report) {
        println!("{}", line);
    }
}
