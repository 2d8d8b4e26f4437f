//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. The file is sparse:
//! stock defaults are the base layer and the user's file overrides only the
//! keys it names.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [site]
//! title = "spacetraveling"
//! lang = "pt-BR"
//!
//! [api]
//! endpoint = "https://spacetraveling.cdn.prismic.io/api/v2"
//! # access_token = "..."     # or PRISMIC_ACCESS_TOKEN / --access-token
//! document_type = "posts"
//! listing_page_size = 5      # Posts per "load more" step
//! paths_page_size = 100      # Page size when collecting every post uid
//! # timeout_secs = 30        # Omit to use transport defaults
//!
//! [reading]
//! words_per_minute = 200
//!
//! [comments]
//! enabled = false
//! repo = ""                  # GitHub repo backing the utterances widget
//! issue_term = "pathname"
//! theme = "github-dark"
//! script_src = "https://utteranc.es/client.js"
//!
//! [preview]
//! exit_url = "/api/exit-preview"
//!
//! [colors]
//! background = "#1a1d23"
//! ...
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    pub site: SiteMeta,
    /// Content API location and query sizes.
    pub api: ApiConfig,
    pub reading: ReadingConfig,
    /// Comment widget settings.
    pub comments: CommentsConfig,
    pub preview: PreviewConfig,
    pub colors: ColorScheme,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.endpoint.trim().is_empty() {
            return Err(ConfigError::Validation("api.endpoint must be set".into()));
        }
        if self.api.document_type.trim().is_empty() {
            return Err(ConfigError::Validation(
                "api.document_type must not be empty".into(),
            ));
        }
        if self.api.listing_page_size == 0 || self.api.paths_page_size == 0 {
            return Err(ConfigError::Validation(
                "api page sizes must be non-zero".into(),
            ));
        }
        if self.api.paths_page_size > 100 {
            return Err(ConfigError::Validation(
                "api.paths_page_size must be at most 100".into(),
            ));
        }
        if self.reading.words_per_minute == 0 {
            return Err(ConfigError::Validation(
                "reading.words_per_minute must be non-zero".into(),
            ));
        }
        if self.comments.enabled && self.comments.repo.trim().is_empty() {
            return Err(ConfigError::Validation(
                "comments.repo must be set when comments are enabled".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteMeta {
    /// Shown in the header and page titles.
    pub title: String,
    /// `lang` attribute of every page.
    pub lang: String,
}

impl Default for SiteMeta {
    fn default() -> Self {
        Self {
            title: "spacetraveling".to_string(),
            lang: "pt-BR".to_string(),
        }
    }
}

/// Content API settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiConfig {
    /// API descriptor URL (`https://<repo>.cdn.prismic.io/api/v2`).
    pub endpoint: String,
    /// Access token for private repositories. Never written back out, so it
    /// stays out of the manifest and generated config.
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
    /// Custom type of blog posts.
    pub document_type: String,
    /// Posts per listing page.
    pub listing_page_size: u32,
    /// Page size used when collecting every post uid.
    pub paths_page_size: u32,
    /// Request timeout. When absent the transport defaults apply.
    pub timeout_secs: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://spacetraveling.cdn.prismic.io/api/v2".to_string(),
            access_token: None,
            document_type: "posts".to_string(),
            listing_page_size: 5,
            paths_page_size: 100,
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReadingConfig {
    pub words_per_minute: usize,
}

impl Default for ReadingConfig {
    fn default() -> Self {
        Self {
            words_per_minute: crate::reading_time::WORDS_PER_MINUTE,
        }
    }
}

/// utterances comment widget settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CommentsConfig {
    pub enabled: bool,
    /// `owner/name` of the GitHub repo that stores comment issues.
    pub repo: String,
    /// How a page is mapped to an issue (`pathname`, `title`, ...).
    pub issue_term: String,
    pub theme: String,
    pub script_src: String,
}

impl Default for CommentsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            repo: String::new(),
            issue_term: "pathname".to_string(),
            theme: "github-dark".to_string(),
            script_src: "https://utteranc.es/client.js".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreviewConfig {
    /// Where the "exit preview" control points.
    pub exit_url: String,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            exit_url: "/api/exit-preview".to_string(),
        }
    }
}

/// Color scheme, emitted as CSS custom properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorScheme {
    pub background: String,
    /// Body text.
    pub text: String,
    /// Dates, author and reading time.
    pub text_muted: String,
    pub heading: String,
    /// Links and buttons.
    pub accent: String,
    pub border: String,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            background: "#1a1d23".to_string(),
            text: "#d7d7d7".to_string(),
            text_muted: "#bbbbbb".to_string(),
            heading: "#f8f8f8".to_string(),
            accent: "#ff57b2".to_string(),
            border: "#383a40".to_string(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(SiteConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(config_path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the given `config.toml` path.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result. A missing file yields the stock defaults.
pub fn load_config(config_path: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(config_path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# spacetraveling configuration
# ============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Site
# ---------------------------------------------------------------------------
[site]
# Shown in the header and in page titles.
title = "spacetraveling"

# Language of the generated pages (also selects the date format).
lang = "pt-BR"

# ---------------------------------------------------------------------------
# Content API
# ---------------------------------------------------------------------------
[api]
# API descriptor URL of the content repository.
endpoint = "https://spacetraveling.cdn.prismic.io/api/v2"

# Access token for private repositories. Prefer the PRISMIC_ACCESS_TOKEN
# environment variable or --access-token over committing it here.
# access_token = ""

# Custom type holding blog posts.
document_type = "posts"

# Posts added by each "load more" step of the listing.
listing_page_size = 5

# Page size used when collecting every post to render (max 100).
paths_page_size = 100

# Request timeout in seconds. Omit to use the transport defaults.
# timeout_secs = 30

# ---------------------------------------------------------------------------
# Reading time
# ---------------------------------------------------------------------------
[reading]
# Reading speed used to estimate minutes per post.
words_per_minute = 200

# ---------------------------------------------------------------------------
# Comments (utterances)
# ---------------------------------------------------------------------------
[comments]
enabled = false

# GitHub repository (owner/name) that stores comment issues.
repo = ""

# How a post is mapped to an issue: pathname, url, title, og:title.
issue_term = "pathname"

theme = "github-dark"
script_src = "https://utteranc.es/client.js"

# ---------------------------------------------------------------------------
# Preview mode
# ---------------------------------------------------------------------------
[preview]
# Target of the "exit preview" control rendered on preview builds.
exit_url = "/api/exit-preview"

# ---------------------------------------------------------------------------
# Colors
# ---------------------------------------------------------------------------
[colors]
background = "#1a1d23"
text = "#d7d7d7"
text_muted = "#bbbbbb"    # Dates, author, reading time
heading = "#f8f8f8"
accent = "#ff57b2"        # Links and the "load more" button
border = "#383a40"
"##
}

/// Generate CSS custom properties from the color scheme.
pub fn generate_color_css(colors: &ColorScheme) -> String {
    format!(
        r#":root {{
    --color-bg: {background};
    --color-text: {text};
    --color-text-muted: {text_muted};
    --color-heading: {heading};
    --color-accent: {accent};
    --color-border: {border};
}}"#,
        background = colors.background,
        text = colors.text,
        text_muted = colors.text_muted,
        heading = colors.heading,
        accent = colors.accent,
        border = colors.border,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_points_at_posts() {
        let config = SiteConfig::default();
        assert_eq!(config.api.document_type, "posts");
        assert_eq!(config.api.listing_page_size, 5);
        assert_eq!(config.reading.words_per_minute, 200);
        assert!(config.api.access_token.is_none());
        assert!(!config.comments.enabled);
    }

    #[test]
    fn access_token_is_read_but_never_written() {
        let config: SiteConfig = toml::from_str("[api]\naccess_token = \"s3cr3t\"\n").unwrap();
        assert_eq!(config.api.access_token.as_deref(), Some("s3cr3t"));

        let written = toml::to_string(&config).unwrap();
        assert!(!written.contains("s3cr3t"));
    }

    #[test]
    fn parse_partial_config() {
        let toml = r##"
[comments]
enabled = true
repo = "owner/comments"
"##;
        let config: SiteConfig = toml::from_str(toml).unwrap();
        assert!(config.comments.enabled);
        assert_eq!(config.comments.repo, "owner/comments");
        // Default values preserved
        assert_eq!(config.comments.theme, "github-dark");
        assert_eq!(config.site.title, "spacetraveling");
    }

    #[test]
    fn generate_css_uses_config_colors() {
        let colors = ColorScheme {
            accent: "#00ff00".to_string(),
            ..ColorScheme::default()
        };
        let css = generate_color_css(&colors);
        assert!(css.contains("--color-accent: #00ff00"));
        assert!(css.contains("--color-bg: #1a1d23"));
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join("config.toml")).unwrap();
        assert_eq!(config, SiteConfig::default());
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        fs::write(
            &config_path,
            r#"
[api]
endpoint = "https://myblog.cdn.prismic.io/api/v2"
timeout_secs = 15

[site]
title = "my blog"
"#,
        )
        .unwrap();

        let config = load_config(&config_path).unwrap();
        assert_eq!(config.api.endpoint, "https://myblog.cdn.prismic.io/api/v2");
        assert_eq!(config.api.timeout_secs, Some(15));
        assert_eq!(config.site.title, "my blog");
        // Unspecified values should be defaults
        assert_eq!(config.api.document_type, "posts");
        assert_eq!(config.site.lang, "pt-BR");
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        fs::write(&config_path, "[api\nendpoint = ").unwrap();
        assert!(matches!(load_config(&config_path), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn unknown_key_rejected() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        fs::write(&config_path, "[api]\nendpont = \"typo\"\n").unwrap();
        assert!(load_config(&config_path).is_err());
    }

    #[test]
    fn unknown_section_rejected() {
        let result: Result<SiteConfig, _> = toml::from_str("[images]\nquality = 90\n");
        assert!(result.is_err());
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str("a = 1").unwrap();
        let overlay: toml::Value = toml::from_str("a = 2").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("a").unwrap().as_integer(), Some(2));
    }

    #[test]
    fn merge_toml_preserves_base_keys() {
        let base: toml::Value = toml::from_str("[api]\na = 1\nb = 2\n").unwrap();
        let overlay: toml::Value = toml::from_str("[api]\nb = 3\n").unwrap();
        let merged = merge_toml(base, overlay);
        let api = merged.get("api").unwrap();
        assert_eq!(api.get("a").unwrap().as_integer(), Some(1));
        assert_eq!(api.get("b").unwrap().as_integer(), Some(3));
    }

    // =========================================================================
    // validation tests
    // =========================================================================

    #[test]
    fn validate_default_config_passes() {
        assert!(SiteConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_zero_reading_speed() {
        let mut config = SiteConfig::default();
        config.reading.words_per_minute = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_zero_page_size() {
        let mut config = SiteConfig::default();
        config.api.listing_page_size = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_paths_page_size_cap() {
        let mut config = SiteConfig::default();
        config.api.paths_page_size = 101;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_comments_need_repo() {
        let mut config = SiteConfig::default();
        config.comments.enabled = true;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
        config.comments.repo = "owner/comments".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_config_validates_values() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        fs::write(&config_path, "[reading]\nwords_per_minute = 0\n").unwrap();
        assert!(matches!(
            load_config(&config_path),
            Err(ConfigError::Validation(_))
        ));
    }

    // =========================================================================
    // stock_config_toml tests
    // =========================================================================

    #[test]
    fn stock_config_toml_matches_defaults() {
        let config: SiteConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config, SiteConfig::default());
    }

    #[test]
    fn stock_config_toml_contains_all_sections() {
        let content = stock_config_toml();
        for section in ["[site]", "[api]", "[reading]", "[comments]", "[preview]", "[colors]"] {
            assert!(content.contains(section), "missing {section}");
        }
    }

    #[test]
    fn stock_defaults_value_has_all_sections() {
        let val = stock_defaults_value().unwrap();
        assert!(val.is_table());
        for key in ["site", "api", "reading", "comments", "preview", "colors"] {
            assert!(val.get(key).is_some(), "missing {key}");
        }
    }
}
