//! Preview mode.
//!
//! A preview build renders unpublished drafts. It is selected at build time
//! with `--preview-ref <REF>`: the content client pins that ref instead of
//! the master ref, and every generated page carries an "exit preview" control
//! pointing at the configured exit URL.

use maud::{Markup, html};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PreviewMode {
    #[default]
    Off,
    On { ref_token: String },
}

impl PreviewMode {
    /// Preview is on only for a non-blank ref.
    pub fn from_ref(ref_token: Option<&str>) -> Self {
        match ref_token.map(str::trim) {
            Some(token) if !token.is_empty() => Self::On {
                ref_token: token.to_string(),
            },
            _ => Self::Off,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::On { .. })
    }

    /// The ref to request draft content with, if any.
    pub fn ref_token(&self) -> Option<&str> {
        match self {
            Self::On { ref_token } => Some(ref_token),
            Self::Off => None,
        }
    }
}

/// Renders the exit-preview control, or nothing outside preview mode.
pub fn exit_control(mode: &PreviewMode, exit_url: &str) -> Markup {
    html! {
        @if mode.is_active() {
            aside.exit-preview {
                a href=(exit_url) { "Sair do modo Preview" }
            }
        }
    }
}
