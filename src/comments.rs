//! Comment widget embedding.
//!
//! Comments are served by a third-party widget (utterances) that is loaded by
//! a `<script>` tag keyed to one post. The embed is treated as a scoped
//! resource held by a [`CommentSlot`]:
//!
//! - [`CommentSlot::mount`] acquires an embed for a post id. Mounting a
//!   different id first releases the current embed; mounting the same id is
//!   a no-op.
//! - [`CommentSlot::release`] removes the current embed.
//! - dropping the slot releases whatever is still mounted.
//!
//! The host the embed lives in is abstracted by [`EmbedHost`]. The generator
//! uses [`MarkupHost`], which holds the `<section>` markup for the post page
//! currently being rendered.

use crate::config::CommentsConfig;
use log::debug;
use maud::{Markup, html};

/// One mounted comment embed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Embed {
    pub post_id: String,
}

/// Something an embed can be injected into and removed from.
pub trait EmbedHost {
    fn inject(&mut self, embed: &Embed, settings: &CommentsConfig);
    fn remove(&mut self, embed: &Embed);
}

/// Owns at most one mounted embed and guarantees its removal.
pub struct CommentSlot<H: EmbedHost> {
    host: H,
    settings: CommentsConfig,
    mounted: Option<Embed>,
}

impl<H: EmbedHost> CommentSlot<H> {
    pub fn new(host: H, settings: CommentsConfig) -> Self {
        Self {
            host,
            settings,
            mounted: None,
        }
    }

    /// Mount the embed for `post_id`, replacing any embed for another post.
    pub fn mount(&mut self, post_id: &str) {
        if !self.settings.enabled {
            return;
        }
        if self.mounted.as_ref().is_some_and(|e| e.post_id == post_id) {
            return;
        }
        self.release();
        let embed = Embed {
            post_id: post_id.to_string(),
        };
        debug!("mounting comments for {post_id}");
        self.host.inject(&embed, &self.settings);
        self.mounted = Some(embed);
    }

    pub fn release(&mut self) {
        if let Some(embed) = self.mounted.take() {
            self.host.remove(&embed);
        }
    }

    pub fn mounted(&self) -> Option<&Embed> {
        self.mounted.as_ref()
    }

    pub fn host(&self) -> &H {
        &self.host
    }
}

impl<H: EmbedHost> Drop for CommentSlot<H> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Holds the rendered comments section of the current page.
#[derive(Debug, Default)]
pub struct MarkupHost {
    section: Option<Markup>,
}

impl MarkupHost {
    /// The mounted section, or nothing when no embed is mounted.
    pub fn render(&self) -> Markup {
        html! {
            @if let Some(section) = &self.section {
                (section)
            }
        }
    }
}

impl EmbedHost for MarkupHost {
    fn inject(&mut self, embed: &Embed, settings: &CommentsConfig) {
        self.section = Some(html! {
            section.comments data-post-id=(embed.post_id) {
                script
                    src=(settings.script_src)
                    repo=(settings.repo)
                    issue-term=(settings.issue_term)
                    theme=(settings.theme)
                    crossorigin="anonymous"
                    async {}
            }
        });
    }

    fn remove(&mut self, _embed: &Embed) {
        self.section = None;
    }
}
