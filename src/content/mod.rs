//! Content pipeline: format resolution, block rendering and fallbacks.
//!
//! - `format`: classify raw content into a [`ResolvedContent`].
//! - `blocks`: structured block list → typed [`Unit`]s.
//! - `fallback`: Markdown conversion and the plain-text paragraph splitter.
//! - `html`: markup emission for units and paragraphs.

pub mod blocks;
pub mod fallback;
pub mod format;
pub mod html;

pub use blocks::{Embed, Unit};
pub use format::{classify, resolve, ContentFormat, FormatPolicy, ResolvedContent};

use crate::model::TocEntry;
use crate::reading::count_words;

/// Anchor id of the `n`-th heading (1-based) in a rendered article.
pub fn section_anchor(n: usize) -> String {
    format!("section-{}", n)
}

/// Output of the pipeline for one article.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedContent {
    pub format: ContentFormat,
    /// Typed units; empty for Markdown and Raw-Markup, which only have markup.
    pub units: Vec<Unit>,
    pub html: String,
    pub toc: Vec<TocEntry>,
    pub word_count: usize,
}

/// Render resolved content with the renderer matching its format.
pub fn render(resolved: &ResolvedContent) -> RenderedContent {
    match resolved {
        ResolvedContent::BlockList(blocks) => {
            let (units, toc) = blocks::render_blocks(blocks);
            let word_count = units
                .iter()
                .flat_map(Unit::text_fields)
                .map(count_words)
                .sum();
            RenderedContent {
                format: ContentFormat::BlockList,
                html: html::render_units(&units),
                units,
                toc,
                word_count,
            }
        }
        ResolvedContent::Markdown(text) => {
            let (markup, toc) = fallback::markdown_to_html(text);
            RenderedContent {
                format: ContentFormat::Markdown,
                units: Vec::new(),
                html: markup,
                toc,
                word_count: count_words(text),
            }
        }
        ResolvedContent::PlainText(paragraphs) => {
            let units: Vec<Unit> = paragraphs
                .iter()
                .map(|p| Unit::Paragraph { text: p.clone() })
                .collect();
            RenderedContent {
                format: ContentFormat::PlainText,
                html: html::render_paragraphs(paragraphs),
                units,
                toc: Vec::new(),
                word_count: paragraphs.iter().map(|p| count_words(p)).sum(),
            }
        }
        ResolvedContent::RawMarkup(markup) => RenderedContent {
            format: ContentFormat::RawMarkup,
            units: Vec::new(),
            // Blank content renders nothing.
            html: if markup.trim().is_empty() {
                String::new()
            } else {
                markup.clone()
            },
            toc: Vec::new(),
            word_count: count_words(markup),
        },
    }
}
