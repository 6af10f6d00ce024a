//! Classifies stored article content into one of four formats.
//!
//! Resolution is a strict first-match chain: JSON block list, Markdown
//! (substring heuristic), plain text (paragraph/sentence split), raw markup.
//! It never fails; every input lands on some [`ResolvedContent`] variant.

use serde_json::Value;

use super::fallback::split_paragraphs;
use crate::config;

/// Indicators used when no policy is configured.
pub const DEFAULT_MARKDOWN_INDICATORS: &[&str] =
    &["#", "**", "*", "![", "[", "|", ">", "-", "```"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentFormat {
    BlockList,
    Markdown,
    PlainText,
    RawMarkup,
}

impl ContentFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentFormat::BlockList => "block-list",
            ContentFormat::Markdown => "markdown",
            ContentFormat::PlainText => "plain-text",
            ContentFormat::RawMarkup => "raw-markup",
        }
    }
}

/// Content tagged with its resolved format, ready for rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedContent {
    BlockList(Vec<Value>),
    Markdown(String),
    /// Non-empty paragraph segments in document order.
    PlainText(Vec<String>),
    RawMarkup(String),
}

impl ResolvedContent {
    pub fn format(&self) -> ContentFormat {
        match self {
            ResolvedContent::BlockList(_) => ContentFormat::BlockList,
            ResolvedContent::Markdown(_) => ContentFormat::Markdown,
            ResolvedContent::PlainText(_) => ContentFormat::PlainText,
            ResolvedContent::RawMarkup(_) => ContentFormat::RawMarkup,
        }
    }
}

/// Markdown sniffing policy. Ordinary prose containing an indicator (a
/// hyphen, an asterisk) is classified as Markdown; narrow the list to change
/// that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatPolicy {
    indicators: Vec<String>,
}

impl Default for FormatPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MARKDOWN_INDICATORS.iter().map(|s| s.to_string()))
    }
}

impl FormatPolicy {
    pub fn new<I, S>(indicators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            indicators: indicators
                .into_iter()
                .map(Into::into)
                .filter(|s: &String| !s.is_empty())
                .collect(),
        }
    }

    pub fn from_config(content: &config::Content) -> Self {
        Self::new(content.markdown_indicators.iter().cloned())
    }

    pub fn is_markdown(&self, text: &str) -> bool {
        self.indicators.iter().any(|i| text.contains(i.as_str()))
    }
}

/// Resolve raw article content. A non-empty `content_blocks` array
/// short-circuits everything else.
pub fn resolve(
    content: &str,
    content_blocks: Option<&[Value]>,
    policy: &FormatPolicy,
) -> ResolvedContent {
    if let Some(blocks) = content_blocks.filter(|b| !b.is_empty()) {
        return ResolvedContent::BlockList(blocks.to_vec());
    }

    let decoded;
    let mut text = content;
    match serde_json::from_str::<Value>(content) {
        Ok(Value::Array(blocks)) => return ResolvedContent::BlockList(blocks),
        // A JSON-encoded string is unwrapped and resolved on its contents.
        Ok(Value::String(inner)) => {
            decoded = inner;
            text = &decoded;
        }
        _ => {}
    }

    if policy.is_markdown(text) {
        return ResolvedContent::Markdown(text.to_string());
    }

    let paragraphs = split_paragraphs(text);
    if !paragraphs.is_empty() {
        return ResolvedContent::PlainText(paragraphs);
    }

    ResolvedContent::RawMarkup(text.to_string())
}

/// Classification only, without keeping the payload.
pub fn classify(content: &str, policy: &FormatPolicy) -> ContentFormat {
    resolve(content, None, policy).format()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn policy() -> FormatPolicy {
        FormatPolicy::default()
    }

    #[test]
    fn json_array_is_block_list() {
        let raw = r#"[{"type":"paragraph","text":"Hi"}]"#;
        match resolve(raw, None, &policy()) {
            ResolvedContent::BlockList(blocks) => assert_eq!(blocks.len(), 1),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn content_blocks_take_precedence() {
        let blocks = vec![json!({"type": "divider"})];
        let resolved = resolve("# Markdown title", Some(&blocks), &policy());
        assert_eq!(resolved, ResolvedContent::BlockList(blocks));
    }

    #[test]
    fn empty_content_blocks_do_not_short_circuit() {
        let resolved = resolve("# Title", Some(&[]), &policy());
        assert_eq!(resolved.format(), ContentFormat::Markdown);
    }

    #[test]
    fn json_object_falls_through() {
        // `{` and `"` are not indicators, `:` neither; the object is plain text.
        assert_eq!(
            classify(r#"{"type":"paragraph"}"#, &policy()),
            ContentFormat::PlainText
        );
        assert_eq!(classify("42", &policy()), ContentFormat::PlainText);
    }

    #[test]
    fn malformed_json_falls_through_to_markdown() {
        let raw = r#"[{"type":"heading","text":"broken"#;
        assert_eq!(classify(raw, &policy()), ContentFormat::Markdown);
    }

    #[test]
    fn markdown_indicators_detected() {
        for raw in ["## Title", "some **bold** text", "| a | b |", "> quoted", "```\ncode\n```"] {
            assert_eq!(classify(raw, &policy()), ContentFormat::Markdown, "{raw}");
        }
    }

    #[test]
    fn prose_with_hyphen_is_markdown_under_default_policy() {
        assert_eq!(
            classify("A well-known fact.", &policy()),
            ContentFormat::Markdown
        );
        let strict = FormatPolicy::new(["#", "```"]);
        assert_eq!(
            classify("A well-known fact.", &strict),
            ContentFormat::PlainText
        );
    }

    #[test]
    fn plain_sentences_become_paragraphs() {
        let resolved = resolve("Plain sentence one. Plain sentence two.", None, &policy());
        assert_eq!(
            resolved,
            ResolvedContent::PlainText(vec![
                "Plain sentence one.".to_string(),
                "Plain sentence two.".to_string(),
            ])
        );
    }

    #[test]
    fn json_string_is_unwrapped() {
        let resolved = resolve(
            r#""Plain sentence one. Plain sentence two.""#,
            None,
            &policy(),
        );
        assert_eq!(
            resolved,
            ResolvedContent::PlainText(vec![
                "Plain sentence one.".to_string(),
                "Plain sentence two.".to_string(),
            ])
        );
    }

    #[test]
    fn blank_and_null_like_inputs_never_fail() {
        assert_eq!(resolve("", None, &policy()), ResolvedContent::RawMarkup(String::new()));
        assert_eq!(classify("   \n\n  ", &policy()), ContentFormat::RawMarkup);
        assert_eq!(classify("null", &policy()), ContentFormat::PlainText);
        assert_eq!(classify("\"\"", &policy()), ContentFormat::RawMarkup);
        assert_eq!(classify("[[[{{{", &policy()), ContentFormat::Markdown);
        assert_eq!(classify("{\"a\":", &policy()), ContentFormat::PlainText);
    }

    #[test]
    fn policy_from_config_uses_configured_list() {
        let cfg = config::Content {
            markdown_indicators: vec!["~~".into()],
        };
        let p = FormatPolicy::from_config(&cfg);
        assert!(p.is_markdown("~~gone~~"));
        assert!(!p.is_markdown("# not a heading here"));
    }
}
