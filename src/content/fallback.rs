//! Renderers for content that is not a structured block list.

use once_cell::sync::Lazy;
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag, TagEnd};
use regex::Regex;

use super::section_anchor;
use crate::model::TocEntry;

static BLANK_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").expect("valid regex"));

/// Split unstructured text into paragraphs: first on blank lines, then on
/// sentence boundaries (". " followed by a Latin capital or an Arabic
/// letter). Segments are trimmed; empty ones are dropped, nothing is merged.
/// The period stays at the end of the sentence it closes instead of being
/// consumed by the split.
pub fn split_paragraphs(text: &str) -> Vec<String> {
    BLANK_LINE
        .split(text)
        .flat_map(split_sentences)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn split_sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c != '.' {
            continue;
        }
        let Some(&(_, ' ')) = chars.peek() else {
            continue;
        };
        // Byte offset just past ". "
        let next_start = i + 2;
        if text[next_start..].chars().next().is_some_and(starts_sentence) {
            out.push(&text[start..i + 1]);
            start = next_start;
        }
    }
    out.push(&text[start..]);
    out
}

fn starts_sentence(c: char) -> bool {
    c.is_ascii_uppercase() || ('\u{0600}'..='\u{06FF}').contains(&c)
}

/// Convert Markdown to HTML with GitHub-flavoured extensions and
/// line-break-sensitive semantics. Headings get `section-{n}` anchors and
/// are returned as table-of-contents entries; tables are wrapped in a
/// scroll container.
pub fn markdown_to_html(markdown: &str) -> (String, Vec<TocEntry>) {
    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_TABLES);
    opts.insert(Options::ENABLE_STRIKETHROUGH);
    opts.insert(Options::ENABLE_TASKLISTS);

    let mut toc: Vec<TocEntry> = Vec::new();
    let mut open_heading: Option<TocEntry> = None;
    let mut events = Vec::new();

    for event in Parser::new_ext(markdown, opts) {
        let event = match event {
            Event::Start(Tag::Heading {
                level,
                classes,
                attrs,
                ..
            }) => {
                let anchor = section_anchor(toc.len() + 1);
                open_heading = Some(TocEntry {
                    id: anchor.clone(),
                    title: String::new(),
                    level: level as u8,
                });
                Event::Start(Tag::Heading {
                    level,
                    id: Some(CowStr::from(anchor)),
                    classes,
                    attrs,
                })
            }
            Event::End(TagEnd::Heading(level)) => {
                if let Some(mut entry) = open_heading.take() {
                    entry.title = entry.title.trim().to_string();
                    toc.push(entry);
                }
                Event::End(TagEnd::Heading(level))
            }
            Event::SoftBreak => Event::HardBreak,
            other => {
                if let (Some(entry), Event::Text(t) | Event::Code(t)) =
                    (open_heading.as_mut(), &other)
                {
                    entry.title.push_str(t);
                }
                other
            }
        };
        events.push(event);
    }

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, events.into_iter());
    let out = out
        .replace("<table>", "<div class=\"table-container\"><table>")
        .replace("</table>", "</table></div>");
    (out, toc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_blank_lines() {
        let parts = split_paragraphs("first block\n\nsecond block\r\n\r\nthird");
        assert_eq!(parts, vec!["first block", "second block", "third"]);
    }

    #[test]
    fn splits_before_capital_or_arabic_letter_only() {
        let parts = split_paragraphs("One. Two. three. مرحبا. end");
        assert_eq!(parts, vec!["One.", "Two. three.", "مرحبا. end"]);
    }

    #[test]
    fn keeps_order_and_drops_nothing() {
        let text = "Alpha beta.\n\n   \n\nGamma. Delta";
        assert_eq!(split_paragraphs(text), vec!["Alpha beta.", "Gamma.", "Delta"]);
    }

    #[test]
    fn blank_text_yields_nothing() {
        assert!(split_paragraphs("").is_empty());
        assert!(split_paragraphs(" \n\n \t").is_empty());
    }

    #[test]
    fn sentence_split_ignores_trailing_period() {
        assert_eq!(split_paragraphs("Ends here."), vec!["Ends here."]);
        assert_eq!(split_paragraphs("Ends here. "), vec!["Ends here."]);
    }

    #[test]
    fn markdown_headings_are_anchored_and_listed() {
        let (html, toc) = markdown_to_html("# Top\n\ntext\n\n## Sub `code`\n");
        assert!(html.contains(r#"<h1 id="section-1">Top</h1>"#), "{html}");
        assert!(html.contains(r#"<h2 id="section-2">"#), "{html}");
        assert_eq!(toc.len(), 2);
        assert_eq!(toc[0].title, "Top");
        assert_eq!(toc[0].level, 1);
        assert_eq!(toc[1].id, "section-2");
        assert_eq!(toc[1].title, "Sub code");
    }

    #[test]
    fn markdown_soft_breaks_become_line_breaks() {
        let (html, _) = markdown_to_html("line one\nline two");
        assert!(html.contains("line one<br />"), "{html}");
    }

    #[test]
    fn markdown_tables_are_wrapped() {
        let (html, _) = markdown_to_html("| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(html.starts_with("<div class=\"table-container\"><table>"), "{html}");
        assert!(html.trim_end().ends_with("</table></div>"), "{html}");
    }

    #[test]
    fn markdown_strikethrough_enabled() {
        let (html, _) = markdown_to_html("~~gone~~");
        assert!(html.contains("<del>gone</del>"), "{html}");
    }
}
