//! Standalone HTML document for a rendered article.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::api::Article;
use crate::content::html::{html_attr, html_escape};
use crate::content::RenderedContent;
use crate::model::TocEntry;

/// Everything the page shows besides the body markup.
#[derive(Debug, Clone, Copy)]
pub struct PageMeta {
    pub reading_minutes: u32,
    pub is_new: bool,
}

pub fn render_document(article: &Article, rendered: &RenderedContent, meta: PageMeta) -> String {
    let mut header = String::new();
    if meta.is_new {
        header.push_str("<span class=\"badge noselect\">New</span>\n      ");
    }
    header.push_str(&format!("<h1>{}</h1>", html_escape(&article.title)));
    if let Some(subtitle) = article.subtitle.as_deref().filter(|s| !s.trim().is_empty()) {
        header.push_str(&format!(
            "\n      <p class=\"subtitle\">{}</p>",
            html_escape(subtitle)
        ));
    }

    let mut facts = vec![format!("{} min read", meta.reading_minutes)];
    if let Some(author) = article.author_display() {
        facts.push(html_escape(&author));
    }
    if let Some(at) = article.published() {
        facts.push(at.format("%Y-%m-%d").to_string());
    }
    facts.push(format!("{} views", article.views_count));
    header.push_str(&format!(
        "\n      <p class=\"hint\">{}</p>",
        facts.join(" · ")
    ));

    let hero = match &article.featured_image {
        Some(src) if !src.trim().is_empty() => format!(
            "<img class=\"hero\" src=\"{}\" alt=\"{}\" />\n      ",
            html_attr(src),
            html_attr(article.featured_image_alt.as_deref().unwrap_or(&article.title))
        ),
        _ => String::new(),
    };

    format!(
        r#"<!doctype html>
<html dir="auto">
  <head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{}</title>
    <link rel="stylesheet" href="static/style.css">
  </head>
  <body>
    <header>
      {}
    </header>
    <main>
      {}{}<article class="content format-{}">
{}
      </article>
    </main>
  </body>
</html>"#,
        html_escape(&article.title),
        header,
        hero,
        render_toc(&rendered.toc),
        rendered.format.as_str(),
        rendered.html
    )
}

fn render_toc(toc: &[TocEntry]) -> String {
    if toc.is_empty() {
        return String::new();
    }
    let mut nav = String::from("<nav class=\"toc noselect\"><ol>");
    for entry in toc {
        nav.push_str(&format!(
            "<li class=\"toc-level-{}\"><a href=\"#{}\">{}</a></li>",
            entry.level,
            html_attr(&entry.id),
            html_escape(&entry.title)
        ));
    }
    nav.push_str("</ol></nav>\n      ");
    nav
}

/// Write `{dir}/{id}.html` plus the shared stylesheet; returns the page path.
pub async fn write_page(
    dir: &Path,
    article: &Article,
    rendered: &RenderedContent,
    meta: PageMeta,
) -> Result<PathBuf> {
    let static_dir = dir.join("static");
    tokio::fs::create_dir_all(&static_dir)
        .await
        .with_context(|| format!("failed to create {}", static_dir.display()))?;

    let page_path = dir.join(format!("{}.html", sanitize_file_stem(&article.id)));
    tokio::fs::write(&page_path, render_document(article, rendered, meta))
        .await
        .with_context(|| format!("failed to write {}", page_path.display()))?;

    let css_path = static_dir.join("style.css");
    tokio::fs::write(&css_path, DEFAULT_STYLE)
        .await
        .with_context(|| format!("failed to write {}", css_path.display()))?;
    Ok(page_path)
}

fn sanitize_file_stem(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

pub const DEFAULT_STYLE: &str = r#"
:root {
  color-scheme: light dark;
  --fg: #222;
  --bg: #fff;
  --muted: #666;
  --accent: #1d4ed8;
}

@media (prefers-color-scheme: dark) {
  :root {
    --fg: #eee;
    --bg: #121212;
    --muted: #aaa;
    --accent: #60a5fa;
  }
}

html,
body {
  margin: 0;
  padding: 0;
  background: var(--bg);
  color: var(--fg);
  font: 17px/1.8 -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto,
        'Noto Sans Arabic', 'Noto Sans', Arial, sans-serif;
}

header {
  padding: 16px;
  max-width: 820px;
  margin: 0 auto;
  border-bottom: 1px solid #ddd4;
}

main {
  padding: 16px;
  max-width: 820px;
  margin: 0 auto;
}

.hint,
.subtitle {
  color: var(--muted);
}

.badge {
  display: inline-block;
  padding: 2px 8px;
  border-radius: 999px;
  background: var(--accent);
  color: #fff;
  font-size: 12px;
}

.toc {
  margin: 8px 0 24px;
  padding: 8px 16px;
  border: 1px dashed #ddd6;
}

.toc a {
  color: var(--accent);
  text-decoration: none;
}

.toc-level-3 { margin-inline-start: 16px; }
.toc-level-4,
.toc-level-5,
.toc-level-6 { margin-inline-start: 32px; }

img,
video,
iframe {
  max-width: 100%;
  display: block;
  margin: 8px 0;
}

iframe {
  width: 100%;
  aspect-ratio: 16 / 9;
  border: 0;
}

figcaption,
blockquote cite {
  color: var(--muted);
  font-size: 14px;
}

blockquote {
  margin: 16px 0;
  padding: 4px 16px;
  border-inline-start: 4px solid var(--accent);
}

pre {
  overflow-x: auto;
  padding: 12px;
  background: #8881;
}

.table-container {
  overflow-x: auto;
}

table {
  border-collapse: collapse;
}

th,
td {
  border: 1px solid #ddd6;
  padding: 4px 8px;
}

.heading-size-1 { font-size: 2em; }
.heading-size-2 { font-size: 1.6em; }
.heading-size-3 { font-size: 1.35em; }
.heading-size-4 { font-size: 1.15em; }
.heading-size-5 { font-size: 1em; }
.heading-size-6 { font-size: 0.9em; }

.noselect {
  user-select: none;
  -webkit-user-select: none;
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{self, FormatPolicy};
    use serde_json::json;

    fn article() -> Article {
        serde_json::from_value(json!({
            "id": "a/1",
            "title": "Rates <rise>",
            "content": "## Intro\n\nBody text here.",
            "views_count": 12,
            "author": "Sara"
        }))
        .unwrap()
    }

    #[test]
    fn document_escapes_title_and_lists_sections() {
        let article = article();
        let rendered = content::render(&content::resolve(
            article.raw_content(),
            None,
            &FormatPolicy::default(),
        ));
        let page = render_document(
            &article,
            &rendered,
            PageMeta {
                reading_minutes: 1,
                is_new: true,
            },
        );
        assert!(page.contains("<title>Rates &lt;rise&gt;</title>"));
        assert!(page.contains("<a href=\"#section-1\">Intro</a>"));
        assert!(page.contains("1 min read · Sara"));
        assert!(page.contains("class=\"badge noselect\""));
        assert!(page.contains("format-markdown"));
    }

    #[tokio::test]
    async fn write_page_creates_files() {
        let td = tempfile::tempdir().unwrap();
        let article = article();
        let resolved = content::resolve("plain words", None, &FormatPolicy::default());
        let rendered = content::render(&resolved);
        let path = write_page(
            td.path(),
            &article,
            &rendered,
            PageMeta {
                reading_minutes: 1,
                is_new: false,
            },
        )
        .await
        .unwrap();
        assert_eq!(path, td.path().join("a_1.html"));
        assert!(td.path().join("static/style.css").exists());
        let body = std::fs::read_to_string(path).unwrap();
        assert!(!body.contains("badge"));
    }
}
