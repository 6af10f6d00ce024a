use super::blocks::{Embed, Unit};

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub fn html_attr(s: &str) -> String {
    html_escape(s).replace('"', "&quot;")
}

const VIDEO_ALLOW: &str =
    "accelerometer; autoplay; clipboard-write; encrypted-media; gyroscope; picture-in-picture";

/// Serialise visual units to HTML. All text is escaped; only embed markup is
/// inserted verbatim.
pub fn render_units(units: &[Unit]) -> String {
    let mut out = String::new();
    for unit in units {
        push_unit(&mut out, unit);
        out.push('\n');
    }
    out
}

fn push_unit(out: &mut String, unit: &Unit) {
    match unit {
        Unit::Paragraph { text } => {
            out.push_str(&format!("<p>{}</p>", html_escape(text)));
        }
        Unit::Heading {
            level,
            text,
            anchor,
        } => {
            out.push_str(&format!(
                "<h{lvl} id=\"{}\" class=\"heading-size-{lvl}\">{}</h{lvl}>",
                html_attr(anchor),
                html_escape(text),
                lvl = level
            ));
        }
        Unit::List { ordered, items } => {
            let tag = if *ordered { "ol" } else { "ul" };
            out.push_str(&format!("<{}>", tag));
            for item in items {
                out.push_str(&format!("<li>{}</li>", html_escape(item)));
            }
            out.push_str(&format!("</{}>", tag));
        }
        Unit::Quote { text, author } => {
            out.push_str(&format!("<blockquote><p>{}</p>", html_escape(text)));
            if let Some(author) = author {
                out.push_str(&format!("<cite>— {}</cite>", html_escape(author)));
            }
            out.push_str("</blockquote>");
        }
        Unit::Image { url, alt, caption } => {
            out.push_str(&format!(
                "<figure><img src=\"{}\" alt=\"{}\" />",
                html_attr(url),
                html_attr(alt.as_deref().unwrap_or(""))
            ));
            push_caption(out, caption.as_deref());
            out.push_str("</figure>");
        }
        Unit::Video { src, caption } => {
            out.push_str(&format!(
                "<figure class=\"video\"><iframe src=\"{}\" allow=\"{}\" allowfullscreen></iframe>",
                html_attr(src),
                VIDEO_ALLOW
            ));
            push_caption(out, caption.as_deref());
            out.push_str("</figure>");
        }
        Unit::Divider => out.push_str("<hr />"),
        Unit::Code { code, language } => match language {
            Some(lang) => out.push_str(&format!(
                "<pre><code class=\"language-{}\">{}</code></pre>",
                html_attr(lang),
                html_escape(code)
            )),
            None => out.push_str(&format!("<pre><code>{}</code></pre>", html_escape(code))),
        },
        Unit::Table { rows } => {
            out.push_str("<div class=\"table-container\"><table><tbody>");
            for row in rows {
                out.push_str("<tr>");
                for cell in row {
                    out.push_str(&format!("<td>{}</td>", html_escape(cell)));
                }
                out.push_str("</tr>");
            }
            out.push_str("</tbody></table></div>");
        }
        Unit::Embed(Embed::Markup(markup)) => {
            out.push_str(&format!("<div class=\"embed\">{}</div>", markup));
        }
        Unit::Embed(Embed::Frame(url)) => {
            out.push_str(&format!(
                "<div class=\"embed\"><iframe src=\"{}\" allowfullscreen></iframe></div>",
                html_attr(url)
            ));
        }
    }
}

fn push_caption(out: &mut String, caption: Option<&str>) {
    if let Some(caption) = caption {
        out.push_str(&format!("<figcaption>{}</figcaption>", html_escape(caption)));
    }
}

/// One `<p>` per plain-text segment.
pub fn render_paragraphs(paragraphs: &[String]) -> String {
    paragraphs
        .iter()
        .map(|p| format!("<p>{}</p>\n", html_escape(p)))
        .collect()
}
