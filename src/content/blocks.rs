//! Structured block list → typed visual units.
//!
//! Blocks arrive as loose JSON produced by several editor generations, so
//! fields are looked up on `data.<type>`, then `data`, then the block itself.
//! A block that cannot produce a unit is skipped; it never aborts the list.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use super::section_anchor;
use crate::model::TocEntry;

static YOUTUBE_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?:youtube\.com/(?:[^/]+/.+/|(?:v|e(?:mbed)?)/|.*[?&]v=)|youtu\.be/)([^"&?/\s]{11})"#,
    )
    .expect("valid regex")
});
static VIMEO_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"vimeo\.com/(\d+)").expect("valid regex"));

pub const DEFAULT_HEADING_LEVEL: u8 = 2;
pub const SMALLEST_HEADING_LEVEL: u8 = 6;

/// One renderable piece of an article.
#[derive(Debug, Clone, PartialEq)]
pub enum Unit {
    Paragraph {
        text: String,
    },
    Heading {
        level: u8,
        text: String,
        anchor: String,
    },
    List {
        ordered: bool,
        items: Vec<String>,
    },
    Quote {
        text: String,
        author: Option<String>,
    },
    Image {
        url: String,
        alt: Option<String>,
        caption: Option<String>,
    },
    Video {
        src: String,
        caption: Option<String>,
    },
    Divider,
    Code {
        code: String,
        language: Option<String>,
    },
    Table {
        rows: Vec<Vec<String>>,
    },
    Embed(Embed),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Embed {
    /// Provider-supplied markup, inserted verbatim.
    Markup(String),
    /// URL shown in an embed frame.
    Frame(String),
}

impl Unit {
    /// Text that counts toward reading time.
    pub fn text_fields(&self) -> Vec<&str> {
        match self {
            Unit::Paragraph { text } | Unit::Heading { text, .. } => vec![text.as_str()],
            Unit::Quote { text, author } => {
                let mut v = vec![text.as_str()];
                v.extend(author.as_deref());
                v
            }
            Unit::List { items, .. } => items.iter().map(String::as_str).collect(),
            Unit::Image { caption, .. } | Unit::Video { caption, .. } => {
                caption.as_deref().into_iter().collect()
            }
            Unit::Code { code, .. } => vec![code.as_str()],
            Unit::Table { rows } => rows.iter().flatten().map(String::as_str).collect(),
            Unit::Divider | Unit::Embed(_) => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    Paragraph,
    Heading,
    Quote,
    List,
    Image,
    Video,
    Divider,
    Code,
    Table,
    Embed,
    Unknown,
}

impl BlockKind {
    fn parse(s: &str) -> Self {
        match s {
            "paragraph" => BlockKind::Paragraph,
            "heading" => BlockKind::Heading,
            "quote" => BlockKind::Quote,
            "list" => BlockKind::List,
            "image" => BlockKind::Image,
            "video" => BlockKind::Video,
            "divider" => BlockKind::Divider,
            "code" => BlockKind::Code,
            "table" => BlockKind::Table,
            "embed" => BlockKind::Embed,
            _ => BlockKind::Unknown,
        }
    }
}

/// Field lookup across the nested shapes a block may take.
struct Fields<'a> {
    block: &'a Value,
    data: Option<&'a Value>,
}

impl<'a> Fields<'a> {
    fn new(block: &'a Value, kind: &str) -> Self {
        let data = block
            .get("data")
            .and_then(|d| d.get(kind).filter(|v| v.is_object()).or(Some(d)))
            .filter(|d| d.is_object());
        Self { block, data }
    }

    /// First present, non-empty value among `names`, data before block.
    fn get(&self, names: &[&str]) -> Option<&'a Value> {
        let scopes = self.data.into_iter().chain(std::iter::once(self.block));
        for scope in scopes {
            for name in names {
                if let Some(v) = scope.get(*name).filter(|v| is_present(v)) {
                    return Some(v);
                }
            }
        }
        None
    }

    fn text(&self, names: &[&str]) -> Option<String> {
        self.get(names).and_then(|v| coerce_text(v, &["text"]))
    }
}

fn is_present(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Bool(b) => *b,
        _ => true,
    }
}

/// Text fields may be a string or an object wrapper. Objects yield the first
/// of `keys` that is a string, otherwise their JSON form.
fn coerce_text(v: &Value, keys: &[&str]) -> Option<String> {
    let text = match v {
        Value::Null => return None,
        Value::String(s) => s.clone(),
        Value::Object(map) => keys
            .iter()
            .find_map(|k| map.get(*k).and_then(Value::as_str).map(str::to_string))
            .unwrap_or_else(|| v.to_string()),
        other => other.to_string(),
    };
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Clamp a raw heading level onto the supported sizes.
pub fn heading_level(raw: Option<&Value>) -> u8 {
    let n = match raw {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    if !n.is_finite() || n < 1.0 {
        DEFAULT_HEADING_LEVEL
    } else if n > SMALLEST_HEADING_LEVEL as f64 {
        SMALLEST_HEADING_LEVEL
    } else {
        n as u8
    }
}

/// Rewrite known video hosts to their embeddable player URL.
pub fn video_embed_url(url: &str) -> String {
    if url.contains("youtube.com") || url.contains("youtu.be") {
        if let Some(caps) = YOUTUBE_ID.captures(url) {
            return format!("https://www.youtube.com/embed/{}", &caps[1]);
        }
    } else if url.contains("vimeo.com") {
        if let Some(caps) = VIMEO_ID.captures(url) {
            return format!("https://player.vimeo.com/video/{}", &caps[1]);
        }
    }
    url.to_string()
}

/// Render every block, skipping the ones that produce nothing.
/// Returns the units together with the table of contents of their headings.
pub fn render_blocks(blocks: &[Value]) -> (Vec<Unit>, Vec<TocEntry>) {
    let mut units = Vec::with_capacity(blocks.len());
    let mut toc = Vec::new();
    for (index, block) in blocks.iter().enumerate() {
        match render_block(block, toc.len() + 1) {
            Some(unit) => {
                if let Unit::Heading {
                    level,
                    text,
                    anchor,
                } = &unit
                {
                    toc.push(TocEntry {
                        id: anchor.clone(),
                        title: text.clone(),
                        level: *level,
                    });
                }
                units.push(unit);
            }
            None => debug!(index, "block skipped"),
        }
    }
    (units, toc)
}

/// Render one block. `heading_ordinal` is the 1-based index this block gets
/// if it turns out to be a heading.
pub fn render_block(block: &Value, heading_ordinal: usize) -> Option<Unit> {
    let type_name = block.get("type")?.as_str()?;
    let f = Fields::new(block, type_name);

    match BlockKind::parse(type_name) {
        BlockKind::Paragraph => Some(Unit::Paragraph {
            text: f.text(&["text", "content"])?,
        }),
        BlockKind::Heading => Some(Unit::Heading {
            text: f.text(&["text", "content"])?,
            level: heading_level(f.get(&["level"])),
            anchor: section_anchor(heading_ordinal),
        }),
        BlockKind::Quote => Some(Unit::Quote {
            text: f.text(&["text", "content"])?,
            author: f.text(&["author", "caption"]),
        }),
        BlockKind::List => {
            let items: Vec<String> = f
                .get(&["items"])?
                .as_array()?
                .iter()
                .filter_map(|item| coerce_text(item, &["text", "content"]))
                .collect();
            if items.is_empty() {
                return None;
            }
            let ordered = f.get(&["ordered"]).and_then(Value::as_bool).unwrap_or(false)
                || f.get(&["style"]).and_then(Value::as_str) == Some("ordered");
            Some(Unit::List { ordered, items })
        }
        BlockKind::Image => {
            let url = f
                .get(&["url"])
                .and_then(Value::as_str)
                .or_else(|| {
                    f.get(&["file"])
                        .and_then(|file| file.get("url"))
                        .and_then(Value::as_str)
                })
                .or_else(|| f.get(&["src"]).and_then(Value::as_str))
                .filter(|u| !u.trim().is_empty())?;
            Some(Unit::Image {
                url: url.to_string(),
                alt: f.text(&["alt"]),
                caption: f.text(&["caption"]),
            })
        }
        BlockKind::Video => {
            let url = f
                .get(&["url", "src"])
                .and_then(Value::as_str)
                .filter(|u| !u.trim().is_empty())?;
            Some(Unit::Video {
                src: video_embed_url(url),
                caption: f.text(&["caption"]),
            })
        }
        BlockKind::Divider => Some(Unit::Divider),
        BlockKind::Code => {
            let code = f
                .get(&["code", "text"])
                .and_then(|v| coerce_text(v, &["text", "code"]))?;
            Some(Unit::Code {
                code,
                language: f.text(&["language"]),
            })
        }
        BlockKind::Table => {
            let rows: Vec<Vec<String>> = f
                .get(&["content", "rows"])?
                .as_array()?
                .iter()
                .map(|row| match row {
                    Value::Array(cells) => cells
                        .iter()
                        .map(|c| coerce_text(c, &["text", "content"]).unwrap_or_default())
                        .collect(),
                    other => vec![coerce_text(other, &["text", "content"]).unwrap_or_default()],
                })
                .collect();
            if rows.is_empty() {
                return None;
            }
            Some(Unit::Table { rows })
        }
        BlockKind::Embed => {
            if let Some(markup) = f.get(&["embed", "html"]).and_then(Value::as_str) {
                return Some(Unit::Embed(Embed::Markup(markup.to_string())));
            }
            let url = f.get(&["url"]).and_then(Value::as_str)?;
            Some(Unit::Embed(Embed::Frame(url.to_string())))
        }
        BlockKind::Unknown => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn one(block: Value) -> Option<Unit> {
        render_block(&block, 1)
    }

    #[test]
    fn heading_then_paragraph() {
        let blocks: Vec<Value> = serde_json::from_str(
            r#"[{"type":"heading","level":2,"text":"Intro"},{"type":"paragraph","text":"Hello world"}]"#,
        )
        .unwrap();
        let (units, toc) = render_blocks(&blocks);
        assert_eq!(
            units,
            vec![
                Unit::Heading {
                    level: 2,
                    text: "Intro".into(),
                    anchor: "section-1".into()
                },
                Unit::Paragraph {
                    text: "Hello world".into()
                },
            ]
        );
        assert_eq!(toc.len(), 1);
        assert_eq!(toc[0].title, "Intro");
    }

    #[test]
    fn one_unit_per_recognised_block_zero_for_unknown() {
        let blocks = vec![
            json!({"type": "paragraph", "text": "a"}),
            json!({"type": "tweet", "text": "ignored"}),
            json!({"type": "divider"}),
            json!("not an object"),
            json!({"no_type": true}),
            json!({"type": 7}),
            json!({"type": "paragraph"}),
            json!({"type": "quote", "text": "q"}),
        ];
        let (units, _) = render_blocks(&blocks);
        assert_eq!(units.len(), 3);
        assert_eq!(units[1], Unit::Divider);
    }

    #[test]
    fn heading_levels_clamp() {
        assert_eq!(heading_level(Some(&json!(1))), 1);
        assert_eq!(heading_level(Some(&json!(6))), 6);
        assert_eq!(heading_level(Some(&json!(9))), SMALLEST_HEADING_LEVEL);
        assert_eq!(heading_level(Some(&json!(0))), DEFAULT_HEADING_LEVEL);
        assert_eq!(heading_level(Some(&json!("3"))), 3);
        assert_eq!(heading_level(None), DEFAULT_HEADING_LEVEL);
        assert_eq!(heading_level(Some(&json!("NaN"))), DEFAULT_HEADING_LEVEL);
        assert_eq!(heading_level(Some(&json!("inf"))), DEFAULT_HEADING_LEVEL);
        assert_eq!(
            one(json!({"type": "heading", "level": "NaN", "text": "x"})),
            Some(Unit::Heading {
                level: DEFAULT_HEADING_LEVEL,
                text: "x".into(),
                anchor: "section-1".into()
            })
        );
    }

    #[test]
    fn editor_data_shapes_are_understood() {
        let nested = one(json!({"type": "paragraph", "data": {"paragraph": {"text": "deep"}}}));
        assert_eq!(nested, Some(Unit::Paragraph { text: "deep".into() }));

        let flat = one(json!({"type": "heading", "data": {"text": "Flat", "level": 3}}));
        assert_eq!(
            flat,
            Some(Unit::Heading {
                level: 3,
                text: "Flat".into(),
                anchor: "section-1".into()
            })
        );
    }

    #[test]
    fn object_text_is_unwrapped_or_stringified() {
        let wrapped = one(json!({"type": "paragraph", "text": {"text": "inner"}}));
        assert_eq!(wrapped, Some(Unit::Paragraph { text: "inner".into() }));

        let opaque = one(json!({"type": "paragraph", "text": {"x": 1}}));
        assert_eq!(opaque, Some(Unit::Paragraph { text: r#"{"x":1}"#.into() }));
    }

    #[test]
    fn list_variants() {
        let ordered = one(json!({"type": "list", "style": "ordered", "items": ["a", {"text": "b"}, ""]}));
        assert_eq!(
            ordered,
            Some(Unit::List {
                ordered: true,
                items: vec!["a".into(), "b".into()]
            })
        );
        let bullet = one(json!({"type": "list", "items": ["x"]}));
        assert_eq!(
            bullet,
            Some(Unit::List {
                ordered: false,
                items: vec!["x".into()]
            })
        );
        assert_eq!(one(json!({"type": "list", "items": []})), None);
    }

    #[test]
    fn quote_author_falls_back_to_caption() {
        let q = one(json!({"type": "quote", "text": "words", "caption": "Someone"}));
        assert_eq!(
            q,
            Some(Unit::Quote {
                text: "words".into(),
                author: Some("Someone".into())
            })
        );
    }

    #[test]
    fn image_url_sources() {
        let file = one(json!({"type": "image", "data": {"file": {"url": "https://cdn/x.png"}}}));
        assert!(matches!(file, Some(Unit::Image { ref url, .. }) if url == "https://cdn/x.png"));
        let src = one(json!({"type": "image", "src": "/a.jpg", "alt": "A", "caption": {"text": "Cap"}}));
        assert_eq!(
            src,
            Some(Unit::Image {
                url: "/a.jpg".into(),
                alt: Some("A".into()),
                caption: Some("Cap".into())
            })
        );
        assert_eq!(one(json!({"type": "image"})), None);
    }

    #[test]
    fn video_hosts_are_rewritten() {
        assert_eq!(
            video_embed_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=3"),
            "https://www.youtube.com/embed/dQw4w9WgXcQ"
        );
        assert_eq!(
            video_embed_url("https://youtu.be/dQw4w9WgXcQ"),
            "https://www.youtube.com/embed/dQw4w9WgXcQ"
        );
        assert_eq!(
            video_embed_url("https://vimeo.com/76979871"),
            "https://player.vimeo.com/video/76979871"
        );
        assert_eq!(video_embed_url("https://cdn/clip.mp4"), "https://cdn/clip.mp4");
        assert_eq!(
            video_embed_url("https://www.youtube.com/channel"),
            "https://www.youtube.com/channel"
        );
    }

    #[test]
    fn code_and_table_blocks() {
        let code = one(json!({"type": "code", "code": "fn main() {}", "language": "rust"}));
        assert_eq!(
            code,
            Some(Unit::Code {
                code: "fn main() {}".into(),
                language: Some("rust".into())
            })
        );
        let table = one(json!({"type": "table", "content": [["a", {"text": "b"}], "solo"]}));
        assert_eq!(
            table,
            Some(Unit::Table {
                rows: vec![vec!["a".into(), "b".into()], vec!["solo".into()]]
            })
        );
        assert_eq!(one(json!({"type": "table", "content": []})), None);
    }

    #[test]
    fn embed_prefers_markup_over_url() {
        let both = one(json!({"type": "embed", "embed": "<blockquote>x</blockquote>", "url": "https://e"}));
        assert_eq!(
            both,
            Some(Unit::Embed(Embed::Markup("<blockquote>x</blockquote>".into())))
        );
        let frame = one(json!({"type": "embed", "url": "https://e"}));
        assert_eq!(frame, Some(Unit::Embed(Embed::Frame("https://e".into()))));
        assert_eq!(one(json!({"type": "embed"})), None);
    }

    #[test]
    fn anchors_count_only_headings() {
        let blocks = vec![
            json!({"type": "heading", "text": "A"}),
            json!({"type": "paragraph", "text": "p"}),
            json!({"type": "heading"}),
            json!({"type": "heading", "text": "B", "level": 3}),
        ];
        let (_, toc) = render_blocks(&blocks);
        let ids: Vec<_> = toc.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["section-1", "section-2"]);
        assert_eq!(toc[1].level, 3);
    }
}
