use crate::editing::document::{Alignment, Block, Document, Span};
use crate::editing::marks::MarkSet;

/// Serialize a document to its canonical markup.
///
/// Deterministic by construction: blocks emit exactly one wrapping tag
/// pair each, and inline marks nest in a fixed order (link, then
/// color/highlight span, then strong/em/u/s/code), so serializing a loaded
/// document reproduces the input byte for byte.
pub fn serialize(doc: &Document) -> String {
    let mut out = String::new();
    for block in doc.blocks() {
        write_block(&mut out, block);
    }
    out
}

fn write_block(out: &mut String, block: &Block) {
    match block {
        Block::Paragraph { spans, align } => {
            open_aligned(out, "p", *align);
            write_spans(out, spans);
            out.push_str("</p>");
        }
        Block::Heading { level, spans, align } => {
            let tag = match level.as_u8() {
                1 => "h1",
                2 => "h2",
                _ => "h3",
            };
            open_aligned(out, tag, *align);
            write_spans(out, spans);
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
        Block::BulletList { items } => write_list(out, "ul", items),
        Block::OrderedList { items } => write_list(out, "ol", items),
        Block::Blockquote { spans } => {
            out.push_str("<blockquote>");
            write_spans(out, spans);
            out.push_str("</blockquote>");
        }
        Block::CodeBlock { language, code } => {
            match language {
                Some(lang) => {
                    out.push_str("<pre><code language=\"");
                    out.push_str(lang.as_str());
                    out.push_str("\">");
                }
                None => out.push_str("<pre><code>"),
            }
            out.push_str(&html_escape::encode_text(code));
            out.push_str("</code></pre>");
        }
        Block::Image { src } => {
            out.push_str("<img src=\"");
            out.push_str(&html_escape::encode_double_quoted_attribute(src));
            out.push_str("\">");
        }
    }
}

fn open_aligned(out: &mut String, tag: &str, align: Alignment) {
    out.push('<');
    out.push_str(tag);
    if align != Alignment::Left {
        out.push_str(" style=\"text-align: ");
        out.push_str(align.as_css());
        out.push('"');
    }
    out.push('>');
}

fn write_list(out: &mut String, tag: &str, items: &[Vec<Span>]) {
    out.push('<');
    out.push_str(tag);
    out.push('>');
    for item in items {
        out.push_str("<li>");
        write_spans(out, item);
        out.push_str("</li>");
    }
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn write_spans(out: &mut String, spans: &[Span]) {
    for span in spans {
        write_span(out, span);
    }
}

fn write_span(out: &mut String, span: &Span) {
    let marks = &span.marks;
    let style = style_of(marks);

    if let Some(href) = &marks.link {
        out.push_str("<a href=\"");
        out.push_str(&html_escape::encode_double_quoted_attribute(href));
        out.push_str("\">");
    }
    if let Some(style) = &style {
        out.push_str("<span style=\"");
        out.push_str(style);
        out.push_str("\">");
    }
    if marks.bold {
        out.push_str("<strong>");
    }
    if marks.italic {
        out.push_str("<em>");
    }
    if marks.underline {
        out.push_str("<u>");
    }
    if marks.strike {
        out.push_str("<s>");
    }
    if marks.code {
        out.push_str("<code>");
    }

    out.push_str(&html_escape::encode_text(&span.text));

    if marks.code {
        out.push_str("</code>");
    }
    if marks.strike {
        out.push_str("</s>");
    }
    if marks.underline {
        out.push_str("</u>");
    }
    if marks.italic {
        out.push_str("</em>");
    }
    if marks.bold {
        out.push_str("</strong>");
    }
    if style.is_some() {
        out.push_str("</span>");
    }
    if marks.link.is_some() {
        out.push_str("</a>");
    }
}

/// Inline style for the color/highlight span, color first.
fn style_of(marks: &MarkSet) -> Option<String> {
    match (marks.color, marks.highlight) {
        (None, None) => None,
        (Some(c), None) => Some(format!("color: {}", c.as_hex())),
        (None, Some(h)) => Some(format!("background-color: {}", h.as_hex())),
        (Some(c), Some(h)) => Some(format!(
            "color: {}; background-color: {}",
            c.as_hex(),
            h.as_hex()
        )),
    }
}
