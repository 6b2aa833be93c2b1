use crate::editing::document::{Alignment, Block, Document, HeadingLevel, Span};
use crate::editing::language::CodeLanguage;
use crate::editing::marks::{HighlightColor, MarkSet, TextColor};

/// Parse serialized markup into a document.
///
/// The parser is deliberately forgiving: unknown tags are transparent,
/// unmatched closers are ignored, and text outside any block opens an
/// implicit paragraph. Whatever happens, it produces a document — in the
/// worst case a single paragraph carrying the input's visible text.
pub fn parse(input: &str) -> Document {
    let mut parser = Parser::new(input);
    parser.run();
    Document::from_blocks(parser.blocks)
}

/// A cursor for byte-by-byte parsing of the markup string.
#[derive(Clone)]
struct Cursor<'a> {
    s: &'a str,
    i: usize,
}

impl<'a> Cursor<'a> {
    fn new(s: &'a str) -> Self {
        Self { s, i: 0 }
    }

    fn eof(&self) -> bool {
        self.i >= self.s.len()
    }

    fn peek(&self) -> Option<u8> {
        self.s.as_bytes().get(self.i).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.s.as_bytes().get(self.i).copied()?;
        self.i += 1;
        Some(b)
    }

    fn rest(&self) -> &'a str {
        &self.s[self.i..]
    }
}

/// A parsed tag: `<name attr="value">`, `</name>` or `<name/>`.
#[derive(Debug, PartialEq)]
struct Tag {
    name: String,
    attrs: Vec<(String, String)>,
    closing: bool,
}

impl Tag {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Value of a style property, if the tag has one.
    fn style(&self, prop: &str) -> Option<String> {
        let style = self.attr("style")?;
        for decl in style.split(';') {
            if let Some((name, value)) = decl.split_once(':')
                && name.trim().eq_ignore_ascii_case(prop)
            {
                return Some(value.trim().to_string());
            }
        }
        None
    }

    fn alignment(&self) -> Alignment {
        self.style("text-align")
            .and_then(|v| Alignment::from_css(&v))
            .unwrap_or_default()
    }
}

/// Attempts to parse a tag at the current position.
///
/// Returns `None` (cursor restored) when the input at `<` is not a
/// well-formed tag; the caller then treats the `<` as literal text.
fn try_parse_tag(cur: &mut Cursor<'_>) -> Option<Tag> {
    if cur.peek() != Some(b'<') {
        return None;
    }
    let saved = cur.clone();
    cur.bump(); // <

    let closing = cur.peek() == Some(b'/');
    if closing {
        cur.bump();
    }

    let name_start = cur.i;
    while let Some(b) = cur.peek() {
        if b.is_ascii_alphanumeric() {
            cur.bump();
        } else {
            break;
        }
    }
    if cur.i == name_start {
        *cur = saved;
        return None;
    }
    let name = cur.s[name_start..cur.i].to_ascii_lowercase();

    let mut attrs = Vec::new();
    loop {
        while cur.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            cur.bump();
        }
        match cur.peek() {
            Some(b'>') => {
                cur.bump();
                return Some(Tag {
                    name,
                    attrs,
                    closing,
                });
            }
            Some(b'/') if cur.rest().starts_with("/>") => {
                cur.bump();
                cur.bump();
                return Some(Tag {
                    name,
                    attrs,
                    closing,
                });
            }
            Some(_) => {
                if let Some(attr) = try_parse_attr(cur) {
                    attrs.push(attr);
                } else {
                    // Garbage inside the tag: not a tag after all.
                    *cur = saved;
                    return None;
                }
            }
            None => {
                *cur = saved;
                return None;
            }
        }
    }
}

fn try_parse_attr(cur: &mut Cursor<'_>) -> Option<(String, String)> {
    let name_start = cur.i;
    while let Some(b) = cur.peek() {
        if b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b':' {
            cur.bump();
        } else {
            break;
        }
    }
    if cur.i == name_start {
        return None;
    }
    let name = cur.s[name_start..cur.i].to_ascii_lowercase();

    if cur.peek() != Some(b'=') {
        // Bare attribute with no value.
        return Some((name, String::new()));
    }
    cur.bump(); // =

    let value = match cur.peek() {
        Some(q @ (b'"' | b'\'')) => {
            cur.bump();
            let start = cur.i;
            while let Some(b) = cur.peek() {
                if b == q {
                    break;
                }
                cur.bump();
            }
            let raw = &cur.s[start..cur.i];
            cur.bump()?; // closing quote; EOF means malformed
            raw
        }
        _ => {
            let start = cur.i;
            while let Some(b) = cur.peek() {
                if b.is_ascii_whitespace() || b == b'>' {
                    break;
                }
                cur.bump();
            }
            &cur.s[start..cur.i]
        }
    };
    Some((name, html_escape::decode_html_entities(value).into_owned()))
}

/// The block currently being assembled.
enum Ctx {
    Para {
        spans: Vec<Span>,
        align: Alignment,
    },
    Heading {
        level: HeadingLevel,
        spans: Vec<Span>,
        align: Alignment,
    },
    Quote {
        spans: Vec<Span>,
    },
    List {
        ordered: bool,
        items: Vec<Vec<Span>>,
        current: Option<Vec<Span>>,
    },
    Code {
        language: Option<CodeLanguage>,
        code: String,
    },
}

struct Parser<'a> {
    cur: Cursor<'a>,
    blocks: Vec<Block>,
    ctx: Option<Ctx>,
    /// Open inline mark frames: (tag name, marks before the tag opened).
    frames: Vec<(String, MarkSet)>,
    marks: MarkSet,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Parser {
            cur: Cursor::new(input),
            blocks: Vec::new(),
            ctx: None,
            frames: Vec::new(),
            marks: MarkSet::plain(),
        }
    }

    fn run(&mut self) {
        let mut text = String::new();
        while !self.cur.eof() {
            if self.cur.peek() == Some(b'<') {
                if let Some(tag) = try_parse_tag(&mut self.cur) {
                    self.flush_text(&mut text);
                    self.handle_tag(tag);
                    continue;
                }
            }
            // Literal text (including a stray '<' that failed to parse).
            let start = self.cur.i;
            self.cur.bump();
            while let Some(b) = self.cur.peek() {
                if b == b'<' {
                    break;
                }
                self.cur.bump();
            }
            text.push_str(&self.cur.s[start..self.cur.i]);
        }
        self.flush_text(&mut text);
        self.flush_block();
    }

    fn flush_text(&mut self, raw: &mut String) {
        if raw.is_empty() {
            return;
        }
        let decoded = html_escape::decode_html_entities(raw.as_str()).into_owned();
        raw.clear();
        match &mut self.ctx {
            Some(Ctx::Code { code, .. }) => code.push_str(&decoded),
            Some(_) => self.push_span(decoded),
            None => {
                // Text outside any block: whitespace between blocks is
                // layout noise, anything else opens an implicit paragraph.
                if !decoded.trim().is_empty() {
                    self.ctx = Some(Ctx::Para {
                        spans: Vec::new(),
                        align: Alignment::Left,
                    });
                    self.push_span(decoded);
                }
            }
        }
    }

    fn push_span(&mut self, text: String) {
        let span = Span::marked(text, self.marks.clone());
        match &mut self.ctx {
            Some(Ctx::Para { spans, .. })
            | Some(Ctx::Heading { spans, .. })
            | Some(Ctx::Quote { spans }) => spans.push(span),
            Some(Ctx::List { current, .. }) => match current {
                Some(item) => item.push(span),
                None => {
                    // Text directly inside <ul>; tolerate it as an item.
                    if !span.text.trim().is_empty() {
                        *current = Some(vec![span]);
                    }
                }
            },
            Some(Ctx::Code { code, .. }) => code.push_str(&span.text),
            None => {}
        }
    }

    /// Finish the current block and push it.
    fn flush_block(&mut self) {
        if let Some(ctx) = self.ctx.take() {
            self.blocks.push(build_block(ctx));
        }
    }

    /// Finish the current block only if it accumulated content, returning
    /// what kind to resume afterwards. Used when an image interrupts.
    fn flush_for_image(&mut self) -> Option<Ctx> {
        match self.ctx.take() {
            None => None,
            Some(ctx) => {
                let resume = resume_ctx(&ctx);
                let block = build_block(ctx);
                if !block_is_void(&block) {
                    self.blocks.push(block);
                }
                resume
            }
        }
    }

    fn handle_tag(&mut self, tag: Tag) {
        match tag.name.as_str() {
            "p" => {
                // A paragraph nested in a blockquote is transparent.
                if matches!(self.ctx, Some(Ctx::Quote { .. })) {
                    return;
                }
                if tag.closing {
                    self.flush_block();
                } else {
                    self.flush_block();
                    self.ctx = Some(Ctx::Para {
                        spans: Vec::new(),
                        align: tag.alignment(),
                    });
                }
            }
            "h1" | "h2" | "h3" => {
                if tag.closing {
                    self.flush_block();
                } else {
                    self.flush_block();
                    let level = match tag.name.as_str() {
                        "h1" => HeadingLevel::H1,
                        "h2" => HeadingLevel::H2,
                        _ => HeadingLevel::H3,
                    };
                    self.ctx = Some(Ctx::Heading {
                        level,
                        spans: Vec::new(),
                        align: tag.alignment(),
                    });
                }
            }
            "blockquote" => {
                self.flush_block();
                if !tag.closing {
                    self.ctx = Some(Ctx::Quote { spans: Vec::new() });
                }
            }
            "ul" | "ol" => {
                if tag.closing {
                    if let Some(Ctx::List { items, current, .. }) = &mut self.ctx {
                        if let Some(item) = current.take() {
                            items.push(item);
                        }
                        self.flush_block();
                    }
                } else if let Some(Ctx::List { items, current, .. }) = &mut self.ctx {
                    // Nested list: flatten into the enclosing one.
                    if let Some(item) = current.take() {
                        items.push(item);
                    }
                } else {
                    self.flush_block();
                    self.ctx = Some(Ctx::List {
                        ordered: tag.name == "ol",
                        items: Vec::new(),
                        current: None,
                    });
                }
            }
            "li" => {
                if let Some(Ctx::List { items, current, .. }) = &mut self.ctx {
                    if tag.closing {
                        if let Some(item) = current.take() {
                            items.push(item);
                        }
                    } else {
                        if let Some(item) = current.take() {
                            items.push(item);
                        }
                        *current = Some(Vec::new());
                    }
                }
            }
            "pre" => {
                self.flush_block();
                if !tag.closing {
                    self.ctx = Some(Ctx::Code {
                        language: None,
                        code: String::new(),
                    });
                }
            }
            "code" => {
                if let Some(Ctx::Code { language, .. }) = &mut self.ctx {
                    if !tag.closing
                        && let Some(lang) = tag.attr("language")
                    {
                        // Unknown tags degrade to plain text.
                        *language = CodeLanguage::parse(lang);
                    }
                } else if tag.closing {
                    self.close_frame("code");
                } else {
                    self.open_frame(&tag, |m, _| m.code = true);
                }
            }
            "img" => {
                if let Some(src) = tag.attr("src")
                    && !src.trim().is_empty()
                {
                    let resume = self.flush_for_image();
                    self.blocks.push(Block::Image {
                        src: src.trim().to_string(),
                    });
                    self.ctx = resume;
                }
            }
            "a" => {
                if tag.closing {
                    self.close_frame("a");
                } else {
                    self.open_frame(&tag, |m, t| {
                        m.link = t.attr("href").map(|h| h.to_string());
                    });
                }
            }
            "strong" | "b" => self.boolean_frame(&tag, "strong", |m| m.bold = true),
            "em" | "i" => self.boolean_frame(&tag, "em", |m| m.italic = true),
            "u" => self.boolean_frame(&tag, "u", |m| m.underline = true),
            "s" | "del" | "strike" => self.boolean_frame(&tag, "s", |m| m.strike = true),
            "span" | "mark" => {
                if tag.closing {
                    self.close_frame(&tag.name);
                } else {
                    self.open_frame(&tag, |m, t| {
                        if let Some(c) = t.style("color").and_then(|v| TextColor::from_hex(&v)) {
                            m.color = Some(c);
                        }
                        if let Some(h) = t
                            .style("background-color")
                            .and_then(|v| HighlightColor::from_hex(&v))
                        {
                            m.highlight = Some(h);
                        }
                    });
                }
            }
            "br" => {
                if !tag.closing {
                    self.push_span("\n".to_string());
                }
            }
            // Unknown tags are transparent; their text still flows through.
            _ => {}
        }
    }

    fn boolean_frame(&mut self, tag: &Tag, canonical: &str, set: impl Fn(&mut MarkSet)) {
        if tag.closing {
            self.close_frame(canonical);
        } else {
            let before = self.marks.clone();
            set(&mut self.marks);
            self.frames.push((canonical.to_string(), before));
        }
    }

    fn open_frame(&mut self, tag: &Tag, set: impl Fn(&mut MarkSet, &Tag)) {
        let before = self.marks.clone();
        set(&mut self.marks, tag);
        self.frames.push((tag.name.clone(), before));
    }

    /// Close the innermost frame with this name, restoring the marks that
    /// were active before it opened. Unmatched closers are ignored.
    fn close_frame(&mut self, name: &str) {
        if let Some(pos) = self.frames.iter().rposition(|(n, _)| n == name) {
            let (_, before) = self.frames.remove(pos);
            if pos == self.frames.len() {
                self.marks = before;
            } else {
                // Misnested input: restore to the state before the closed
                // frame and drop everything opened above it.
                self.frames.truncate(pos);
                self.marks = before;
            }
        }
    }
}

fn build_block(ctx: Ctx) -> Block {
    match ctx {
        Ctx::Para { spans, align } => Block::Paragraph { spans, align },
        Ctx::Heading {
            level,
            spans,
            align,
        } => Block::Heading {
            level,
            spans,
            align,
        },
        Ctx::Quote { spans } => Block::Blockquote { spans },
        Ctx::List {
            ordered,
            mut items,
            current,
        } => {
            if let Some(item) = current {
                items.push(item);
            }
            if ordered {
                Block::OrderedList { items }
            } else {
                Block::BulletList { items }
            }
        }
        Ctx::Code { language, code } => Block::CodeBlock { language, code },
    }
}

/// Fresh context of the same kind, for resuming after an image.
fn resume_ctx(ctx: &Ctx) -> Option<Ctx> {
    match ctx {
        Ctx::Para { align, .. } => Some(Ctx::Para {
            spans: Vec::new(),
            align: *align,
        }),
        Ctx::Heading { level, align, .. } => Some(Ctx::Heading {
            level: *level,
            spans: Vec::new(),
            align: *align,
        }),
        Ctx::Quote { .. } => Some(Ctx::Quote { spans: Vec::new() }),
        Ctx::List { ordered, .. } => Some(Ctx::List {
            ordered: *ordered,
            items: Vec::new(),
            current: None,
        }),
        Ctx::Code { language, .. } => Some(Ctx::Code {
            language: *language,
            code: String::new(),
        }),
    }
}

/// True for blocks that would add nothing if pushed (used only when an
/// image interrupts an open block).
fn block_is_void(block: &Block) -> bool {
    match block {
        Block::Paragraph { spans, .. }
        | Block::Heading { spans, .. }
        | Block::Blockquote { spans } => spans.is_empty(),
        Block::BulletList { items } | Block::OrderedList { items } => items.is_empty(),
        Block::CodeBlock { code, .. } => code.is_empty(),
        Block::Image { .. } => false,
    }
}
