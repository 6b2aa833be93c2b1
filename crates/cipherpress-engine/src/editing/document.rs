use crate::editing::language::CodeLanguage;
use crate::editing::marks::MarkSet;
use crate::editing::{Cmd, CommandError, Patch};

/// Horizontal alignment for paragraphs and headings.
///
/// `Left` is the default and is never written to the serialized form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

impl Alignment {
    /// CSS keyword used in the `text-align` style property.
    pub fn as_css(self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
        }
    }

    pub fn from_css(value: &str) -> Option<Self> {
        match value {
            "left" => Some(Alignment::Left),
            "center" => Some(Alignment::Center),
            "right" => Some(Alignment::Right),
            _ => None,
        }
    }
}

/// Heading levels supported by the editor toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
}

impl HeadingLevel {
    pub fn as_u8(self) -> u8 {
        match self {
            HeadingLevel::H1 => 1,
            HeadingLevel::H2 => 2,
            HeadingLevel::H3 => 3,
        }
    }

    pub fn from_u8(level: u8) -> Option<Self> {
        match level {
            1 => Some(HeadingLevel::H1),
            2 => Some(HeadingLevel::H2),
            3 => Some(HeadingLevel::H3),
            _ => None,
        }
    }
}

/// A run of text with a uniform set of marks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub marks: MarkSet,
}

impl Span {
    pub fn plain(text: impl Into<String>) -> Self {
        Span {
            text: text.into(),
            marks: MarkSet::plain(),
        }
    }

    pub fn marked(text: impl Into<String>, marks: MarkSet) -> Self {
        Span {
            text: text.into(),
            marks,
        }
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// A block-level node of the document tree.
///
/// Every block owns its inline content outright; blocks are never shared
/// between documents.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph {
        spans: Vec<Span>,
        align: Alignment,
    },
    Heading {
        level: HeadingLevel,
        spans: Vec<Span>,
        align: Alignment,
    },
    BulletList {
        items: Vec<Vec<Span>>,
    },
    OrderedList {
        items: Vec<Vec<Span>>,
    },
    Blockquote {
        spans: Vec<Span>,
    },
    CodeBlock {
        language: Option<CodeLanguage>,
        code: String,
    },
    Image {
        src: String,
    },
}

impl Block {
    pub fn paragraph(spans: Vec<Span>) -> Self {
        Block::Paragraph {
            spans,
            align: Alignment::Left,
        }
    }

    pub fn empty_paragraph() -> Self {
        Block::paragraph(Vec::new())
    }

    /// Length of this block in text-space characters.
    ///
    /// List items are separated by one position each; an image occupies a
    /// single atom position.
    pub fn char_len(&self) -> usize {
        match self {
            Block::Paragraph { spans, .. }
            | Block::Heading { spans, .. }
            | Block::Blockquote { spans } => spans_char_len(spans),
            Block::BulletList { items } | Block::OrderedList { items } => {
                let text: usize = items.iter().map(|item| spans_char_len(item)).sum();
                text + items.len().saturating_sub(1)
            }
            Block::CodeBlock { code, .. } => code.chars().count(),
            Block::Image { .. } => 1,
        }
    }

    /// Visible text of this block. Images contribute nothing.
    pub fn text(&self) -> String {
        match self {
            Block::Paragraph { spans, .. }
            | Block::Heading { spans, .. }
            | Block::Blockquote { spans } => spans_text(spans),
            Block::BulletList { items } | Block::OrderedList { items } => items
                .iter()
                .map(|item| spans_text(item))
                .collect::<Vec<_>>()
                .join("\n"),
            Block::CodeBlock { code, .. } => code.clone(),
            Block::Image { .. } => String::new(),
        }
    }

    /// True when the block carries no visible text and no media.
    pub fn is_blank(&self) -> bool {
        match self {
            Block::Image { .. } => false,
            Block::CodeBlock { code, .. } => code.trim().is_empty(),
            _ => self.text().trim().is_empty(),
        }
    }

    fn normalize(&mut self) {
        match self {
            Block::Paragraph { spans, .. }
            | Block::Heading { spans, .. }
            | Block::Blockquote { spans } => merge_spans(spans),
            Block::BulletList { items } | Block::OrderedList { items } => {
                for item in items.iter_mut() {
                    merge_spans(item);
                }
            }
            Block::CodeBlock { .. } | Block::Image { .. } => {}
        }
    }
}

/// Where a text-space position lands inside the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Location {
    /// Inside the inline content of a block; `item` is set for list blocks.
    Inline {
        block: usize,
        item: Option<usize>,
        offset: usize,
    },
    /// Inside the raw text of a code block.
    Code { block: usize, offset: usize },
    /// At an image atom; `offset` is 0 (before) or 1 (after).
    Image { block: usize, offset: usize },
}

impl Location {
    /// Index of the block this location falls in.
    pub(crate) fn block(&self) -> usize {
        match self {
            Location::Inline { block, .. }
            | Location::Code { block, .. }
            | Location::Image { block, .. } => *block,
        }
    }
}

/// One inline region's overlap with the current selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct InlineSel {
    pub block: usize,
    pub item: Option<usize>,
    /// Char range local to the region's text.
    pub start: usize,
    pub end: usize,
}

/// The editable post body: an ordered sequence of blocks plus the current
/// selection and an edit version counter.
///
/// All mutation flows through [`Document::apply`] with a [`Cmd`]; commands
/// validate their arguments before touching any state, so a command that
/// returns an error leaves the document exactly as it was. After every
/// successful mutation the document is renormalized (adjacent spans with
/// identical marks merged, empty spans dropped, at least one paragraph
/// present), which is what makes repeated serialization stable.
///
/// Selection positions are char offsets into the document's *text space*:
/// the concatenation of each block's text with one separator position
/// between blocks (and between list items). An image occupies exactly one
/// position.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub(crate) blocks: Vec<Block>,
    pub(crate) selection: std::ops::Range<usize>,
    pub(crate) version: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document: a single empty paragraph, cursor at 0.
    pub fn new() -> Self {
        Document {
            blocks: vec![Block::empty_paragraph()],
            selection: 0..0,
            version: 0,
        }
    }

    /// Build a document from blocks, normalizing them.
    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        let mut doc = Document {
            blocks,
            selection: 0..0,
            version: 0,
        };
        doc.normalize();
        doc
    }

    /// Hydrate a document from its serialized markup.
    ///
    /// Parsing is forgiving: malformed input degrades to whatever structure
    /// can be recovered, in the worst case a single paragraph holding the
    /// input's visible text. This never fails.
    pub fn load(serialized: &str) -> Self {
        crate::html::parse(serialized)
    }

    /// Produce the canonical serialized markup for this document.
    pub fn serialize(&self) -> String {
        crate::html::serialize(self)
    }

    /// Apply a command at the current selection.
    ///
    /// Returns the resulting [`Patch`]. Validation errors leave the
    /// document untouched; no-op commands (empty selection where one is
    /// required, unknown targets) succeed without bumping the version.
    pub fn apply(&mut self, cmd: Cmd) -> Result<Patch, CommandError> {
        let changed = crate::editing::commands::apply_command(self, &cmd)?;
        if changed {
            self.normalize();
            self.version += 1;
        }
        Ok(Patch {
            changed,
            new_selection: self.selection.clone(),
            version: self.version,
        })
    }

    /// True when the document holds no non-whitespace text and no images.
    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(Block::is_blank)
    }

    /// Visible text of the whole document, blocks separated by newlines.
    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(Block::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn selection(&self) -> std::ops::Range<usize> {
        self.selection.clone()
    }

    /// Set the selection, clamped to the document's text space.
    pub fn set_selection(&mut self, selection: std::ops::Range<usize>) {
        let len = self.char_len();
        let start = selection.start.min(len);
        let end = selection.end.min(len).max(start);
        self.selection = start..end;
    }

    /// Total length of the document in text-space characters.
    pub fn char_len(&self) -> usize {
        let text: usize = self.blocks.iter().map(Block::char_len).sum();
        text + self.blocks.len().saturating_sub(1)
    }

    /// Text-space offset where block `idx` begins.
    pub(crate) fn block_start(&self, idx: usize) -> usize {
        self.blocks[..idx]
            .iter()
            .map(|b| b.char_len() + 1)
            .sum()
    }

    /// Map a text-space position to a concrete location.
    pub(crate) fn locate(&self, pos: usize) -> Location {
        let pos = pos.min(self.char_len());
        let mut at = 0;
        let last = self.blocks.len().saturating_sub(1);
        for (idx, block) in self.blocks.iter().enumerate() {
            let len = block.char_len();
            if pos <= at + len || idx == last {
                let local = (pos - at).min(len);
                return match block {
                    Block::CodeBlock { .. } => Location::Code {
                        block: idx,
                        offset: local,
                    },
                    Block::Image { .. } => Location::Image {
                        block: idx,
                        offset: local,
                    },
                    Block::BulletList { items } | Block::OrderedList { items } => {
                        let mut item_at = 0;
                        let last_item = items.len().saturating_sub(1);
                        for (j, item) in items.iter().enumerate() {
                            let ilen = spans_char_len(item);
                            if local <= item_at + ilen || j == last_item {
                                return Location::Inline {
                                    block: idx,
                                    item: Some(j),
                                    offset: (local - item_at).min(ilen),
                                };
                            }
                            item_at += ilen + 1;
                        }
                        Location::Inline {
                            block: idx,
                            item: Some(0),
                            offset: 0,
                        }
                    }
                    _ => Location::Inline {
                        block: idx,
                        item: None,
                        offset: local,
                    },
                };
            }
            at += len + 1;
        }
        Location::Inline {
            block: 0,
            item: None,
            offset: 0,
        }
    }

    /// Inclusive range of block indices touched by a text-space range.
    pub(crate) fn covered_blocks(&self, range: &std::ops::Range<usize>) -> (usize, usize) {
        (
            self.locate(range.start).block(),
            self.locate(range.end).block(),
        )
    }

    /// The overlap of `range` with every inline region it touches.
    ///
    /// Code blocks and images are not inline regions and are skipped.
    pub(crate) fn inline_selections(&self, range: &std::ops::Range<usize>) -> Vec<InlineSel> {
        let mut out = Vec::new();
        if range.start >= range.end {
            return out;
        }
        let mut at = 0;
        for (idx, block) in self.blocks.iter().enumerate() {
            let len = block.char_len();
            match block {
                Block::Paragraph { spans, .. }
                | Block::Heading { spans, .. }
                | Block::Blockquote { spans } => {
                    push_overlap(&mut out, idx, None, at, spans_char_len(spans), range);
                }
                Block::BulletList { items } | Block::OrderedList { items } => {
                    let mut item_at = at;
                    for (j, item) in items.iter().enumerate() {
                        let ilen = spans_char_len(item);
                        push_overlap(&mut out, idx, Some(j), item_at, ilen, range);
                        item_at += ilen + 1;
                    }
                }
                Block::CodeBlock { .. } | Block::Image { .. } => {}
            }
            at += len + 1;
        }
        out
    }

    /// Mutable access to the spans of an inline region.
    pub(crate) fn region_spans_mut(
        &mut self,
        block: usize,
        item: Option<usize>,
    ) -> Option<&mut Vec<Span>> {
        match (&mut self.blocks[block], item) {
            (Block::Paragraph { spans, .. }, None)
            | (Block::Heading { spans, .. }, None)
            | (Block::Blockquote { spans }, None) => Some(spans),
            (Block::BulletList { items }, Some(j)) | (Block::OrderedList { items }, Some(j)) => {
                items.get_mut(j)
            }
            _ => None,
        }
    }

    pub(crate) fn region_spans(&self, block: usize, item: Option<usize>) -> Option<&Vec<Span>> {
        match (&self.blocks[block], item) {
            (Block::Paragraph { spans, .. }, None)
            | (Block::Heading { spans, .. }, None)
            | (Block::Blockquote { spans }, None) => Some(spans),
            (Block::BulletList { items }, Some(j)) | (Block::OrderedList { items }, Some(j)) => {
                items.get(j)
            }
            _ => None,
        }
    }

    /// Restore the document invariants after a mutation.
    pub(crate) fn normalize(&mut self) {
        for block in &mut self.blocks {
            block.normalize();
        }
        self.blocks.retain(|b| match b {
            Block::BulletList { items } | Block::OrderedList { items } => !items.is_empty(),
            _ => true,
        });
        if self.blocks.is_empty() {
            self.blocks.push(Block::empty_paragraph());
        }
        let selection = self.selection.clone();
        self.set_selection(selection);
    }
}

fn push_overlap(
    out: &mut Vec<InlineSel>,
    block: usize,
    item: Option<usize>,
    region_at: usize,
    region_len: usize,
    range: &std::ops::Range<usize>,
) {
    let start = range.start.max(region_at);
    let end = range.end.min(region_at + region_len);
    if start < end {
        out.push(InlineSel {
            block,
            item,
            start: start - region_at,
            end: end - region_at,
        });
    }
}

// ---- span utilities shared by the command layer and the parser ----

pub(crate) fn spans_char_len(spans: &[Span]) -> usize {
    spans.iter().map(Span::char_len).sum()
}

pub(crate) fn spans_text(spans: &[Span]) -> String {
    spans.iter().map(|s| s.text.as_str()).collect()
}

/// Byte index of the `char_off`-th char in `s` (clamped to the end).
pub(crate) fn byte_of_char(s: &str, char_off: usize) -> usize {
    s.char_indices()
        .nth(char_off)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Merge adjacent spans with identical marks and drop empty spans.
pub(crate) fn merge_spans(spans: &mut Vec<Span>) {
    let old = std::mem::take(spans);
    for span in old {
        if span.text.is_empty() {
            continue;
        }
        if let Some(last) = spans.last_mut()
            && last.marks == span.marks
        {
            last.text.push_str(&span.text);
        } else {
            spans.push(span);
        }
    }
}

/// Rewrite the marks of every char in `range` (local char offsets) via `f`,
/// splitting spans at the range boundaries as needed.
pub(crate) fn map_marks_in_spans(
    spans: &mut Vec<Span>,
    range: std::ops::Range<usize>,
    f: &dyn Fn(&mut MarkSet),
) {
    let old = std::mem::take(spans);
    let mut at = 0;
    for span in old {
        let len = span.char_len();
        let start = range.start.max(at);
        let end = range.end.min(at + len);
        if start >= end {
            spans.push(span);
        } else {
            let (lo, hi) = (start - at, end - at);
            let b_lo = byte_of_char(&span.text, lo);
            let b_hi = byte_of_char(&span.text, hi);
            if lo > 0 {
                spans.push(Span::marked(&span.text[..b_lo], span.marks.clone()));
            }
            let mut marks = span.marks.clone();
            f(&mut marks);
            spans.push(Span::marked(&span.text[b_lo..b_hi], marks));
            if hi < len {
                spans.push(Span::marked(&span.text[b_hi..], span.marks.clone()));
            }
        }
        at += len;
    }
}

/// True when every char of `range` (local char offsets) satisfies `pred`.
pub(crate) fn range_all_marked(
    spans: &[Span],
    range: std::ops::Range<usize>,
    pred: &dyn Fn(&MarkSet) -> bool,
) -> bool {
    let mut at = 0;
    for span in spans {
        let len = span.char_len();
        let start = range.start.max(at);
        let end = range.end.min(at + len);
        if start < end && !pred(&span.marks) {
            return false;
        }
        at += len;
    }
    true
}

/// Split a span sequence at a local char offset.
pub(crate) fn split_spans_at(spans: &[Span], offset: usize) -> (Vec<Span>, Vec<Span>) {
    let mut left = Vec::new();
    let mut right = Vec::new();
    let mut at = 0;
    for span in spans {
        let len = span.char_len();
        if at + len <= offset {
            left.push(span.clone());
        } else if at >= offset {
            right.push(span.clone());
        } else {
            let b = byte_of_char(&span.text, offset - at);
            left.push(Span::marked(&span.text[..b], span.marks.clone()));
            right.push(Span::marked(&span.text[b..], span.marks.clone()));
        }
        at += len;
    }
    (left, right)
}

/// Insert text at a local char offset, inheriting the marks of the span
/// the cursor sits in (the preceding span at boundaries).
pub(crate) fn insert_text_in_spans(spans: &mut Vec<Span>, offset: usize, text: &str) {
    if spans.is_empty() {
        spans.push(Span::plain(text));
        return;
    }
    let mut at = 0;
    for span in spans.iter_mut() {
        let len = span.char_len();
        // offset == 0 belongs to the first span; otherwise a boundary
        // position belongs to the span that ends there.
        if offset <= at + len && (offset > at || at == 0) {
            let b = byte_of_char(&span.text, offset - at);
            span.text.insert_str(b, text);
            return;
        }
        at += len;
    }
    // Past the end: append to the last span.
    if let Some(last) = spans.last_mut() {
        last.text.push_str(text);
    }
}

/// Remove a local char range from a span sequence.
pub(crate) fn delete_chars_in_spans(spans: Vec<Span>, range: std::ops::Range<usize>) -> Vec<Span> {
    let mut out = Vec::new();
    let mut at = 0;
    for span in spans {
        let len = span.char_len();
        let start = range.start.max(at);
        let end = range.end.min(at + len);
        if start >= end {
            out.push(span);
        } else {
            let b_lo = byte_of_char(&span.text, start - at);
            let b_hi = byte_of_char(&span.text, end - at);
            let mut kept = String::with_capacity(span.text.len());
            kept.push_str(&span.text[..b_lo]);
            kept.push_str(&span.text[b_hi..]);
            if !kept.is_empty() {
                out.push(Span::marked(kept, span.marks.clone()));
            }
        }
        at += len;
    }
    out
}
