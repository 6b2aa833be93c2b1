use thiserror::Error;

use crate::editing::document::{
    Alignment, Block, Document, HeadingLevel, Location, Span, delete_chars_in_spans,
    insert_text_in_spans, map_marks_in_spans, range_all_marked, spans_char_len, split_spans_at,
};
use crate::editing::language::CodeLanguage;
use crate::editing::marks::{HighlightColor, MarkKind, MarkSet, TextColor};
use crate::media::{self, MediaError};

/// Target shapes for [`Cmd::SetBlockType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    Paragraph,
    Heading(HeadingLevel),
    Blockquote,
    BulletList,
    OrderedList,
    CodeBlock,
}

/// Commands that can be applied to the document.
///
/// Every command validates its arguments before mutating anything, so a
/// command that returns an error leaves the document untouched. Commands
/// that need a selection are no-ops when the selection is empty.
#[derive(Debug, Clone, PartialEq)]
pub enum Cmd {
    /// Type text at the cursor (replacing the selection if non-empty).
    InsertText { text: String },
    /// Split the current block (or list item) at the cursor.
    InsertParagraph,
    /// Remove a text-space range, merging the boundary blocks.
    DeleteRange { range: std::ops::Range<usize> },
    /// Toggle a boolean mark over the selection.
    ToggleMark(MarkKind),
    /// Set the block type of the block(s) spanning the selection.
    SetBlockType(BlockType),
    /// Set or clear the language tag of the code block at the cursor.
    SetCodeLanguage(Option<String>),
    /// Link the selection, or insert a new linked span with display text.
    InsertLink {
        href: String,
        text: Option<String>,
    },
    /// Strip the link mark from the selection.
    RemoveLink,
    /// Insert an image block at the cursor.
    InsertImage { src: String },
    /// Set the palette text color over the selection.
    SetTextColor(TextColor),
    /// Toggle a palette highlight color over the selection.
    ToggleHighlight(HighlightColor),
    /// Align the paragraphs/headings spanning the selection.
    SetAlignment(Alignment),
}

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("link target must not be empty")]
    EmptyHref,
    #[error("link target is not a plausible URL: {0:?}")]
    InvalidHref(String),
    #[error("unrecognized code language tag: {0:?}")]
    UnknownLanguage(String),
    #[error("image source rejected: {0}")]
    InvalidImage(#[from] MediaError),
}

/// Apply `cmd` to `doc`, returning whether anything was mutated.
///
/// Called from [`Document::apply`], which renormalizes and bumps the
/// version afterwards.
pub(crate) fn apply_command(doc: &mut Document, cmd: &Cmd) -> Result<bool, CommandError> {
    match cmd {
        Cmd::InsertText { text } => insert_text(doc, text),
        Cmd::InsertParagraph => insert_paragraph(doc),
        Cmd::DeleteRange { range } => {
            let len = doc.char_len();
            let start = range.start.min(len);
            let end = range.end.min(len).max(start);
            if start == end {
                return Ok(false);
            }
            delete_range(doc, start..end);
            Ok(true)
        }
        Cmd::ToggleMark(kind) => {
            let kind = *kind;
            map_selection_marks(doc, |all| {
                move |m: &mut MarkSet| m.set(kind, !all)
            }, move |m| m.has(kind))
        }
        Cmd::SetTextColor(color) => {
            let color = *color;
            map_selection_marks(
                doc,
                |_all| move |m: &mut MarkSet| m.color = Some(color),
                move |m| m.color == Some(color),
            )
        }
        Cmd::ToggleHighlight(color) => {
            let color = *color;
            map_selection_marks(
                doc,
                |all| {
                    move |m: &mut MarkSet| {
                        m.highlight = if all { None } else { Some(color) };
                    }
                },
                move |m| m.highlight == Some(color),
            )
        }
        Cmd::RemoveLink => map_selection_marks(
            doc,
            |_all| |m: &mut MarkSet| m.link = None,
            |m| m.link.is_none(),
        ),
        Cmd::InsertLink { href, text } => insert_link(doc, href, text.as_deref()),
        Cmd::InsertImage { src } => insert_image(doc, src),
        Cmd::SetBlockType(target) => set_block_type(doc, *target),
        Cmd::SetCodeLanguage(tag) => set_code_language(doc, tag.as_deref()),
        Cmd::SetAlignment(align) => set_alignment(doc, *align),
    }
}

/// Shared machinery for the mark commands: compute whether the whole
/// selection already satisfies `pred`, then rewrite marks with the closure
/// produced by `make` for that answer.
fn map_selection_marks<F, G>(
    doc: &mut Document,
    make: impl Fn(bool) -> F,
    pred: G,
) -> Result<bool, CommandError>
where
    F: Fn(&mut MarkSet),
    G: Fn(&MarkSet) -> bool,
{
    let selection = doc.selection();
    let sels = doc.inline_selections(&selection);
    if sels.is_empty() {
        return Ok(false);
    }
    let all = sels.iter().all(|s| {
        doc.region_spans(s.block, s.item)
            .is_none_or(|spans| range_all_marked(spans, s.start..s.end, &|m| pred(m)))
    });
    let f = make(all);
    for s in &sels {
        if let Some(spans) = doc.region_spans_mut(s.block, s.item) {
            map_marks_in_spans(spans, s.start..s.end, &f);
        }
    }
    Ok(true)
}

fn insert_text(doc: &mut Document, text: &str) -> Result<bool, CommandError> {
    if text.is_empty() {
        return Ok(false);
    }
    let selection = doc.selection();
    if selection.start < selection.end {
        delete_range(doc, selection);
    }
    let pos = doc.selection().start;
    let inserted = text.chars().count();
    match doc.locate(pos) {
        Location::Inline { block, item, offset } => {
            if let Some(spans) = doc.region_spans_mut(block, item) {
                insert_text_in_spans(spans, offset, text);
            }
            doc.selection = pos + inserted..pos + inserted;
        }
        Location::Code { block, offset } => {
            if let Block::CodeBlock { code, .. } = &mut doc.blocks[block] {
                let b = crate::editing::document::byte_of_char(code, offset);
                code.insert_str(b, text);
            }
            doc.selection = pos + inserted..pos + inserted;
        }
        Location::Image { block, offset } => {
            let idx = block + offset;
            doc.blocks.insert(idx, Block::paragraph(vec![Span::plain(text)]));
            let cursor = doc.block_start(idx) + inserted;
            doc.selection = cursor..cursor;
        }
    }
    Ok(true)
}

fn insert_paragraph(doc: &mut Document) -> Result<bool, CommandError> {
    let selection = doc.selection();
    if selection.start < selection.end {
        delete_range(doc, selection);
    }
    let pos = doc.selection().start;
    match doc.locate(pos) {
        Location::Inline {
            block,
            item: None,
            offset,
        } => {
            // The tail of a split paragraph keeps its alignment; a split
            // heading continues as a plain paragraph; a split quote stays
            // a quote.
            let quote_tail = match &doc.blocks[block] {
                Block::Paragraph { .. } | Block::Heading { .. } => false,
                Block::Blockquote { .. } => true,
                _ => return Ok(false),
            };
            let tail_align = match &doc.blocks[block] {
                Block::Paragraph { align, .. } => *align,
                _ => Alignment::Left,
            };
            let spans = match doc.region_spans_mut(block, None) {
                Some(spans) => spans,
                None => return Ok(false),
            };
            let (left, right) = split_spans_at(spans, offset);
            *spans = left;
            let new_block = if quote_tail {
                Block::Blockquote { spans: right }
            } else {
                Block::Paragraph {
                    spans: right,
                    align: tail_align,
                }
            };
            doc.blocks.insert(block + 1, new_block);
            doc.selection = pos + 1..pos + 1;
        }
        Location::Inline {
            block,
            item: Some(j),
            offset,
        } => {
            if let Some(spans) = doc.region_spans_mut(block, Some(j)) {
                let (left, right) = split_spans_at(spans, offset);
                *spans = left;
                match &mut doc.blocks[block] {
                    Block::BulletList { items } | Block::OrderedList { items } => {
                        items.insert(j + 1, right);
                    }
                    _ => {}
                }
                doc.selection = pos + 1..pos + 1;
            }
        }
        Location::Code { block, offset } => {
            if let Block::CodeBlock { code, .. } = &mut doc.blocks[block] {
                let b = crate::editing::document::byte_of_char(code, offset);
                code.insert(b, '\n');
                doc.selection = pos + 1..pos + 1;
            }
        }
        Location::Image { block, offset } => {
            let idx = block + offset;
            doc.blocks.insert(idx, Block::empty_paragraph());
            let cursor = doc.block_start(idx);
            doc.selection = cursor..cursor;
        }
    }
    Ok(true)
}

fn insert_link(
    doc: &mut Document,
    href: &str,
    display: Option<&str>,
) -> Result<bool, CommandError> {
    let href = href.trim();
    if href.is_empty() {
        return Err(CommandError::EmptyHref);
    }
    if href.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(CommandError::InvalidHref(href.to_string()));
    }

    let display = display.filter(|t| !t.is_empty());
    match display {
        Some(text) => {
            let pos = doc.selection().start;
            let mut marks = MarkSet::plain();
            marks.link = Some(href.to_string());
            let linked = Span::marked(text, marks);
            let inserted = text.chars().count();
            match doc.locate(pos) {
                Location::Inline { block, item, offset } => {
                    if let Some(spans) = doc.region_spans_mut(block, item) {
                        let (mut left, right) = split_spans_at(spans, offset);
                        left.push(linked);
                        left.extend(right);
                        *spans = left;
                        doc.selection = pos + inserted..pos + inserted;
                        Ok(true)
                    } else {
                        Ok(false)
                    }
                }
                Location::Image { block, offset } => {
                    let idx = block + offset;
                    doc.blocks.insert(idx, Block::paragraph(vec![linked]));
                    let cursor = doc.block_start(idx) + inserted;
                    doc.selection = cursor..cursor;
                    Ok(true)
                }
                // Links cannot live inside code blocks.
                Location::Code { .. } => Ok(false),
            }
        }
        None => {
            let href = href.to_string();
            map_selection_marks(
                doc,
                move |_all| {
                    let href = href.clone();
                    move |m: &mut MarkSet| m.link = Some(href.clone())
                },
                |_m| false,
            )
        }
    }
}

fn insert_image(doc: &mut Document, src: &str) -> Result<bool, CommandError> {
    media::validate_image_source(src)?;
    let pos = doc.selection().start;
    let idx = split_for_block_insert(doc, pos);
    doc.blocks.insert(
        idx,
        Block::Image {
            src: src.trim().to_string(),
        },
    );
    let cursor = doc.block_start(idx) + 1;
    doc.selection = cursor..cursor;
    Ok(true)
}

/// Prepare a block insertion point at a text-space position, splitting the
/// containing block when the position is mid-content. Returns the index at
/// which the new block should be inserted.
fn split_for_block_insert(doc: &mut Document, pos: usize) -> usize {
    match doc.locate(pos) {
        Location::Inline {
            block,
            item: None,
            offset,
        } => {
            let len = doc.blocks[block].char_len();
            if offset == 0 {
                block
            } else if offset >= len {
                block + 1
            } else {
                let tail = match doc.region_spans_mut(block, None) {
                    Some(spans) => {
                        let (left, right) = split_spans_at(spans, offset);
                        *spans = left;
                        right
                    }
                    None => return block + 1,
                };
                let new_block = match &doc.blocks[block] {
                    Block::Heading { level, align, .. } => Block::Heading {
                        level: *level,
                        spans: tail,
                        align: *align,
                    },
                    Block::Blockquote { .. } => Block::Blockquote { spans: tail },
                    Block::Paragraph { align, .. } => Block::Paragraph {
                        spans: tail,
                        align: *align,
                    },
                    _ => Block::paragraph(tail),
                };
                doc.blocks.insert(block + 1, new_block);
                block + 1
            }
        }
        Location::Inline {
            block,
            item: Some(j),
            offset,
        } => {
            let (items, ordered) = match &doc.blocks[block] {
                Block::BulletList { items } => (items.clone(), false),
                Block::OrderedList { items } => (items.clone(), true),
                _ => return block + 1,
            };
            let item_len = spans_char_len(&items[j]);
            if j == 0 && offset == 0 {
                return block;
            }
            if j == items.len() - 1 && offset >= item_len {
                return block + 1;
            }
            let (l, r) = split_spans_at(&items[j], offset);
            let mut left_items = items[..j].to_vec();
            if offset > 0 {
                left_items.push(l);
            }
            let mut right_items = Vec::new();
            if offset < item_len {
                right_items.push(r);
            }
            right_items.extend(items[j + 1..].iter().cloned());
            let make = |items: Vec<Vec<Span>>| {
                if ordered {
                    Block::OrderedList { items }
                } else {
                    Block::BulletList { items }
                }
            };
            doc.blocks[block] = make(left_items);
            doc.blocks.insert(block + 1, make(right_items));
            block + 1
        }
        Location::Code { block, offset } => {
            let (language, code) = match &doc.blocks[block] {
                Block::CodeBlock { language, code } => (*language, code.clone()),
                _ => return block + 1,
            };
            let len = code.chars().count();
            if offset == 0 {
                block
            } else if offset >= len {
                block + 1
            } else {
                let b = crate::editing::document::byte_of_char(&code, offset);
                doc.blocks[block] = Block::CodeBlock {
                    language,
                    code: code[..b].to_string(),
                };
                doc.blocks.insert(
                    block + 1,
                    Block::CodeBlock {
                        language,
                        code: code[b..].to_string(),
                    },
                );
                block + 1
            }
        }
        Location::Image { block, offset } => block + offset,
    }
}

fn set_code_language(doc: &mut Document, tag: Option<&str>) -> Result<bool, CommandError> {
    let pos = doc.selection().start;
    let idx = doc.locate(pos).block();
    match &mut doc.blocks[idx] {
        Block::CodeBlock { language, .. } => {
            let new_language = match tag {
                Some(tag) => Some(
                    CodeLanguage::parse(tag)
                        .ok_or_else(|| CommandError::UnknownLanguage(tag.to_string()))?,
                ),
                None => None,
            };
            if *language == new_language {
                Ok(false)
            } else {
                *language = new_language;
                Ok(true)
            }
        }
        _ => Ok(false),
    }
}

fn set_alignment(doc: &mut Document, align: Alignment) -> Result<bool, CommandError> {
    let selection = doc.selection();
    let (first, last) = doc.covered_blocks(&selection);
    let mut changed = false;
    for block in &mut doc.blocks[first..=last] {
        match block {
            Block::Paragraph { align: a, .. } | Block::Heading { align: a, .. } => {
                if *a != align {
                    *a = align;
                    changed = true;
                }
            }
            _ => {}
        }
    }
    Ok(changed)
}

fn set_block_type(doc: &mut Document, target: BlockType) -> Result<bool, CommandError> {
    let selection = doc.selection();
    let (first, last) = doc.covered_blocks(&selection);
    let covered: Vec<Block> = doc.blocks[first..=last].to_vec();
    let replacement = convert_blocks(&covered, target);
    if replacement == covered {
        return Ok(false);
    }
    doc.blocks.splice(first..=last, replacement);
    Ok(true)
}

/// Rebuild a run of blocks as the target type. Images pass through
/// unchanged; list targets group contiguous convertible blocks into one
/// list, and the code target merges them into one code block.
fn convert_blocks(covered: &[Block], target: BlockType) -> Vec<Block> {
    match target {
        BlockType::Paragraph | BlockType::Heading(_) | BlockType::Blockquote => {
            let mut out = Vec::new();
            for block in covered {
                match block {
                    Block::Image { .. } => out.push(block.clone()),
                    Block::BulletList { items } | Block::OrderedList { items } => {
                        for item in items {
                            out.push(make_inline_block(target, item.clone(), Alignment::Left));
                        }
                    }
                    Block::CodeBlock { code, .. } => {
                        out.push(make_inline_block(
                            target,
                            vec![Span::plain(code.clone())],
                            Alignment::Left,
                        ));
                    }
                    Block::Paragraph { spans, align } | Block::Heading { spans, align, .. } => {
                        out.push(make_inline_block(target, spans.clone(), *align));
                    }
                    Block::Blockquote { spans } => {
                        out.push(make_inline_block(target, spans.clone(), Alignment::Left));
                    }
                }
            }
            out
        }
        BlockType::BulletList | BlockType::OrderedList => {
            let mut out = Vec::new();
            let mut items: Vec<Vec<Span>> = Vec::new();
            let flush = |items: &mut Vec<Vec<Span>>, out: &mut Vec<Block>| {
                if !items.is_empty() {
                    let items = std::mem::take(items);
                    out.push(if matches!(target, BlockType::OrderedList) {
                        Block::OrderedList { items }
                    } else {
                        Block::BulletList { items }
                    });
                }
            };
            for block in covered {
                match block {
                    Block::Image { .. } => {
                        flush(&mut items, &mut out);
                        out.push(block.clone());
                    }
                    Block::BulletList { items: inner } | Block::OrderedList { items: inner } => {
                        items.extend(inner.iter().cloned());
                    }
                    Block::CodeBlock { code, .. } => items.push(vec![Span::plain(code.clone())]),
                    Block::Paragraph { spans, .. }
                    | Block::Heading { spans, .. }
                    | Block::Blockquote { spans } => items.push(spans.clone()),
                }
            }
            flush(&mut items, &mut out);
            out
        }
        BlockType::CodeBlock => {
            if covered.len() == 1
                && let Block::CodeBlock { .. } = &covered[0]
            {
                // Already a code block; keep its language.
                return covered.to_vec();
            }
            let mut out = Vec::new();
            let mut lines: Vec<String> = Vec::new();
            let flush = |lines: &mut Vec<String>, out: &mut Vec<Block>| {
                if !lines.is_empty() {
                    out.push(Block::CodeBlock {
                        language: None,
                        code: std::mem::take(lines).join("\n"),
                    });
                }
            };
            for block in covered {
                match block {
                    Block::Image { .. } => {
                        flush(&mut lines, &mut out);
                        out.push(block.clone());
                    }
                    other => lines.push(other.text()),
                }
            }
            flush(&mut lines, &mut out);
            out
        }
    }
}

fn make_inline_block(target: BlockType, spans: Vec<Span>, align: Alignment) -> Block {
    match target {
        BlockType::Paragraph => Block::Paragraph { spans, align },
        BlockType::Heading(level) => Block::Heading { level, spans, align },
        BlockType::Blockquote => Block::Blockquote { spans },
        // Callers only pass inline targets here.
        _ => Block::Paragraph { spans, align },
    }
}

/// Remove a text-space range, merging blocks whose separator vanished.
pub(crate) fn delete_range(doc: &mut Document, range: std::ops::Range<usize>) {
    let blocks = std::mem::take(&mut doc.blocks);
    let mut out: Vec<Block> = Vec::new();
    let mut pending_merge = false;
    let mut at = 0;
    for block in blocks {
        let len = block.char_len();
        let (b_start, b_end) = (at, at + len);
        // The separator after this block sits at position `b_end`.
        let sep_deleted = range.start <= b_end && range.end > b_end;
        at = b_end + 1;

        let survivor = if range.end <= b_start || range.start >= b_end {
            Some(block)
        } else if range.start <= b_start && range.end >= b_end {
            None
        } else {
            let local = range.start.saturating_sub(b_start)..(range.end.min(b_end) - b_start);
            Some(delete_local(block, local))
        };

        match survivor {
            Some(block) => {
                if pending_merge
                    && let Some(prev) = out.last_mut()
                {
                    match try_merge_blocks(prev, block) {
                        None => {}
                        Some(unmerged) => out.push(unmerged),
                    }
                } else {
                    out.push(block);
                }
                pending_merge = sep_deleted;
            }
            None => {
                // A dropped block chains the merge only when its own
                // trailing separator is gone too.
                pending_merge = pending_merge && sep_deleted;
            }
        }
    }
    if out.is_empty() {
        out.push(Block::empty_paragraph());
    }
    doc.blocks = out;
    doc.selection = range.start..range.start;
}

/// Remove a char range local to one block.
fn delete_local(block: Block, range: std::ops::Range<usize>) -> Block {
    match block {
        Block::Paragraph { spans, align } => Block::Paragraph {
            spans: delete_chars_in_spans(spans, range),
            align,
        },
        Block::Heading { level, spans, align } => Block::Heading {
            level,
            spans: delete_chars_in_spans(spans, range),
            align,
        },
        Block::Blockquote { spans } => Block::Blockquote {
            spans: delete_chars_in_spans(spans, range),
        },
        Block::CodeBlock { language, code } => {
            let b_lo = crate::editing::document::byte_of_char(&code, range.start);
            let b_hi = crate::editing::document::byte_of_char(&code, range.end);
            let mut kept = String::with_capacity(code.len());
            kept.push_str(&code[..b_lo]);
            kept.push_str(&code[b_hi..]);
            Block::CodeBlock {
                language,
                code: kept,
            }
        }
        Block::BulletList { items } => Block::BulletList {
            items: delete_in_items(items, range),
        },
        Block::OrderedList { items } => Block::OrderedList {
            items: delete_in_items(items, range),
        },
        // A partial overlap with a one-char atom never happens; full covers
        // are handled by the caller.
        Block::Image { .. } => block,
    }
}

/// Remove a local char range from list items, merging items whose
/// separator was deleted.
fn delete_in_items(items: Vec<Vec<Span>>, range: std::ops::Range<usize>) -> Vec<Vec<Span>> {
    let count = items.len();
    let mut out: Vec<Vec<Span>> = Vec::new();
    let mut acc: Option<Vec<Span>> = None;
    let mut at = 0;
    for (j, item) in items.into_iter().enumerate() {
        let len = spans_char_len(&item);
        let start = range.start.max(at);
        let end = range.end.min(at + len);
        let kept = if start < end {
            delete_chars_in_spans(item, start - at..end - at)
        } else {
            item
        };
        let sep_pos = at + len;
        let sep_deleted = j + 1 < count && range.start <= sep_pos && range.end > sep_pos;
        match acc.take() {
            Some(mut merged) => {
                merged.extend(kept);
                if sep_deleted {
                    acc = Some(merged);
                } else {
                    out.push(merged);
                }
            }
            None => {
                if sep_deleted {
                    acc = Some(kept);
                } else {
                    out.push(kept);
                }
            }
        }
        at = sep_pos + 1;
    }
    if let Some(merged) = acc {
        out.push(merged);
    }
    out
}

/// Merge `next` into `prev` if the pair supports it; returns the block
/// back when the two must stay separate.
fn try_merge_blocks(prev: &mut Block, next: Block) -> Option<Block> {
    match (prev, next) {
        (
            Block::Paragraph { spans, .. }
            | Block::Heading { spans, .. }
            | Block::Blockquote { spans },
            Block::Paragraph { spans: tail, .. }
            | Block::Heading { spans: tail, .. }
            | Block::Blockquote { spans: tail },
        ) => {
            spans.extend(tail);
            None
        }
        (
            Block::BulletList { items },
            Block::Paragraph { spans: tail, .. }
            | Block::Heading { spans: tail, .. }
            | Block::Blockquote { spans: tail },
        )
        | (
            Block::OrderedList { items },
            Block::Paragraph { spans: tail, .. }
            | Block::Heading { spans: tail, .. }
            | Block::Blockquote { spans: tail },
        ) => {
            if let Some(last) = items.last_mut() {
                last.extend(tail);
            } else {
                items.push(tail);
            }
            None
        }
        (Block::BulletList { items }, Block::BulletList { items: mut tail })
        | (Block::OrderedList { items }, Block::OrderedList { items: mut tail }) => {
            // The item pair at the junction glues into one.
            if let Some(last) = items.last_mut()
                && !tail.is_empty()
            {
                last.extend(tail.remove(0));
            }
            items.extend(tail);
            None
        }
        (Block::CodeBlock { code, .. }, Block::CodeBlock { code: tail, .. }) => {
            code.push_str(&tail);
            None
        }
        (_, next) => Some(next),
    }
}
