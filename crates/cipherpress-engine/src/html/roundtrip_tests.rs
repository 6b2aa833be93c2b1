//! Round-trip tests for the serialization boundary.
//!
//! Two laws hold for every document reachable through the command layer:
//! loading a serialized document reproduces the same block structure, and
//! re-serializing the loaded document reproduces the exact string.

use crate::editing::document::{Alignment, Block, Document, HeadingLevel, Span};
use crate::editing::language::CodeLanguage;
use crate::editing::marks::{HighlightColor, MarkSet, TextColor};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn assert_roundtrip(doc: &Document) {
    let serialized = doc.serialize();
    let loaded = Document::load(&serialized);
    assert_eq!(
        loaded.blocks(),
        doc.blocks(),
        "load(serialize(d)) must reproduce the block structure"
    );
    assert_eq!(
        loaded.serialize(),
        serialized,
        "serialize(load(s)) must be idempotent"
    );
}

#[test]
fn roundtrip_empty_document() {
    assert_roundtrip(&Document::new());
}

#[test]
fn roundtrip_headings_all_levels() {
    for level in [HeadingLevel::H1, HeadingLevel::H2, HeadingLevel::H3] {
        assert_roundtrip(&Document::from_blocks(vec![Block::Heading {
            level,
            spans: vec![Span::plain("Security Basics")],
            align: Alignment::Left,
        }]));
    }
}

#[test]
fn roundtrip_every_boolean_mark() {
    let mut marks = MarkSet::plain();
    marks.bold = true;
    marks.italic = true;
    marks.underline = true;
    marks.strike = true;
    marks.code = true;
    assert_roundtrip(&Document::from_blocks(vec![Block::paragraph(vec![
        Span::plain("before "),
        Span::marked("everything", marks),
        Span::plain(" after"),
    ])]));
}

#[rstest]
#[case(TextColor::Red)]
#[case(TextColor::Purple)]
#[case(TextColor::Pink)]
fn roundtrip_text_colors(#[case] color: TextColor) {
    let mut marks = MarkSet::plain();
    marks.color = Some(color);
    assert_roundtrip(&Document::from_blocks(vec![Block::paragraph(vec![
        Span::marked("colored", marks),
    ])]));
}

#[rstest]
#[case(HighlightColor::Amber)]
#[case(HighlightColor::Blue)]
fn roundtrip_highlights(#[case] color: HighlightColor) {
    let mut marks = MarkSet::plain();
    marks.highlight = Some(color);
    assert_roundtrip(&Document::from_blocks(vec![Block::paragraph(vec![
        Span::marked("highlit", marks),
    ])]));
}

#[test]
fn roundtrip_link_with_color_and_bold() {
    let mut marks = MarkSet::plain();
    marks.link = Some("https://example.com/advisory?id=1&v=2".to_string());
    marks.color = Some(TextColor::Blue);
    marks.bold = true;
    assert_roundtrip(&Document::from_blocks(vec![Block::paragraph(vec![
        Span::marked("advisory", marks),
    ])]));
}

#[test]
fn roundtrip_lists() {
    assert_roundtrip(&Document::from_blocks(vec![
        Block::BulletList {
            items: vec![
                vec![Span::plain("first")],
                vec![Span::plain("second")],
            ],
        },
        Block::OrderedList {
            items: vec![
                vec![Span::plain("prepare")],
                vec![Span::plain("detect")],
                vec![Span::plain("contain")],
            ],
        },
    ]));
}

#[test]
fn roundtrip_code_blocks() {
    assert_roundtrip(&Document::from_blocks(vec![
        Block::CodeBlock {
            language: CodeLanguage::parse("rust"),
            code: "fn main() {\n    println!(\"<&>\");\n}".to_string(),
        },
        Block::CodeBlock {
            language: None,
            code: "plain text".to_string(),
        },
    ]));
}

#[test]
fn roundtrip_blockquote_and_image() {
    assert_roundtrip(&Document::from_blocks(vec![
        Block::Blockquote {
            spans: vec![Span::plain("Never trust, always verify.")],
        },
        Block::Image {
            src: "https://example.com/diagram.png".to_string(),
        },
    ]));
}

#[test]
fn roundtrip_alignment() {
    assert_roundtrip(&Document::from_blocks(vec![
        Block::Paragraph {
            spans: vec![Span::plain("centered")],
            align: Alignment::Center,
        },
        Block::Heading {
            level: HeadingLevel::H1,
            spans: vec![Span::plain("right")],
            align: Alignment::Right,
        },
    ]));
}

#[test]
fn roundtrip_text_needing_escapes() {
    assert_roundtrip(&Document::from_blocks(vec![Block::paragraph(vec![
        Span::plain("if a < b && b > c { \"quote\" & 'tick' }"),
    ])]));
}

#[test]
fn roundtrip_unicode_text() {
    assert_roundtrip(&Document::from_blocks(vec![Block::paragraph(vec![
        Span::plain("Verschlüsselung 世界 🔐"),
    ])]));
}

#[test]
fn roundtrip_document_produced_by_commands() {
    use crate::editing::commands::{BlockType, Cmd};
    use crate::editing::marks::MarkKind;

    let mut doc = Document::new();
    doc.apply(Cmd::InsertText {
        text: "Threat model".to_string(),
    })
    .unwrap();
    doc.set_selection(0..6);
    doc.apply(Cmd::ToggleMark(MarkKind::Bold)).unwrap();
    doc.set_selection(0..0);
    doc.apply(Cmd::SetBlockType(BlockType::Heading(HeadingLevel::H2)))
        .unwrap();

    assert_roundtrip(&doc);
}

#[test]
fn mixed_document_serializes_stably_over_repeated_cycles() {
    let mut marks = MarkSet::plain();
    marks.bold = true;
    marks.highlight = Some(HighlightColor::Green);
    let doc = Document::from_blocks(vec![
        Block::Heading {
            level: HeadingLevel::H2,
            spans: vec![Span::plain("Incident Response Plan")],
            align: Alignment::Left,
        },
        Block::paragraph(vec![
            Span::plain("Having a plan is "),
            Span::marked("crucial", marks),
            Span::plain("."),
        ]),
        Block::BulletList {
            items: vec![
                vec![Span::plain("Preparation")],
                vec![Span::plain("Detection and analysis")],
            ],
        },
    ]);

    let once = doc.serialize();
    let twice = Document::load(&once).serialize();
    let thrice = Document::load(&twice).serialize();
    assert_eq!(once, twice);
    assert_eq!(twice, thrice);
}
