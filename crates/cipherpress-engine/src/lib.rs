pub mod editing;
pub mod html;
pub mod media;
pub mod templates;

// Re-export key types for easier usage
pub use editing::{
    Alignment, Block, BlockType, Cmd, CodeLanguage, CommandError, Document, HeadingLevel,
    HighlightColor, MarkKind, MarkSet, Patch, Span, TextColor,
};
pub use media::{MediaError, validate_image_source};
pub use templates::{Draft, TEMPLATES, Template};
