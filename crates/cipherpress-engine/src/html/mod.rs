//! The HTML-subset serialization boundary.
//!
//! Documents persist as an HTML string restricted to the editor's tag
//! vocabulary: `h1`–`h3`, `p`, `ul`/`ol`/`li`, `blockquote`, `pre`/`code`
//! (with a `language` attribute), `img`, `a`, `strong`/`em`/`u`/`s`/`code`
//! and `span` with inline styles for color and highlight. The serialized
//! string is stored verbatim as a post's `content` field.

mod parse;
mod serialize;

pub use parse::parse;
pub use serialize::serialize;

#[cfg(test)]
mod roundtrip_tests;
