/*!
 * # Editing Core Module
 *
 * The editor model behind the post composer. It follows a few principles:
 *
 * ### 1. Closed document tree
 * - The post body is a tree of typed blocks ([`Block`]) owning typed
 *   inline spans ([`Span`]) with a closed mark set ([`MarkSet`])
 * - No dynamic node registry: every shape the editor can produce is a
 *   variant of these enums, so every mutation is statically enumerable
 *
 * ### 2. Command-based editing
 * - All edits are [`Cmd`] values applied through [`Document::apply`]
 * - Commands validate before mutating; an error means the document is
 *   untouched, and missing/empty selections make the command a no-op
 * - Each apply returns a [`Patch`] with the new version and selection
 *
 * ### 3. Canonical serialization
 * - [`Document::serialize`] emits one tag pair per block with marks
 *   nested in a fixed order, so serializing is deterministic and
 *   `serialize(load(serialize(d))) == serialize(d)`
 * - [`Document::load`] is forgiving and never fails: unparseable markup
 *   degrades to a plain paragraph carrying the visible text
 *
 * ### 4. Text-space selection
 * - Selections are char ranges over the concatenated block text, with one
 *   separator position between blocks and list items; an image is a
 *   single-position atom
 *
 * ## Module Structure
 *
 * - **`document`**: the `Document`/`Block`/`Span` tree and text-space math
 * - **`commands`**: the `Cmd` enum and all mutation logic
 * - **`marks`**: mark kinds and the fixed color/highlight palettes
 * - **`language`**: the recognized code-block language registry
 * - **`patch`**: result metadata for applied commands
 */

pub mod commands;
pub mod document;
pub mod language;
pub mod marks;
pub mod patch;

pub use commands::{BlockType, Cmd, CommandError};
pub use document::{Alignment, Block, Document, HeadingLevel, Span};
pub use language::CodeLanguage;
pub use marks::{HighlightColor, MarkKind, MarkSet, TextColor};
pub use patch::Patch;
