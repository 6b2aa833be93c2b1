/// Result of applying a command to a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    /// Whether the command mutated the document (no-ops report `false`).
    pub changed: bool,
    /// Selection after the command, in text-space chars.
    pub new_selection: std::ops::Range<usize>,
    /// Document version after the command.
    pub version: u64,
}
