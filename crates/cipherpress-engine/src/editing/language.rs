/// Language tags accepted on code blocks.
///
/// The set mirrors the "common" grammar pack of the syntax highlighter used
/// by the rendering layer. Tags outside this list are rejected and the code
/// block stays plain text.
const RECOGNIZED: &[&str] = &[
    "bash",
    "c",
    "cpp",
    "csharp",
    "css",
    "diff",
    "go",
    "graphql",
    "ini",
    "java",
    "javascript",
    "json",
    "kotlin",
    "less",
    "lua",
    "makefile",
    "markdown",
    "objectivec",
    "perl",
    "php",
    "python",
    "r",
    "ruby",
    "rust",
    "scss",
    "shell",
    "sql",
    "swift",
    "typescript",
    "vbnet",
    "wasm",
    "xml",
    "yaml",
];

/// A validated syntax-highlighting language tag.
///
/// Can only be constructed through [`CodeLanguage::parse`], so any value of
/// this type is guaranteed to be a recognized identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeLanguage(&'static str);

impl CodeLanguage {
    /// Validate a tag against the recognized set (case-insensitive).
    pub fn parse(tag: &str) -> Option<Self> {
        RECOGNIZED
            .iter()
            .find(|known| known.eq_ignore_ascii_case(tag))
            .map(|known| CodeLanguage(known))
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }

    /// All recognized tags, for populating pickers.
    pub fn recognized() -> &'static [&'static str] {
        RECOGNIZED
    }
}

impl std::fmt::Display for CodeLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}
