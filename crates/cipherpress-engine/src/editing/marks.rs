/// Boolean inline marks that can be toggled on a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkKind {
    Bold,
    Italic,
    Underline,
    Strike,
    InlineCode,
}

/// Text colors offered by the editor's color picker.
///
/// The palette is closed: a span either carries one of these values or no
/// color at all. Arbitrary hex values cannot be represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextColor {
    Black,
    White,
    Red,
    Lime,
    Blue,
    Yellow,
    Magenta,
    Cyan,
    Orange,
    Purple,
    Green,
    Pink,
}

impl TextColor {
    pub const ALL: [TextColor; 12] = [
        TextColor::Black,
        TextColor::White,
        TextColor::Red,
        TextColor::Lime,
        TextColor::Blue,
        TextColor::Yellow,
        TextColor::Magenta,
        TextColor::Cyan,
        TextColor::Orange,
        TextColor::Purple,
        TextColor::Green,
        TextColor::Pink,
    ];

    /// The CSS hex value written into the serialized `style` attribute.
    pub fn as_hex(self) -> &'static str {
        match self {
            TextColor::Black => "#000000",
            TextColor::White => "#ffffff",
            TextColor::Red => "#ff0000",
            TextColor::Lime => "#00ff00",
            TextColor::Blue => "#0000ff",
            TextColor::Yellow => "#ffff00",
            TextColor::Magenta => "#ff00ff",
            TextColor::Cyan => "#00ffff",
            TextColor::Orange => "#ffa500",
            TextColor::Purple => "#800080",
            TextColor::Green => "#008000",
            TextColor::Pink => "#ffc0cb",
        }
    }

    /// Look up a palette color from its hex value (case-insensitive).
    pub fn from_hex(hex: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_hex().eq_ignore_ascii_case(hex))
    }
}

/// Highlight colors offered by the editor's highlighter picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightColor {
    Amber,
    Pink,
    Blue,
    Green,
    Red,
    Purple,
}

impl HighlightColor {
    pub const ALL: [HighlightColor; 6] = [
        HighlightColor::Amber,
        HighlightColor::Pink,
        HighlightColor::Blue,
        HighlightColor::Green,
        HighlightColor::Red,
        HighlightColor::Purple,
    ];

    pub fn as_hex(self) -> &'static str {
        match self {
            HighlightColor::Amber => "#fef3c7",
            HighlightColor::Pink => "#fce7f3",
            HighlightColor::Blue => "#dbeafe",
            HighlightColor::Green => "#d1fae5",
            HighlightColor::Red => "#fef2f2",
            HighlightColor::Purple => "#f3e8ff",
        }
    }

    pub fn from_hex(hex: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_hex().eq_ignore_ascii_case(hex))
    }
}

/// The set of marks active on a single span.
///
/// Duplicate mark kinds are unrepresentable by construction: the boolean
/// marks are flags, and the parameterized marks (color, highlight, link)
/// hold at most one value each.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MarkSet {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strike: bool,
    pub code: bool,
    pub color: Option<TextColor>,
    pub highlight: Option<HighlightColor>,
    pub link: Option<String>,
}

impl MarkSet {
    /// A mark set with nothing active.
    pub fn plain() -> Self {
        Self::default()
    }

    pub fn is_plain(&self) -> bool {
        *self == Self::default()
    }

    pub fn has(&self, kind: MarkKind) -> bool {
        match kind {
            MarkKind::Bold => self.bold,
            MarkKind::Italic => self.italic,
            MarkKind::Underline => self.underline,
            MarkKind::Strike => self.strike,
            MarkKind::InlineCode => self.code,
        }
    }

    pub fn set(&mut self, kind: MarkKind, on: bool) {
        match kind {
            MarkKind::Bold => self.bold = on,
            MarkKind::Italic => self.italic = on,
            MarkKind::Underline => self.underline = on,
            MarkKind::Strike => self.strike = on,
            MarkKind::InlineCode => self.code = on,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_color_hex_roundtrip() {
        for color in TextColor::ALL {
            assert_eq!(TextColor::from_hex(color.as_hex()), Some(color));
        }
    }

    #[test]
    fn text_color_from_hex_is_case_insensitive() {
        assert_eq!(TextColor::from_hex("#FF0000"), Some(TextColor::Red));
        assert_eq!(TextColor::from_hex("#FFC0CB"), Some(TextColor::Pink));
    }

    #[test]
    fn text_color_rejects_off_palette_values() {
        assert_eq!(TextColor::from_hex("#123456"), None);
        assert_eq!(TextColor::from_hex("red"), None);
        assert_eq!(TextColor::from_hex(""), None);
    }

    #[test]
    fn highlight_color_hex_roundtrip() {
        for color in HighlightColor::ALL {
            assert_eq!(HighlightColor::from_hex(color.as_hex()), Some(color));
        }
    }

    #[test]
    fn mark_set_flags() {
        let mut marks = MarkSet::plain();
        assert!(marks.is_plain());

        marks.set(MarkKind::Bold, true);
        marks.set(MarkKind::InlineCode, true);
        assert!(marks.has(MarkKind::Bold));
        assert!(marks.has(MarkKind::InlineCode));
        assert!(!marks.has(MarkKind::Italic));
        assert!(!marks.is_plain());

        marks.set(MarkKind::Bold, false);
        assert!(!marks.has(MarkKind::Bold));
    }

    #[test]
    fn parameterized_marks_hold_one_value() {
        let mut marks = MarkSet::plain();
        marks.color = Some(TextColor::Red);
        marks.color = Some(TextColor::Blue);
        assert_eq!(marks.color, Some(TextColor::Blue));

        marks.link = Some("https://example.com".to_string());
        marks.link = Some("https://other.example".to_string());
        assert_eq!(marks.link.as_deref(), Some("https://other.example"));
    }
}
