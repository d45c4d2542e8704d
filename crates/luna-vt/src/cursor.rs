use alacritty_terminal::vte::ansi;
use serde::{Deserialize, Serialize};

/// Where the cursor sits on the visible screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CursorPosition {
    pub row: u16,
    pub col: u16,
    pub visible: bool,
}

/// Shape of the terminal cursor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CursorShape {
    #[default]
    Block,
    Underline,
    Bar,
}

/// Cursor presentation: shape plus whether it blinks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CursorStyle {
    pub shape: CursorShape,
    pub blinking: bool,
}

impl CursorStyle {
    pub const fn new(shape: CursorShape, blinking: bool) -> Self {
        Self { shape, blinking }
    }
}

impl From<CursorStyle> for ansi::CursorStyle {
    fn from(style: CursorStyle) -> Self {
        let shape = match style.shape {
            CursorShape::Block => ansi::CursorShape::Block,
            CursorShape::Underline => ansi::CursorShape::Underline,
            CursorShape::Bar => ansi::CursorShape::Beam,
        };
        ansi::CursorStyle {
            shape,
            blinking: style.blinking,
        }
    }
}

impl From<ansi::CursorStyle> for CursorStyle {
    fn from(style: ansi::CursorStyle) -> Self {
        let shape = match style.shape {
            ansi::CursorShape::Underline => CursorShape::Underline,
            ansi::CursorShape::Beam => CursorShape::Bar,
            // Hollow and hidden cursors only show up transiently; report them as blocks.
            _ => CursorShape::Block,
        };
        CursorStyle {
            shape,
            blinking: style.blinking,
        }
    }
}
