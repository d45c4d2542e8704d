use std::fmt;

use serde::{Deserialize, Serialize};

/// A font family plus a point size, written the Pango way: `"Anonymous Pro 9"`.
///
/// A size of 0 means "unset". Sizes are plain integers and may go to zero or
/// below when stepped down far enough; clamping is left to whoever renders.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontDescription {
    pub family: String,
    pub size: i32,
}

impl FontDescription {
    pub fn new(family: impl Into<String>, size: i32) -> Self {
        Self {
            family: family.into(),
            size,
        }
    }

    /// Parse a description such as `"FuraCode Nerd Font 9"`.
    ///
    /// The last whitespace-separated token is the size when it is numeric,
    /// otherwise the whole string names the family.
    pub fn parse(description: &str) -> Self {
        let trimmed = description.trim();

        if let Some((family, last)) = trimmed.rsplit_once(char::is_whitespace) {
            if let Ok(size) = last.parse::<f64>() {
                if size.is_finite() {
                    let family = family.trim_end().trim_end_matches(',').trim_end();
                    return Self::new(family, size.round() as i32);
                }
            }
        }

        Self::new(trimmed.trim_end_matches(','), 0)
    }

    /// Copy of this description at a different size.
    pub fn with_size(&self, size: i32) -> Self {
        Self::new(self.family.clone(), size)
    }

    pub fn has_size(&self) -> bool {
        self.size != 0
    }
}

impl fmt::Display for FontDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_size() {
            write!(f, "{} {}", self.family, self.size)
        } else {
            f.write_str(&self.family)
        }
    }
}
