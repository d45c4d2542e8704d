use std::str::FromStr;

/// Which way to move through the font list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "forward" => Ok(Direction::Forward),
            "backward" => Ok(Direction::Backward),
            other => Err(format!(
                "unknown direction `{other}`, expected `forward` or `backward`"
            )),
        }
    }
}

/// The fixed, ordered list of fonts a session can cycle through.
///
/// Holds no per-session state: each session keeps its own index and asks the
/// selector where a step takes it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FontSelector {
    fonts: Vec<String>,
}

impl FontSelector {
    /// Returns `None` for an empty list, which has nothing to cycle through.
    pub fn new(fonts: Vec<String>) -> Option<Self> {
        if fonts.is_empty() {
            None
        } else {
            Some(Self { fonts })
        }
    }

    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    pub fn fonts(&self) -> &[String] {
        &self.fonts
    }

    /// The identifier at `index`, wrapping around the list.
    pub fn get(&self, index: usize) -> &str {
        &self.fonts[index % self.fonts.len()]
    }

    /// Index reached by taking one step from `index`.
    ///
    /// Wraps in both directions: stepping back from 0 lands on the last entry,
    /// stepping forward from the last entry lands on 0.
    pub fn step(&self, index: usize, direction: Direction) -> usize {
        let len = self.fonts.len();
        let index = index % len;
        match direction {
            Direction::Forward => (index + 1) % len,
            Direction::Backward => (index + len - 1) % len,
        }
    }
}
