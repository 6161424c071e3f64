//! Series colours

/// Colours handed out to series in merge order
pub const DEFAULT_PALETTE: [&str; 7] = [
    "rgba(239, 71, 111)",
    "rgba(255, 209, 102)",
    "rgba(6, 214, 160)",
    "rgba(17, 138, 178)",
    "rgba(7, 59, 76)",
    "rgb(103, 148, 54)",
    "rgb(165, 190, 0)",
];

/// Fixed, non-empty, ordered list of colours assigned cyclically
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colours: Vec<String>,
}

impl Palette {
    /// Returns `None` for an empty list
    pub fn new(colours: Vec<String>) -> Option<Self> {
        if colours.is_empty() {
            None
        } else {
            Some(Self { colours })
        }
    }

    pub fn colour_for(&self, index: usize) -> &str {
        &self.colours[index % self.colours.len()]
    }

    pub fn colours(&self) -> &[String] {
        &self.colours
    }

    pub fn len(&self) -> usize {
        self.colours.len()
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colours: DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect(),
        }
    }
}
