use std::fmt;

use serde::{Serialize, Deserialize};

/// The freshness taxonomy. Declaration order is the classifier's output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassLabel {
    Fresh,
    #[serde(rename = "Semi-Spoiled")]
    SemiSpoiled,
    Spoiled,
}

impl ClassLabel {
    pub const COUNT: usize = 3;
    pub const ALL: [ClassLabel; ClassLabel::COUNT] =
        [ClassLabel::Fresh, ClassLabel::SemiSpoiled, ClassLabel::Spoiled];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(i: usize) -> Option<ClassLabel> {
        ClassLabel::ALL.get(i).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ClassLabel::Fresh => "Fresh",
            ClassLabel::SemiSpoiled => "Semi-Spoiled",
            ClassLabel::Spoiled => "Spoiled",
        }
    }

    /// UI severity colour associated with the class.
    pub fn color(self) -> &'static str {
        match self {
            ClassLabel::Fresh => "success",
            ClassLabel::SemiSpoiled => "warning",
            ClassLabel::Spoiled => "error",
        }
    }

    /// Food-safety advice shown alongside a prediction.
    pub fn advice(self) -> &'static str {
        match self {
            ClassLabel::Fresh => {
                "This food appears fresh and safe to consume. Store properly to maintain freshness."
            }
            ClassLabel::SemiSpoiled => {
                "This food shows signs of aging. Consume soon or consider discarding if smell/texture is off."
            }
            ClassLabel::Spoiled => {
                "This food appears spoiled. For safety, it is recommended to discard it."
            }
        }
    }
}

impl fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
