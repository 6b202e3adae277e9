use serde::Serialize;

/// Hand pose label derived from finger count and solidity.
///
/// Few notches or a ragged outline read as `Open`; many notches on an
/// otherwise solid outline read as `Closed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Gesture {
    Open,
    Closed,
    Partial,
}

impl Gesture {
    pub fn label(&self) -> &'static str {
        match self {
            Gesture::Open => "open",
            Gesture::Closed => "closed",
            Gesture::Partial => "partial",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GestureClassifier;

impl GestureClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, finger_count: usize, solidity: f64) -> Gesture {
        if finger_count <= 2 || solidity < 0.65 {
            Gesture::Open
        } else if finger_count >= 4 && solidity > 0.75 {
            Gesture::Closed
        } else {
            Gesture::Partial
        }
    }

    pub fn confidence(&self, finger_count: usize, solidity: f64) -> f64 {
        (finger_count as f64 * 0.2 + solidity * 0.3 + 0.3).min(1.0)
    }
}
