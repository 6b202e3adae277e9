use serde::Serialize;

use crate::shared::region::DetectionRegion;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct FaceObservation {
    pub region: DetectionRegion,
}

/// Full-body candidate. Confidence blends area ratio and solidity.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct HumanObservation {
    pub region: DetectionRegion,
    pub circularity: f64,
    pub solidity: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FacialExpression {
    Smile,
    Sad,
    Surprised,
    Neutral,
}

impl FacialExpression {
    pub fn label(&self) -> &'static str {
        match self {
            FacialExpression::Smile => "smile",
            FacialExpression::Sad => "sad",
            FacialExpression::Surprised => "surprised",
            FacialExpression::Neutral => "neutral",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ExpressionObservation {
    pub region: DetectionRegion,
    pub expression: FacialExpression,
}
