//! Classical computer-vision pipeline for hand, face and human detection.
//!
//! Each camera frame runs through skin segmentation, contour analysis,
//! convexity-defect finger counting, a left/right hand heuristic chain,
//! edge-based silhouette detection and a timed drag state machine. The
//! crate performs no I/O beyond optional model/config loading and never
//! fails a frame: every recoverable problem degrades to "nothing detected".

pub mod detection;
pub mod hands;
pub mod interaction;
pub mod pipeline;
pub mod segmentation;
pub mod shared;

#[cfg(test)]
pub(crate) mod test_support;
