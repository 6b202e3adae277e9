pub mod cascade_face_detector;
pub mod expression_analyzer;
pub mod haar_cascade;
pub mod human_region_detector;
pub(crate) mod math;
