pub mod color_segmenter;
pub mod contour_extractor;
