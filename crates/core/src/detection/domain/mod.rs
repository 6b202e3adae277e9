pub mod face_detector;
pub mod observations;
pub mod scan_params;
