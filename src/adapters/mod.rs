pub mod fs;
pub mod json_model;
pub mod test_detector;
