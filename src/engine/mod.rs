pub mod grading;
pub mod progress;
