// Study core: progress state, quiz grading, curriculum and storage.
// The terminal front end (app, event, ui) lives in the binary and only
// calls into these modules.

pub mod config;
pub mod curriculum;
pub mod engine;
pub mod error;
pub mod session;
pub mod store;
