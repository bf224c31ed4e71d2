pub mod quiz;
pub mod tracker;
