pub mod input;
pub mod progress;
