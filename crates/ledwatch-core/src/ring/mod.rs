//! Fixed-capacity rolling windows

pub mod history;

pub use history::DetectionHistory;
