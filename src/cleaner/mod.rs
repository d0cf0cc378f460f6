pub mod engine;

pub use engine::{clean, dir_size, CleanMode, CleanReport, RemovedEntry};
