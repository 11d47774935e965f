//! Params documents: loading and structural merging
//!
//! Operators pass any number of params files with `--params`; they are folded
//! left to right into one read-only document.

pub mod loader;
pub mod merge;

pub use loader::load_params;
pub use merge::merge_deep;
