//! Terminal output for setup runs.

mod output;
mod progress;

pub use output::{Output, Verbosity};
pub use progress::{format_bytes, ProgressManager};
