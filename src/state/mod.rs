//! State module for tracking run progress
//!
//! # Components
//!
//! - `WalkState`: States of the pagination walk over listing pages
//! - `RunProgress`: Counters and error list owned by the crawl executor
//! - `RunReport`: Serializable snapshot handed to the output layer

mod progress;
mod walk_state;

pub use progress::{
    Diagnosis, ErrorKind, ErrorRecord, PaginationSummary, RunProgress, RunReport,
};
pub use walk_state::WalkState;
