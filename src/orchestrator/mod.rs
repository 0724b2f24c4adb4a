pub mod batch_processor;
pub mod single_search;

pub use batch_processor::{BatchRun, BatchScheduler};
pub use single_search::search_once;
