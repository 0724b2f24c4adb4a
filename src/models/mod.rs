pub mod grid;
pub mod loaders;
pub mod request;

pub use grid::{CourtOption, GridMarkup, GridRow, GridSnapshot, GridState, MatchResult};
pub use loaders::load_requests;
pub use request::{SearchOutcome, SearchRequest};
