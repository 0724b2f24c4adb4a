pub mod logging;
pub mod text;

pub use text::{collapse_whitespace, is_meaningful_result, normalize_label, truncate_text};
