//! Utility functions for formatting and item-list parsing.

pub mod format;
pub mod items;

// Re-export commonly used functions at module level
pub use format::{display_width, format_date, pad_to_width, truncate_string};
pub use items::{items_within, parse_item_ranges};
