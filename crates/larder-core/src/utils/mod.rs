//! Utility functions for date and age formatting.

pub mod format;

pub use format::{age_display, format_day_month_year, parse_day_month_year, truncate_string};
