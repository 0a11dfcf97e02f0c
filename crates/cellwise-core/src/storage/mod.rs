//! Import and export of sheets.

mod csv;
mod md;

pub use csv::{parse_csv, parse_csv_str, render_csv, write_csv};
pub use md::{render_markdown, write_markdown};
