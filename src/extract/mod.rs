//! Extractors (C4): pure `(url, body) -> Page` functions, no I/O, no
//! globals (spec.md §4.4). Grounded on
//! `original_source/lib/extractors.py` for the HTML regex set, and on
//! spec.md §4.4 directly for the text/PDF variants it adds.

mod html;
mod patterns;
mod pdf;
mod text;

pub use html::extract_from_html;
pub use pdf::pdf_row;
pub use text::extract_from_text;
