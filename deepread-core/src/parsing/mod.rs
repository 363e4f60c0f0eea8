//! Normalization of provider payloads into stable records.
//!
//! - [`search`]: search listings (line blocks or structured JSON)
//! - [`reader`]: reader-view page text with metadata headers
//! - [`sections`]: numbered sections and bullets in model completions
//!
//! None of these parsers return errors; unexpected input degrades to
//! defaults or empty output.

pub mod reader;
pub mod search;
pub mod sections;

pub use reader::parse_reader_response;
pub use search::{SearchPayloadFormat, SearchResponseParser, parse_search_response};
pub use sections::{extract_bullets, extract_section};
