//! File I/O for the chronalign pipeline: CSV readers for series and training
//! examples, and JSON output for alignments.

mod error;
mod reader;
mod writer;

pub use error::IoError;
pub use reader::{ExampleReader, ExampleSet, SeriesReader};
pub use writer::{alignment_json, write_alignment};
