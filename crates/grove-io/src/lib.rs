//! CSV loading for labeled numeric datasets.

mod error;
mod reader;

pub use error::IoError;
pub use reader::DatasetReader;
