pub mod reader;
pub mod types;

pub use reader::{read_dataset, read_dataset_from};
pub use types::{text_field, ColumnKind, Record};
