//! Data module - CSV loading, discovery and processing

pub mod columns;
pub mod discovery;
mod loader;
mod processor;

pub use loader::DataLoader;
pub use processor::{DataProcessor, PivotTable, ProcessorError};
