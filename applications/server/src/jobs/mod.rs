/// Background jobs
pub mod exporter;

pub use exporter::{ActionExporter, ExportBatch};
