//! Infrastructure layer - external adapters (filesystem, parsing).
//!
//! This layer handles all I/O operations and external dependencies.

pub mod config;
pub mod file_sink;
pub mod markdown;
pub mod snapshot;

pub use config::{ensure_config_exists, load_config, load_config_from_file, save_config};
pub use file_sink::{DirectorySink, FileSink, MemorySink};
pub use markdown::DomMarkdownConverter;
pub use snapshot::{load_snapshot, parse_snapshot};
