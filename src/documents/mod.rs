pub mod loader;

pub use loader::{is_supported, load_directory, SourceDocument, SourceKind};
