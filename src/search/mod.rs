pub mod cache;
pub mod vector;

pub use cache::{compute_signature, decide, open_or_rebuild, CacheDecision, CacheFiles, DirectorySignature};
pub use vector::{DocumentStore, StoreSnapshot};
