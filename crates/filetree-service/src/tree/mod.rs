//! Tree Integrity Engine and Path Resolver.

pub mod index;
pub mod integrity;
pub mod names;
pub mod path;

pub use index::SubtreeIndex;
pub use integrity::TreeIntegrity;
pub use names::validate_name;
pub use path::PathResolver;
