//! Traits defined in `filetree-core` for the collaborators the metadata
//! core calls out to.

pub mod identity;
pub mod storage;

pub use identity::{IdentityProvider, StaticIdentity};
pub use storage::BlobStore;
