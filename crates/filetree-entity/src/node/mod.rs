//! File and folder node entities.

pub mod breadcrumb;
pub mod category;
pub mod kind;
pub mod model;
pub mod trash;

pub use breadcrumb::Breadcrumb;
pub use category::FileCategory;
pub use kind::NodeKind;
pub use model::{CreateNode, FileAttributes, Node, NodeUpdate};
pub use trash::TrashState;
