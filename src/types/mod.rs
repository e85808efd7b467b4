mod models;
mod role;

pub use models::*;
pub use role::Role;

/// The two resource kinds sharing and ownership operations apply to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Document,
    Project,
}
