//! Access control domain
//!
//! Ownership, shares and the resolver that turns them into an
//! [`AccessLevel`] for a (graph, actor) pair.

mod level;
mod repository;
mod resolver;
mod service;
mod share;

pub use level::{AccessLevel, Action, ShareAccess};
pub use repository::ShareRepository;
pub use resolver::{AccessGrant, AccessResolver, TokenAccess};
pub use service::{CreatedShare, MAX_SHARE_DAYS, ShareRequest, ShareService};
pub use share::{Share, generate_token};
