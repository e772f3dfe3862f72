//! Public value types for the Mimir API.

mod context;
mod result;
mod subject;
mod token;
mod ttl;

pub use context::{PlaceholderContext, PlaceholderContextBuilder};
pub use result::PlaceholderResult;
pub use subject::SubjectId;
pub use token::{ParsedPlaceholder, RELATIONAL_PREFIX};
pub use ttl::CacheTtl;
