// GitHub API module.
// Provides the client, types, and the paginated organization listing.

pub mod client;
pub mod endpoints;
pub mod listing;
pub mod types;

pub use listing::{ListingFetcher, ListingSource};
pub use types::RepositoryRecord;
