// Cache module for local filesystem state.
// Stores the repository listing snapshot next to the user's config.

pub mod paths;
pub mod store;

pub use paths::AppPaths;
pub use store::{RepositoryCache, write_private};
