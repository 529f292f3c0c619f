pub mod coordinator;
pub mod listing;

pub use coordinator::{CoordinatorError, EnrichmentCoordinator};
pub use listing::{ListingError, ListingService};
