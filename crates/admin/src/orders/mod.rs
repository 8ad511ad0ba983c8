//! Order controllers.
//!
//! - [`ListingController`] - paginated, filtered and debounced order listing
//! - [`StatusController`] - guarded status transitions

pub mod listing;
pub mod query;
pub mod status;

pub use listing::{LOAD_FAILED_MESSAGE, ListingController, ListingState};
pub use query::{DEFAULT_PAGE_SIZE, ListingQuery};
pub use status::{StatusController, UPDATE_FAILED_MESSAGE};
