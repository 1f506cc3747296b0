//! Search history: entries, the optimistic store and its persistence boundary.

mod entry;
pub mod remote;
mod repository;
mod store;

pub use entry::{SaveState, SearchEntry};
pub use repository::{MemorySearchRepository, PersistOutcome, SearchRepository};
pub use store::{SearchHistory, ToggleTicket};
