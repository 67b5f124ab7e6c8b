//! Interface definitions for the external services.
//!
//! This module defines the abstract `SourceStore` and `SearchIndexProvider`
//! traits that allow for dependency injection and swappable backends.

mod search_index_provider;
mod source_store;

pub use search_index_provider::SearchIndexProvider;
pub use source_store::SourceStore;
