//! PostgreSQL implementation of the source store.

mod client;

pub use client::{select_all_query, PostgresSource};
