//! Default values for addon settings.
//!
//! A [`DefaultsTable`] is assembled once at start-up and never changes
//! afterwards. Every read hands out a fresh copy of the stored template, so
//! callers are free to mutate what they receive.

#![warn(missing_docs, clippy::pedantic)]

mod table;

pub use table::{DefaultsError, DefaultsResult, DefaultsTable, DefaultsTableBuilder};
