//! Gistify core library — snippet records, the metadata mapping, and its
//! on-disk store.
//!
//! - [`types`] — newtypes and the [`SnippetRecord`] domain struct
//! - [`error`] — [`StoreError`]
//! - [`store`] — load / save of the `.gistify` state file

pub mod error;
pub mod store;
pub mod types;

pub use error::StoreError;
pub use types::{Mapping, SnippetId, SnippetRecord};
