#![forbid(unsafe_code)]

pub mod autosave;
pub mod document;
pub mod repository;

pub use autosave::DebouncedSaver;
pub use document::ProgressDocument;
pub use repository::{InMemoryRepository, ProgressRepository, Storage, StorageError};
