//! Puddle Store: persistence facade for SPML documents and dictionaries.
//!
//! [`SpmlService`] keeps uploaded documents (parsed model plus original text)
//! in any [`DocumentStore`]. [`DictionaryService`] turns uploads into
//! dictionary and sign records, merging repeat uploads of the same puddle.
//!
//! ```
//! use std::sync::Arc;
//! use puddle_store::{MemoryStore, SaveOptions, SpmlService};
//!
//! let service = SpmlService::new(Arc::new(MemoryStore::new()));
//! let result = service.import_and_save(
//!     r#"<spml type="sgn" puddle="4"><term>ASL</term></spml>"#,
//!     SaveOptions::owner("alice"),
//! );
//! assert!(result.success);
//!
//! let broken = service.import_and_save("<spml><entry></spml>", SaveOptions::default());
//! assert!(broken.message.starts_with("Failed to import:"));
//! ```

pub mod dictionary;
pub mod document;
pub mod file_store;
pub mod service;
pub mod store;

pub use dictionary::{DictionaryImport, DictionaryService, MemorySignStore, SignStore};
pub use document::{DocumentFilter, ImportResult, StoreStats, StoredDocument};
pub use file_store::FileStore;
pub use service::{SaveOptions, SpmlService};
pub use store::{DocumentStore, MemoryStore};
