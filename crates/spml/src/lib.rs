//! SPML: the SignPuddle Markup Language.
//!
//! Reads and writes the legacy XML dictionary interchange format. A parsed
//! file becomes a [`LegacyDocument`] holding puddle metadata and its ordered
//! [`LegacyEntry`] records.
//!
//! ```
//! use spml::{parse_spml, serialize_spml};
//!
//! let doc = parse_spml(r#"<spml type="sgn" puddle="4"><term>ASL</term></spml>"#).unwrap();
//! assert_eq!(doc.dictionary_name(), "ASL");
//!
//! let xml = serialize_spml(&doc).unwrap();
//! assert_eq!(parse_spml(&xml).unwrap(), doc);
//! ```
pub mod error;
pub mod fsw;
pub mod model;
pub mod parser;
pub mod serializer;

pub use error::SpmlError;
pub use fsw::is_valid_fsw;
pub use model::{LegacyDocument, LegacyEntry, MetaPair, UNKNOWN_NAME};
pub use parser::parse_spml;
pub use serializer::{serialize_spml, SPML_DTD_URI};
