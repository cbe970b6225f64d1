//! Puddle Core: dictionary and sign records built from SPML documents.
//!
//! ```text
//! SPML text ─► spml::parse_spml ─► LegacyDocument ─┬─► mapper    ─► Dictionary + Signs
//!                                                  └─► reconcile ─► MergePlan (add/update)
//! ```

pub mod data_model;
pub mod error;
pub mod mapper;
pub mod reconcile;

pub use data_model::{sign_id, Dictionary, Sign};
pub use error::{PuddleError, Result};
pub use mapper::{to_dictionary, to_signs};
pub use reconcile::{merge, merge_at, MergePlan};
