//! Tracked configuration attributes of the project document.
//!
//! The caller owns only the attributes it declares:
//! - `fields`: the fixed attribute -> JSON pointer table
//! - `tracked`: declared values and the tracked-field set derived from them
//! - `builder`: patch construction for tracked fields
//! - `observe`: read-side intersection and drift detection
//! - `digest`: fingerprints of observed subsets

pub mod builder;
pub mod digest;
pub mod fields;
pub mod observe;
pub mod tracked;

pub use builder::PatchBuilder;
pub use digest::{hash_json, hash_subset};
pub use fields::{FIELDS, FieldSpec};
pub use observe::{FieldDrift, detect_drift, observe_tracked};
pub use tracked::{DeclaredConfig, TrackedFields};
