//! # Form Module — Snapshot, Mutations & Validation
//!
//! The form is the single source of truth for what the user is trying
//! to send. It is an explicit value (`FormSnapshot`) owned by the
//! session and mutated only through named operations — no hidden
//! reactive store, no two call sites poking the same output.
//!
//! ```text
//! output.rs    — one payment line (payment or opreturn)
//! snapshot.rs  — the snapshot + its mutation operations
//! errors.rs    — the dynamic field-error tree + compose-error search
//! validate.rs  — local field validation & compose eligibility
//! ```

pub mod errors;
pub mod output;
pub mod snapshot;
pub mod validate;

pub use errors::{find_compose_errors, ErrorKind, FormErrors};
pub use output::{Output, OutputKind};
pub use snapshot::FormSnapshot;
pub use validate::{find_valid_outputs, validate};
