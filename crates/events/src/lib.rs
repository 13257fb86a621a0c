//! The error-event domain model: the wire shape clients submit, the
//! normalized record the store persists, the fingerprint that groups
//! occurrences, and the issue aggregate those groups merge into.

pub mod error_event;
pub mod fingerprint;
pub mod issue;
pub mod raw_event;

pub use error_event::ErrorEvent;
pub use fingerprint::{fingerprint, normalize_stack_trace, FingerprintInput};
pub use issue::{EventGroup, Issue};
pub use raw_event::{parse_timestamp, IngestRequest, RawEvent, MAX_BATCH_SIZE, MIN_BATCH_SIZE};
