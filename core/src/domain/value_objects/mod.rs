//! Value objects used to address and mutate stored verification records.

pub mod composite_key;
pub mod record_update;

pub use composite_key::{partition_key, record_key, CompositeKey, KEY_SEPARATOR};
pub use record_update::{RecordUpdate, RecordValue};
