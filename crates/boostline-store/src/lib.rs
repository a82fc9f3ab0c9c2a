//! Record store access: the [`RecordStore`] port with its Airtable and
//! in-memory implementations, plus the identity resolver and record writer
//! built on top of it.

pub mod airtable;
pub mod error;
pub mod memory;
pub mod resolver;
pub mod schema;
pub mod store;
pub mod writer;

pub use airtable::AirtableStore;
pub use error::{ResolveError, StoreError};
pub use memory::{MemoryStore, Operation};
pub use resolver::IdentityResolver;
pub use store::{FieldMatch, Fields, Query, RecordStore, Row};
pub use writer::{RecordWriter, SubmissionRow, TrackedLink};
