//! Record Store
//!
//! The canonical state of every entity lives in a [`Collection`]: a named,
//! thread-safe record map providing atomic conditional read-modify-write.
//! Its external stand-in (document database, relational table, KV store) is
//! a collaborator; everything the four state machines need from it is:
//!
//! - conditional update: check a precondition and mutate in one step
//! - admission-controlled insert: evaluate a predicate over the whole
//!   collection under the same lock that performs the insert
//! - conditional remove: keep, replace, or remove decided from current state
//!
//! No multi-collection transaction exists. Each state machine only ever
//! needs single-entity atomicity.

mod collection;

pub use collection::{Collection, Outcome, Resolution};
