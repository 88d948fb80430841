//! Tabular project management: a field schema, a catalog-driven rule set,
//! and a CSV dataset per project, kept consistent by structural validation,
//! load-time snapshots, and an upload pipeline with compensating rollback.

pub mod errors;
pub mod model;
pub mod notify;
pub mod pipeline;
pub mod remote;
pub mod rules;
pub mod services;
pub mod session;

pub use session::EditorSession;
