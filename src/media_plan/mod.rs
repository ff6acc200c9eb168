//! Media plan rows and the staging pipeline applied to them:
//! validation, classification, linking, re-keying and export.

pub mod classify;
pub mod export;
pub mod ingest;
pub mod link;
pub mod normalize;
pub mod rekey;
pub mod review;
pub mod row;
pub mod schema;

pub use classify::{classify, ClassifiedRows};
pub use export::materialize;
pub use ingest::{parse_upload, UploadedTable};
pub use link::link_children;
pub use rekey::{reassign_identifiers, IdentifierMap, TransformMode};
pub use review::ReviewSet;
pub use row::{EntityType, Row};
pub use schema::SchemaVersion;
