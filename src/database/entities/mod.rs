pub mod staged_entries;

pub use staged_entries::Entity as StagedEntries;
