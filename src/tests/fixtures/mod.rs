pub mod provider;
pub mod records;
pub mod snapshots;
pub mod state;
