// Composition root for the utilization service.
//
// Responsibilities:
// - Read config from environment.
// - Instantiate the data provider and the snapshot cache.
// - Wire them into the fetch coordinator and the use case handlers.
// - Expose the use cases over HTTP.

pub mod config;
pub mod http;
pub mod state;
