mod bridge;
mod client;
mod error;
pub mod fake;
pub mod frame;
mod native;

pub use bridge::Bridge;
pub use client::{BridgeClient, default_library_search_name};
pub use error::{BridgeError, WriteError};
pub use frame::{InboundFrame, STREAM_INBOUND, STREAM_OUTBOUND, SeriesId};
