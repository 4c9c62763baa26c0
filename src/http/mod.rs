//! Fetch-like HTTP value types exchanged with the relay handler.

mod request;
mod response;

pub use request::{Method, RelayRequest};
pub use response::{RelayResponse, StatusCode};
