//! Adapter between the intercepting proxy engine and the policy core

mod handler;
mod response;

pub use handler::RequestHook;
pub use response::{rejection_response, RejectionResponse};
