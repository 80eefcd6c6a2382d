/// HTTP middleware
pub mod cors;
pub mod envelope;

pub use cors::cors;
pub use envelope::{envelope_errors, panic_response};
