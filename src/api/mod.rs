mod deadline;
mod error;
mod handler;
mod router;

pub use deadline::Deadline;
pub use error::{ApiError, ApiErrorCode, recover_error};
pub use router::{app, routes};
