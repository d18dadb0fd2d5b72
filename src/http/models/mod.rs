pub mod data;
mod errors;

pub use errors::{DynHttpError, HttpError, HttpResult};
