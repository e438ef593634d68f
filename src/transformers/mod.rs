//! Wire-format transformers

pub mod append_log;
pub mod cloud_function;
pub mod json;
#[cfg(feature = "console")]
pub mod pretty;

pub use append_log::AppendLogTransformer;
pub use cloud_function::{CloudFunctionTransformer, ERROR_EVENT_TYPE};
pub use json::JsonTransformer;
#[cfg(feature = "console")]
pub use pretty::PrettyTransformer;
