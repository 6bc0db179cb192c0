pub mod builder;
pub mod headers;
pub mod multipart;
pub mod params;
pub mod requestbody;
pub mod response;

// Re-exports for convenience
pub use builder::{build_request, compose_url, CallConfig, Endpoint, PrepareHook};
pub use headers::Headers;
pub use params::{Param, ParamKind, Params};
pub use requestbody::RequestBody;
pub use response::RawResponse;
