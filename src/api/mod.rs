/// Photo API module
///
/// This module handles:
/// - Describing requests and responses independently of any transport (request.rs)
/// - Tolerant decoding of JSON bodies (decode.rs)
/// - The HTTP client for the three read endpoints (client.rs)

pub mod client;
pub mod decode;
pub mod request;
