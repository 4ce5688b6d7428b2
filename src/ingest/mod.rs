/// Retrieval and decoding of upstream payloads.
///
/// Submodules:
/// - `http`   — the `Fetcher` seam and its HTTP implementation.
/// - `decode` — raw bytes to a JSON value.

pub mod decode;
pub mod http;

pub use decode::decode;
pub use http::{Fetcher, HttpConfig, HttpFetcher};
