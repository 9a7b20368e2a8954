pub mod upstream;

pub use upstream::{HttpUpstream, UpstreamError, UpstreamResponse, UpstreamSource};
