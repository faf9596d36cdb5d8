pub mod fetcher;
pub mod http;
pub mod proxy;

pub use fetcher::{FetchError, MetadataFetcher};
pub use proxy::{MediaProxy, ProxyError};
