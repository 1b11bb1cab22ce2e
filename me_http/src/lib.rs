pub mod client;
pub mod errors;
pub mod index;

pub use client::HttpClient;
pub use client::HttpClientConfig;
pub use errors::HttpError;
pub use errors::Result;
pub use index::BootstrapOutcome;
pub use index::IndexClient;
pub use index::IndexTarget;
pub use index::WriteOutcome;
pub use reqwest::StatusCode;
