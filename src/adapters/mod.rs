// Adapters layer: concrete implementations of the domain ports.

pub mod http;
pub mod serial;

pub use http::HttpBackend;
pub use serial::SerialPortLink;
