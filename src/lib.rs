pub mod config;
pub mod engine;
pub mod error;
pub mod listing;
pub mod remote;
pub mod scanner;
pub mod transport;

pub use error::FtpTreeError;
pub type Result<T> = std::result::Result<T, FtpTreeError>;
