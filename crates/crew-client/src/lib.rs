pub mod client;
pub mod error;

pub use client::CrewClient;
pub use error::{ClientError, ClientResult};
