pub mod client;
pub mod normalize;
pub mod types;

pub use client::ClassifierClient;
pub use normalize::normalize;
pub use types::*;
