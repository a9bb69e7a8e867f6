//! Streaming service providers

pub mod abciview;

pub use abciview::AbcIviewProvider;
