//! Domain layer of the Oso Cloud client.

pub mod client;
pub mod executor;
mod fallback;
pub mod offset;
mod payloads;
pub mod request;

pub use client::OsoCloud;
pub use executor::Executor;
pub use offset::OffsetTracker;
pub use request::RequestDescriptor;
