//! Capability providers for Valet.
//!
//! Defines the `CapabilityProvider` contract every app adapter implements,
//! the registry that answers "who can do X", and the bundled adapters for
//! mail, messaging, and media.

pub mod adapter;
pub mod error;
pub mod provider;
pub mod registry;

pub use adapter::{MailProvider, PhotosProvider, SlackProvider};
pub use error::CapabilityError;
pub use provider::{ActionParams, CapabilityDescriptor, CapabilityProvider};
pub use registry::CapabilityRegistry;
