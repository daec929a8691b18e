//! Bundled capability adapters.
//!
//! Each adapter fronts one external application behind the uniform
//! `CapabilityProvider` contract. The OS-level automation mechanics live
//! outside this core; these adapters model the contract and keep just
//! enough state to be observable in tests.

pub mod mail;
pub mod photos;
pub mod slack;

pub use mail::MailProvider;
pub use photos::PhotosProvider;
pub use slack::SlackProvider;
