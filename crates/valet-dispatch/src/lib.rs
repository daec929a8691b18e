//! Interactive dispatch path for Valet.
//!
//! Maps a parsed intent to a capability provider, enforces the
//! confirmation gate on mutating actions, bounds every invocation with a
//! timeout, and records each outcome in the activity log. Also home to
//! the notification sink the background scheduler delivers through.

pub mod error;
pub mod intent;
pub mod notify;
pub mod router;

pub use error::DispatchError;
pub use intent::{DirectiveParser, Intent};
pub use notify::{ChannelSink, NotificationSink, RateLimiter, TracingSink};
pub use router::{is_mutating, IntentRouter};
