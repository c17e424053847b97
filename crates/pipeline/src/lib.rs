//! The download pipeline: a producer turning text snippets into
//! [`ResourceLocator`](airgrab_core::ResourceLocator)s, a rendezvous channel,
//! and the [`Orchestrator`] that resolves and downloads each one.

pub mod handoff;
pub mod layout;
pub mod orchestrator;
pub mod source;

pub use handoff::{handoff, Disconnected, HandoffReceiver, HandoffSender};
pub use orchestrator::{Orchestrator, RunSummary};
pub use source::SourceSummary;
