//! Core types shared by the airgrab crates: the AIR identifier grammar, the
//! metadata records returned by the model service, pipeline events and errors.

pub mod air;
pub mod category;
pub mod error;
pub mod manifest;
pub mod protocol;

pub use air::{ResourceLocator, UNSPECIFIED_VERSION};
pub use error::{GrabError, ParseError, RemoteStatus};
