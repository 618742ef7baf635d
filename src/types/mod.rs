//! SAML 2.0 protocol messages and constants.
//!
//! Every outbound message embeds a [`MessageEnvelope`] and serializes
//! through [`ToXml`]; the [`Assertion`] is the only message with an
//! inbound parse-and-validate path.

mod artifact;
mod assertion;
mod authn_request;
mod constants;
mod logout;
mod message;

pub use artifact::*;
pub use assertion::*;
pub use authn_request::*;
pub use constants::*;
pub use logout::*;
pub use message::*;
