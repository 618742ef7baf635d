//! SAML 2.0 Service Provider core.
//!
//! This crate implements the SP half of a SAML 2.0 deployment:
//!
//! - **IdP metadata ingestion** - Parse an `EntityDescriptor`, extract
//!   endpoints keyed by binding, certificates keyed by usage, and NameID
//!   formats
//! - **SP metadata emission** - Generate the SP's own `EntityDescriptor`
//! - **Protocol messages** - Build AuthnRequest, LogoutRequest,
//!   LogoutResponse and ArtifactResolve; parse and validate inbound
//!   Assertions against audience, request correlation and validity windows
//! - **Binding contracts** - HTTP-Redirect, HTTP-POST and SOAP parameter
//!   handling, with transport and signature primitives injected by the
//!   caller
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`metadata`] - IdP and SP descriptors
//! - [`types`] - Protocol messages and SAML constants
//! - [`bindings`] - Binding parameter handling and collaborator traits
//! - [`certs`] - X.509 certificate material handling
//! - [`xml`] - Comment stripping and namespaced document queries
//! - [`error`] - Error types
//!
//! # Example
//!
//! ```rust,ignore
//! use saml_sp::metadata::{IdpDescriptor, IdpQuirks, SpConfig, SpDescriptor};
//!
//! let idp = IdpDescriptor::from_xml(&metadata_xml, None, IdpQuirks::default())?;
//! let sp = SpDescriptor::new(config)?;
//! let dest = idp.sso_url(saml_sp::types::BINDING_HTTP_REDIRECT).unwrap();
//! let request = sp.authn_request(dest, idp.format(None).unwrap());
//! ```
//!
//! # SAML Specifications
//!
//! - [SAML 2.0 Core](https://docs.oasis-open.org/security/saml/v2.0/saml-core-2.0-os.pdf)
//! - [SAML 2.0 Bindings](https://docs.oasis-open.org/security/saml/v2.0/saml-bindings-2.0-os.pdf)
//! - [SAML 2.0 Metadata](https://docs.oasis-open.org/security/saml/v2.0/saml-metadata-2.0-os.pdf)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bindings;
pub mod certs;
pub mod error;
pub mod metadata;
pub mod types;
pub mod xml;

pub use error::{SpError, SpResult};
pub use metadata::{IdpDescriptor, IdpQuirks, SpConfig, SpDescriptor};
pub use types::Assertion;
