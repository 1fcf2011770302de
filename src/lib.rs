//! Client for the Sony Ci media cloud API.
//!
//! Handles the OAuth password grant, single-shot and multipart chunked
//! uploads, workspace listing, asset details, deletion and download URLs.

pub mod ci;
pub mod config;
pub mod error;

pub use ci::{ClientOptions, Credentials, Endpoints, SonyCiAdmin};
pub use error::{CiError, Result};
