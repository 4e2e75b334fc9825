//! Security checks applied to publish configuration.
//!
//! - Manifest path traversal prevention
//! - Registry URL validation with SSRF protection
//! - Token redaction
//!
//! Execution-time checks stop at the first failure; the `validate` entry
//! point collects every failure through [`ValidationBuilder`].

mod path;
mod registry;
mod secret;
mod validation;

pub use path::{normalize, validate_path, PathError};
pub use registry::{
    is_private_ip, validate_registry, validate_registry_name, RegistryError, SECURE_SCHEMES,
};
pub use secret::{RegistryToken, REDACTED, TOKEN_ENV_VAR};
pub use validation::{FieldError, ValidateResponse, ValidationBuilder};
