//! Oracle implementations for availability checks.
//!
//! The pipeline only depends on the [`Oracle`] trait; the ENS registrar
//! client is one implementation, test stubs are others.

use crate::error::HuntError;
use async_trait::async_trait;
use std::sync::Arc;

/// ENS registrar controller over Ethereum JSON-RPC
pub mod registrar;

pub use registrar::{RegistrarClient, REGISTRAR_CONTROLLER};

/// A read-only endpoint answering "can this label be registered?".
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Query availability of a bare label (no suffix).
    async fn available(&self, label: &str) -> Result<bool, HuntError>;
}

#[async_trait]
impl<T: Oracle + ?Sized> Oracle for Arc<T> {
    async fn available(&self, label: &str) -> Result<bool, HuntError> {
        (**self).available(label).await
    }
}
