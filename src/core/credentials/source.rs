//! Credential acquisition collaborators

use super::Credential;
use async_trait::async_trait;
use std::future::Future;

/// Issues a new credential, typically by exchanging an identity token
#[async_trait]
pub trait CredentialSource: Send + Sync {
    async fn acquire(&self) -> anyhow::Result<Credential>;
}

/// A credential source that wraps an async closure
pub struct FnCredentialSource<F> {
    acquire: F,
}

impl<F, Fut> FnCredentialSource<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Credential>> + Send,
{
    pub fn new(acquire: F) -> Self {
        FnCredentialSource { acquire }
    }
}

#[async_trait]
impl<F, Fut> CredentialSource for FnCredentialSource<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Credential>> + Send,
{
    async fn acquire(&self) -> anyhow::Result<Credential> {
        (self.acquire)().await
    }
}

/// Create a credential source from an async closure
pub fn credential_source_fn<F, Fut>(f: F) -> FnCredentialSource<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Credential>> + Send,
{
    FnCredentialSource::new(f)
}
