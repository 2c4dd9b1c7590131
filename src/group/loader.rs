//! Origin loader capability: where values come from when no cache has them.

use async_trait::async_trait;

/// Loads the authoritative value for a key.
///
/// Errors are reported to cache callers as
/// [`GroupError::OriginLoadFailed`](crate::group::cache_group::GroupError::OriginLoadFailed)
/// with the error's message.
#[async_trait]
pub trait OriginLoader: Send + Sync {
    async fn load(&self, key: &str) -> anyhow::Result<Vec<u8>>;
}

/// Adapts a plain function or closure into an [`OriginLoader`].
pub struct LoaderFn<F>(pub F);

#[async_trait]
impl<F> OriginLoader for LoaderFn<F>
where
    F: Fn(&str) -> anyhow::Result<Vec<u8>> + Send + Sync,
{
    async fn load(&self, key: &str) -> anyhow::Result<Vec<u8>> {
        (self.0)(key)
    }
}
