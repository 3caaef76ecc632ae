use std::path::Path;

use async_trait::async_trait;

use crate::application::SharedApplication;
use crate::error::BuildError;

/// Builds the application for one discovered file.
///
/// `base_url` is the URL prefix the application is mounted at
/// (e.g. `/apps/nested/leaf`); `file_path` is canonical.
#[async_trait]
pub trait ApplicationFactory: Send + Sync + 'static {
    async fn build(&self, base_url: &str, file_path: &Path) -> Result<SharedApplication, BuildError>;
}

/// Factory backed by a synchronous closure.
pub struct FnFactory<F>(F);

/// Wrap a closure as an [`ApplicationFactory`].
pub fn factory_fn<F>(f: F) -> FnFactory<F>
where
    F: Fn(&str, &Path) -> Result<SharedApplication, BuildError> + Send + Sync + 'static,
{
    FnFactory(f)
}

#[async_trait]
impl<F> ApplicationFactory for FnFactory<F>
where
    F: Fn(&str, &Path) -> Result<SharedApplication, BuildError> + Send + Sync + 'static,
{
    async fn build(&self, base_url: &str, file_path: &Path) -> Result<SharedApplication, BuildError> {
        (self.0)(base_url, file_path)
    }
}
