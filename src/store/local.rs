use crate::store::item::ObjectLocation;
use crate::store::traits::{ObjectReader, ReadError};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

/// Reads objects from `<root>/<bucket>/<key>` on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalObjectReader {
    root: PathBuf,
}

impl LocalObjectReader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, location: &ObjectLocation) -> Result<PathBuf, ReadError> {
        let relative = Path::new(&location.bucket).join(&location.key);

        // Keys must stay inside the root
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(ReadError::Access(location.to_string()));
        }

        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectReader for LocalObjectReader {
    async fn get(&self, location: &ObjectLocation) -> Result<Vec<u8>, ReadError> {
        let path = self.path_for(location)?;

        tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => ReadError::NotFound(location.to_string()),
            ErrorKind::PermissionDenied => ReadError::Access(location.to_string()),
            _ => ReadError::Io(format!("{}: {}", path.display(), e)),
        })
    }
}
