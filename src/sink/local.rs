/// Local directory sink.
///
/// Objects are written to a temporary file next to their destination and
/// renamed into place, so readers only ever see the previous object or the
/// complete new one. The temporary file is removed on every failure path
/// when the `NamedTempFile` is dropped.

use std::io::Write;
use std::path::{Component, Path, PathBuf};

use tempfile::NamedTempFile;

use super::Sink;
use crate::error::PublishError;

#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        DirectorySink {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Destination path of `key`, refusing keys that escape the root.
    pub fn object_path(&self, key: &str) -> Option<PathBuf> {
        let relative = Path::new(key);
        let contained = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        contained.then(|| self.root.join(relative))
    }
}

impl Sink for DirectorySink {
    fn publish(&self, key: &str, bytes: &[u8]) -> Result<(), PublishError> {
        let publish_error = |cause: String| PublishError {
            key: key.to_string(),
            cause,
        };

        let target = self
            .object_path(key)
            .ok_or_else(|| publish_error("key must be a relative path inside the sink directory".to_string()))?;
        let parent = target.parent().unwrap_or(&self.root);

        std::fs::create_dir_all(parent).map_err(|e| publish_error(e.to_string()))?;

        let mut staged = NamedTempFile::new_in(parent).map_err(|e| publish_error(e.to_string()))?;
        staged.write_all(bytes).map_err(|e| publish_error(e.to_string()))?;
        staged.as_file().sync_all().map_err(|e| publish_error(e.to_string()))?;
        staged.persist(&target).map_err(|e| publish_error(e.error.to_string()))?;

        Ok(())
    }
}
