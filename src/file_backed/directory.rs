//! Directory File Store
//!
//! One file per key inside a directory. Writes and deletes are queued to a
//! single background task and applied in submission order; reads and key
//! listings hit the file system directly.
//!
//! # Requirements
//! - Must be opened from within a tokio runtime

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::error::{CacheError, Result};
use crate::file_backed::FileStore;

/// Prefix of in-flight temporary files; never a valid key.
const PARTIAL_PREFIX: &str = ".";

enum Command {
    Write { path: PathBuf, data: Vec<u8> },
    Delete { path: PathBuf },
    DeleteAll,
    Flush(oneshot::Sender<()>),
}

// == Directory File Store ==
/// File store keeping each blob as a file named after its key.
#[derive(Debug)]
pub struct DirectoryFileStore {
    root: PathBuf,
    commands: mpsc::UnboundedSender<Command>,
}

impl DirectoryFileStore {
    // == Constructor ==
    /// Opens (creating if needed) the directory at `root` and starts its writer task.
    ///
    /// An existing directory is reused as is. An existing file that is not a
    /// directory is a `NotADirectory` error.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        create_directory(&root).await?;

        let (commands, receiver) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(root.clone(), receiver));

        info!("Directory file store opened at {}", root.display());
        Ok(Self { root, commands })
    }

    /// Directory holding one file per key.
    pub fn root(&self) -> &Path {
        &self.root
    }

    // == Flush ==
    /// Waits until every write and delete submitted before this call has been
    /// applied. Reads after `flush` observe those changes.
    pub async fn flush(&self) {
        let (done, finished) = oneshot::channel();
        if self.commands.send(Command::Flush(done)).is_ok() {
            let _ = finished.await;
        }
    }

    fn path_for(&self, key: &str) -> Option<PathBuf> {
        if key.is_empty() || key.starts_with(PARTIAL_PREFIX) || key.contains(['/', '\\']) {
            warn!("Refusing unusable file store key {:?}", key);
            return None;
        }
        Some(self.root.join(key))
    }

    fn submit(&self, command: Command) {
        if self.commands.send(command).is_err() {
            warn!(
                "Writer for {} has stopped, dropping operation",
                self.root.display()
            );
        }
    }
}

impl FileStore for DirectoryFileStore {
    fn keys(&self) -> Vec<String> {
        match list_files(&self.root) {
            Ok(keys) => keys,
            Err(err) => {
                warn!(
                    "Could not read contents of directory {}: {}",
                    self.root.display(),
                    err
                );
                Vec::new()
            }
        }
    }

    fn archive(&self, data: Vec<u8>, key: &str) {
        if let Some(path) = self.path_for(key) {
            self.submit(Command::Write { path, data });
        }
    }

    fn data(&self, key: &str) -> Option<Vec<u8>> {
        let path = self.path_for(key)?;
        match std::fs::read(&path) {
            Ok(data) => Some(data),
            Err(err) if err.kind() == io::ErrorKind::NotFound => None,
            Err(err) => {
                warn!("Could not read data from {}: {}", path.display(), err);
                None
            }
        }
    }

    fn delete(&self, key: &str) {
        if let Some(path) = self.path_for(key) {
            self.submit(Command::Delete { path });
        }
    }

    fn delete_all(&self) {
        self.submit(Command::DeleteAll);
    }
}

// == Directory Creation ==
/// Creates `path` with its parents. An existing directory is success.
pub(crate) async fn create_directory(path: &Path) -> Result<()> {
    match fs::metadata(path).await {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(CacheError::NotADirectory(path.to_path_buf())),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(path).await?;
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

fn list_files(root: &Path) -> io::Result<Vec<String>> {
    let mut keys = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if let Ok(name) = entry.file_name().into_string() {
            if !name.starts_with(PARTIAL_PREFIX) {
                keys.push(name);
            }
        }
    }
    Ok(keys)
}

// == Writer Task ==
async fn run_writer(root: PathBuf, mut commands: mpsc::UnboundedReceiver<Command>) {
    while let Some(command) = commands.recv().await {
        let result = match command {
            Command::Write { path, data } => write_file(&path, data).await,
            Command::Delete { path } => delete_file(&path).await,
            Command::DeleteAll => delete_all_files(&root).await,
            Command::Flush(done) => {
                let _ = done.send(());
                Ok(())
            }
        };

        if let Err(err) = result {
            warn!("File store operation in {} failed: {}", root.display(), err);
        }
    }
    debug!("Writer for {} stopped", root.display());
}

/// Writes to a hidden sibling first so readers never see a partial file.
async fn write_file(path: &Path, data: Vec<u8>) -> Result<()> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let partial = path.with_file_name(format!("{}{}.partial", PARTIAL_PREFIX, file_name));

    fs::write(&partial, data).await?;
    fs::rename(&partial, path).await?;
    Ok(())
}

async fn delete_file(path: &Path) -> Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            Err(CacheError::FileDoesNotExist(path.to_path_buf()))
        }
        Err(err) => Err(err.into()),
    }
}

async fn delete_all_files(root: &Path) -> Result<()> {
    let mut entries = match fs::read_dir(root).await {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(CacheError::FileDoesNotExist(root.to_path_buf()));
        }
        Err(err) => return Err(err.into()),
    };

    let mut removed = 0usize;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_dir() {
            fs::remove_dir_all(entry.path()).await?;
        } else {
            fs::remove_file(entry.path()).await?;
        }
        removed += 1;
    }
    debug!("Removed {} entries from {}", removed, root.display());
    Ok(())
}
