//! Per-attempt scratch directories
//!
//! Every test case attempt gets a directory named after a unique identity
//! `<prefix>_<unix-millis>_<9 random chars>`. The generated source, the Java
//! class files and any executable all live inside it, so removing the
//! directory removes every artifact of the attempt.

use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::distributions::Alphanumeric;
use rand::Rng;
use tempfile::TempDir;
use tracing::warn;

use crate::languages::CommandVars;

const TOKEN_LEN: usize = 9;
const MAX_ATTEMPTS: usize = 8;

/// A scratch directory owned by one attempt; removed on release or drop
#[derive(Debug)]
pub struct ScratchArtifact {
    dir: Option<TempDir>,
    program_name: String,
    source_path: PathBuf,
    binary_path: PathBuf,
}

impl ScratchArtifact {
    /// Reserve a fresh directory under `root` for a program with `extension`
    pub fn create(root: &Path, prefix: &str, extension: &str) -> io::Result<Self> {
        let mut last_err = None;
        for _ in 0..MAX_ATTEMPTS {
            let name = unique_name(prefix);
            match tempfile::Builder::new()
                .prefix(&name)
                .rand_bytes(0)
                .tempdir_in(root)
            {
                Ok(dir) => {
                    let source_path = dir.path().join(format!("{}.{}", name, extension));
                    let binary_path = dir.path().join(&name);
                    return Ok(Self {
                        dir: Some(dir),
                        program_name: name,
                        source_path,
                        binary_path,
                    });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => last_err = Some(e),
                Err(e) => return Err(e),
            }
        }
        Err(last_err.unwrap_or_else(|| io::Error::other("scratch name collision")))
    }

    /// The unique identity; also the Java class name and executable name
    pub fn program_name(&self) -> &str {
        &self.program_name
    }

    pub fn dir(&self) -> &Path {
        self.source_path.parent().unwrap_or(&self.source_path)
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    pub fn command_vars(&self) -> CommandVars<'_> {
        CommandVars {
            source: &self.source_path,
            binary: &self.binary_path,
            class: &self.program_name,
            dir: self.dir(),
        }
    }

    /// Remove the directory now. Failures are logged, not returned.
    pub fn release(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        if let Some(dir) = self.dir.take() {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                warn!("Failed to remove scratch directory {:?}: {}", path, e);
            }
        }
    }
}

impl Drop for ScratchArtifact {
    fn drop(&mut self) {
        self.remove();
    }
}

fn unique_name(prefix: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let token: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(|c| (c as char).to_ascii_lowercase())
        .collect();
    format!("{}_{}_{}", prefix, millis, token)
}
