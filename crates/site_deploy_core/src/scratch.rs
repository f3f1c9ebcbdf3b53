use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::contract::PACKAGE_ENTRY_NAME;
use crate::error::DeploymentError;

pub const ARTIFACT_FILE_NAME: &str = "artifact.zip";
pub const DEPLOYMENT_DIR_NAME: &str = "deployment";

/// Per-invocation scratch state. Owned by one invocation at a time; a reused
/// execution environment sees the previous invocation's files until
/// [`ScratchWorkspace::prepare`] and [`ScratchWorkspace::reset_deployment_dir`]
/// run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScratchWorkspace {
    root: PathBuf,
}

impl ScratchWorkspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn artifact_path(&self) -> PathBuf {
        self.root.join(ARTIFACT_FILE_NAME)
    }

    pub fn package_path(&self) -> PathBuf {
        self.root.join(PACKAGE_ENTRY_NAME)
    }

    pub fn deployment_dir(&self) -> PathBuf {
        self.root.join(DEPLOYMENT_DIR_NAME)
    }

    /// Creates the root and drops archives left behind by an earlier run.
    pub fn prepare(&self) -> Result<(), DeploymentError> {
        fs::create_dir_all(&self.root).map_err(|error| workspace_error(&self.root, error))?;
        for stale in [self.artifact_path(), self.package_path()] {
            remove_file_if_exists(&stale)?;
        }
        Ok(())
    }

    pub fn persist_artifact(&self, bytes: &[u8]) -> Result<PathBuf, DeploymentError> {
        let path = self.artifact_path();
        fs::write(&path, bytes).map_err(|error| workspace_error(&path, error))?;
        Ok(path)
    }

    /// Clears the deployment directory and recreates it empty.
    pub fn reset_deployment_dir(&self) -> Result<PathBuf, DeploymentError> {
        let dir = self.deployment_dir();
        match fs::remove_dir_all(&dir) {
            Ok(()) => {}
            Err(error) if error.kind() == io::ErrorKind::NotFound => {}
            Err(error) => return Err(workspace_error(&dir, error)),
        }
        fs::create_dir_all(&dir).map_err(|error| workspace_error(&dir, error))?;
        Ok(dir)
    }
}

fn remove_file_if_exists(path: &Path) -> Result<(), DeploymentError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(error) => Err(workspace_error(path, error)),
    }
}

fn workspace_error(path: &Path, error: io::Error) -> DeploymentError {
    DeploymentError::Workspace(format!("{}: {error}", path.display()))
}
