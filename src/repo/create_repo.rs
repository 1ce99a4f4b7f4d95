//! Opening filesystem repositories.

use std::path::{Path, PathBuf};

use configparser::ini::Ini;
use thiserror::Error;
use tracing::debug;

use crate::backend::FsBackend;
use crate::caches::{DEFAULT_OBJECT_CACHE_SIZE, ObjectCache};
use crate::repository::{ObjectError, ObjectFormat};

use super::Repo;

/// Errors that can occur while opening a repository.
#[derive(Debug, Error)]
pub enum CreateRepoError {
    /// Neither a working directory nor a git directory was given.
    #[error("either a working directory or a git directory is required")]
    NoLocation,

    /// The git directory does not exist or is not a directory.
    #[error("not a git directory: {0}")]
    NotAGitDir(PathBuf),

    /// The repository's `config` file could not be parsed.
    #[error("failed to parse {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// `extensions.objectformat` names a hash this crate does not know.
    #[error("{0}")]
    ObjectFormat(#[from] ObjectError),
}

/// Result type for opening repositories.
pub type Result<T> = std::result::Result<T, CreateRepoError>;

/// Where to find a repository on disk.
#[derive(Debug, Clone)]
pub struct OpenRepo {
    /// Working directory. The git directory defaults to `dir/.git`.
    pub dir: Option<PathBuf>,
    /// Explicit git directory.
    pub git_dir: Option<PathBuf>,
    /// Object cache budget in bytes; zero disables caching.
    pub cache_size: usize,
}

impl Default for OpenRepo {
    fn default() -> Self {
        Self {
            dir: None,
            git_dir: None,
            cache_size: DEFAULT_OBJECT_CACHE_SIZE,
        }
    }
}

impl OpenRepo {
    /// Resolve the git directory: explicit `git_dir`, else `dir/.git`.
    pub fn resolve_git_dir(&self) -> Result<PathBuf> {
        match (&self.git_dir, &self.dir) {
            (Some(git_dir), _) => Ok(git_dir.clone()),
            (None, Some(dir)) => Ok(dir.join(".git")),
            (None, None) => Err(CreateRepoError::NoLocation),
        }
    }
}

impl Repo {
    /// Open the repository at the given location.
    pub fn open(spec: &OpenRepo) -> Result<Repo> {
        let git_dir = spec.resolve_git_dir()?;
        if !is_dir(&git_dir) {
            return Err(CreateRepoError::NotAGitDir(git_dir));
        }
        let format = read_object_format(&git_dir)?;
        debug!(
            git_dir = %git_dir.display(),
            cache_size = spec.cache_size,
            %format,
            "opening repository"
        );
        let repo = Repo::new(FsBackend::new(&git_dir), ObjectCache::new(spec.cache_size));
        Ok(repo.with_format(format))
    }
}

/// Read `extensions.objectformat` from the repository's config.
///
/// A missing config file or key means sha-1, as in git.
fn read_object_format(git_dir: &Path) -> Result<ObjectFormat> {
    let path = git_dir.join("config");
    if !path.is_file() {
        return Ok(ObjectFormat::default());
    }

    let mut ini = Ini::new();
    ini.load(&path).map_err(|message| CreateRepoError::Config {
        path: path.clone(),
        message,
    })?;
    match ini.get("extensions", "objectformat") {
        Some(name) => Ok(ObjectFormat::parse(&name)?),
        None => Ok(ObjectFormat::default()),
    }
}

fn is_dir(path: &Path) -> bool {
    path.metadata().map(|m| m.is_dir()).unwrap_or(false)
}
