//! Git collaborator: project root discovery and working-tree diff text

use crate::process::{resolve_binary, run_captured};
use crate::result::{PrunerError, PrunerResult};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Environment variable overriding the `git` executable
pub const ENV_GIT_BIN: &str = "PRUNER_GIT_BIN";

const DEFAULT_GIT_BIN: &str = "git";

/// Diff arguments that pin the output format regardless of user config
const DIFF_ARGS: &[&str] = &[
    "-c",
    "core.quotePath=false",
    "-c",
    "diff.noprefix=false",
    "-c",
    "diff.mnemonicPrefix=false",
    "diff",
    "--no-color",
    "--no-ext-diff",
    "--no-textconv",
    "--src-prefix=a/",
    "--dst-prefix=b/",
    "HEAD",
];

/// Source of raw unified diff text for the working tree
#[async_trait]
pub trait DiffSource: Send + Sync {
    /// Diff of the working tree against its baseline
    async fn diff_text(&self) -> PrunerResult<String>;
}

/// A git work tree rooted at its top-level directory
#[derive(Debug, Clone)]
pub struct GitRepository {
    binary: PathBuf,
    root: PathBuf,
}

impl GitRepository {
    /// Locate the work tree containing `cwd`
    ///
    /// # Errors
    ///
    /// [`PrunerError::NotInRepository`] when `cwd` is not inside a work tree
    /// or git cannot be executed.
    pub async fn discover(cwd: &Path) -> PrunerResult<Self> {
        let binary = resolve_binary(ENV_GIT_BIN, DEFAULT_GIT_BIN)?;
        let root = top_directory(&binary, cwd).await?;
        tracing::debug!(root = %root.display(), "found git work tree");
        Ok(Self { binary, root })
    }

    /// Open a known work tree without probing git
    #[must_use]
    pub fn at(binary: impl Into<PathBuf>, root: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            root: root.into(),
        }
    }

    /// Top-level directory of the work tree
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn git(&self, args: &[&str]) -> PrunerResult<String> {
        let args: Vec<OsString> = args.iter().map(OsString::from).collect();
        let outcome = run_captured(&self.binary, &args, &self.root).await?;
        if !outcome.success() {
            return Err(PrunerError::git(outcome.stderr.trim().to_owned()));
        }
        Ok(outcome.stdout)
    }

    /// Whether HEAD names a commit (false in a repository with no commits)
    async fn has_head(&self) -> PrunerResult<bool> {
        let args = ["rev-parse", "--verify", "--quiet", "HEAD"].map(OsString::from);
        let outcome = run_captured(&self.binary, &args, &self.root).await?;
        Ok(outcome.success())
    }
}

#[async_trait]
impl DiffSource for GitRepository {
    async fn diff_text(&self) -> PrunerResult<String> {
        if !self.has_head().await? {
            tracing::debug!(root = %self.root.display(), "HEAD is unborn, nothing to diff");
            return Ok(String::new());
        }
        self.git(DIFF_ARGS).await
    }
}

async fn top_directory(binary: &Path, cwd: &Path) -> PrunerResult<PathBuf> {
    let args = [OsString::from("rev-parse"), OsString::from("--show-toplevel")];
    let outcome = match run_captured(binary, &args, cwd).await {
        Ok(outcome) => outcome,
        Err(error) => {
            tracing::debug!(%error, "git unavailable");
            return Err(PrunerError::NotInRepository);
        }
    };
    let top = outcome.stdout.trim();
    if !outcome.success() || top.is_empty() {
        tracing::debug!(stderr = %outcome.stderr.trim(), "not a git work tree");
        return Err(PrunerError::NotInRepository);
    }
    Ok(PathBuf::from(top))
}
