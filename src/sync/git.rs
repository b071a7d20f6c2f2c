//! Git publishing for generated content files.
//!
//! A trait-based abstraction over git commands (mockable in tests) plus
//! the publisher that pushes content changes downstream. The CMS is the
//! source of truth; git is a write-behind replica, so publish failures
//! are reported as an outcome, logged, and never propagated as errors.

use miette::Diagnostic;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Config;

#[cfg(test)]
use mockall::automock;

/// Errors that can occur during git operations.
#[derive(Error, Diagnostic, Debug)]
pub enum GitError {
    #[error("Git command failed: {0}")]
    #[diagnostic(code(mdxsync::git::command_failed))]
    CommandFailed(String),

    #[error("Git command returned non-zero exit code {code}: {output}")]
    #[diagnostic(code(mdxsync::git::non_zero_exit))]
    NonZeroExit { code: i32, output: String },

    #[error("Git not installed or not in PATH")]
    #[diagnostic(code(mdxsync::git::not_found))]
    GitNotFound,
}

/// Trait for git operations. Can be mocked in tests.
#[cfg_attr(test, automock)]
pub trait GitOps {
    /// Add files to the staging area.
    fn add_files(&self, path: &Path, files: &[String]) -> Result<Output, GitError>;

    /// Create a commit with the given message.
    fn commit(&self, path: &Path, message: &str) -> Result<Output, GitError>;

    /// Pull with rebase from the tracked remote branch.
    fn pull_rebase(&self, path: &Path) -> Result<Output, GitError>;

    /// Push to the tracked remote branch.
    fn push(&self, path: &Path) -> Result<Output, GitError>;
}

/// Real implementation of GitOps using std::process::Command.
#[derive(Clone, Copy)]
pub struct RealGit;

impl RealGit {
    pub fn new() -> Self {
        Self
    }

    fn run_git(&self, path: &Path, args: &[&str]) -> Result<Output, GitError> {
        Command::new("git")
            .args(args)
            .current_dir(path)
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    GitError::GitNotFound
                } else {
                    GitError::CommandFailed(e.to_string())
                }
            })
    }

    fn check_output(&self, output: Output) -> Result<Output, GitError> {
        if output.status.success() {
            Ok(output)
        } else {
            let code = output.status.code().unwrap_or(-1);
            let stdout = String::from_utf8_lossy(&output.stdout).to_string();
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            let combined = if !stdout.is_empty() && !stderr.is_empty() {
                format!("{}\n{}", stdout, stderr)
            } else if !stdout.is_empty() {
                stdout
            } else {
                stderr
            };
            Err(GitError::NonZeroExit {
                code,
                output: combined,
            })
        }
    }
}

impl Default for RealGit {
    fn default() -> Self {
        Self::new()
    }
}

impl GitOps for RealGit {
    fn add_files(&self, path: &Path, files: &[String]) -> Result<Output, GitError> {
        let mut args = vec!["add"];
        let file_refs: Vec<&str> = files.iter().map(|s| s.as_str()).collect();
        args.extend(file_refs);
        let output = self.run_git(path, &args)?;
        self.check_output(output)
    }

    fn commit(&self, path: &Path, message: &str) -> Result<Output, GitError> {
        let output = self.run_git(path, &["commit", "-m", message])?;
        self.check_output(output)
    }

    fn pull_rebase(&self, path: &Path) -> Result<Output, GitError> {
        let output = self.run_git(path, &["pull", "--rebase"])?;
        self.check_output(output)
    }

    fn push(&self, path: &Path) -> Result<Output, GitError> {
        let output = self.run_git(path, &["push"])?;
        self.check_output(output)
    }
}

/// What happened to a publish attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Committed and pushed.
    Published,
    /// Nothing was attempted (publishing disabled or dry-run).
    Skipped(String),
    /// A git step failed; logged and swallowed.
    Failed(String),
}

/// Publishes content files to the git repository.
///
/// Content-authoring operations must never be blocked by publishing
/// infrastructure, so `publish` always returns an outcome, never an
/// error.
pub struct Publisher<G: GitOps> {
    git: G,
    repo_root: PathBuf,
    uploads_dir: PathBuf,
    disabled: bool,
}

impl<G: GitOps> Publisher<G> {
    pub fn new(git: G, repo_root: PathBuf, config: &Config) -> Self {
        Self {
            git,
            repo_root,
            uploads_dir: config.uploads_dir.clone(),
            disabled: config.git_sync_disabled,
        }
    }

    /// Stage the given file (plus the uploads directory so media changes
    /// ride along), commit, pull-rebase, and push.
    pub fn publish(&self, path: &Path, message: &str) -> PublishOutcome {
        if self.disabled {
            info!("git sync disabled, skipping publish of {}", path.display());
            return PublishOutcome::Skipped("git sync disabled".to_string());
        }

        let mut files = vec![path.display().to_string()];
        if self.uploads_dir.exists() {
            files.push(self.uploads_dir.display().to_string());
        }

        let result = self
            .git
            .add_files(&self.repo_root, &files)
            .and_then(|_| self.git.commit(&self.repo_root, message))
            .and_then(|_| self.git.pull_rebase(&self.repo_root))
            .and_then(|_| self.git.push(&self.repo_root));

        match result {
            Ok(_) => {
                info!("git sync complete: {}", message);
                PublishOutcome::Published
            }
            Err(e) => {
                warn!("git sync failed: {}", e);
                PublishOutcome::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::process::ExitStatusExt;
    use std::process::ExitStatus;
    use tempfile::TempDir;

    fn mock_output(code: i32, stdout: &str, stderr: &str) -> Output {
        Output {
            status: ExitStatus::from_raw(code),
            stdout: stdout.as_bytes().to_vec(),
            stderr: stderr.as_bytes().to_vec(),
        }
    }

    fn test_config(disabled: bool, uploads_dir: &Path) -> Config {
        Config {
            cms_url: "http://localhost:1337".to_string(),
            cms_token: None,
            content_root: "src/content".into(),
            translations_dir: "exports/translations".into(),
            uploads_dir: uploads_dir.to_path_buf(),
            uploads_url: None,
            git_sync_disabled: disabled,
        }
    }

    #[test]
    fn test_publish_disabled_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let mock_git = MockGitOps::new();
        let config = test_config(true, &temp_dir.path().join("uploads"));
        let publisher = Publisher::new(mock_git, temp_dir.path().to_path_buf(), &config);

        let outcome = publisher.publish(Path::new("src/content/blog/a.mdx"), "blog: add \"A\"");
        assert!(matches!(outcome, PublishOutcome::Skipped(_)));
    }

    #[test]
    fn test_publish_runs_full_sequence() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().to_path_buf();

        let expected_root = root.clone();
        let mut mock_git = MockGitOps::new();
        mock_git
            .expect_add_files()
            .withf(move |path, files| path == expected_root && files == ["a.mdx".to_string()])
            .times(1)
            .returning(|_, _| Ok(mock_output(0, "", "")));
        mock_git
            .expect_commit()
            .withf(|_, message| message == "blog: update \"A\"")
            .times(1)
            .returning(|_, _| Ok(mock_output(0, "", "")));
        mock_git
            .expect_pull_rebase()
            .times(1)
            .returning(|_| Ok(mock_output(0, "", "")));
        mock_git
            .expect_push()
            .times(1)
            .returning(|_| Ok(mock_output(0, "", "")));

        let config = test_config(false, &temp_dir.path().join("missing-uploads"));
        let publisher = Publisher::new(mock_git, root, &config);

        let outcome = publisher.publish(Path::new("a.mdx"), "blog: update \"A\"");
        assert_eq!(outcome, PublishOutcome::Published);
    }

    #[test]
    fn test_publish_stages_uploads_dir_when_present() {
        let temp_dir = TempDir::new().unwrap();
        let uploads = temp_dir.path().join("uploads");
        std::fs::create_dir_all(&uploads).unwrap();
        let uploads_str = uploads.display().to_string();
        let root = temp_dir.path().to_path_buf();

        let mut mock_git = MockGitOps::new();
        mock_git
            .expect_add_files()
            .withf(move |_, files| files.len() == 2 && files[1] == uploads_str)
            .times(1)
            .returning(|_, _| Ok(mock_output(0, "", "")));
        mock_git
            .expect_commit()
            .returning(|_, _| Ok(mock_output(0, "", "")));
        mock_git
            .expect_pull_rebase()
            .returning(|_| Ok(mock_output(0, "", "")));
        mock_git.expect_push().returning(|_| Ok(mock_output(0, "", "")));

        let config = test_config(false, &uploads);
        let publisher = Publisher::new(mock_git, root, &config);

        let outcome = publisher.publish(Path::new("a.mdx"), "m");
        assert_eq!(outcome, PublishOutcome::Published);
    }

    #[test]
    fn test_publish_swallows_failures() {
        let temp_dir = TempDir::new().unwrap();

        let mut mock_git = MockGitOps::new();
        mock_git
            .expect_add_files()
            .returning(|_, _| Ok(mock_output(0, "", "")));
        mock_git.expect_commit().returning(|_, _| {
            Err(GitError::NonZeroExit {
                code: 1,
                output: "nothing to commit".to_string(),
            })
        });

        let config = test_config(false, &temp_dir.path().join("missing-uploads"));
        let publisher = Publisher::new(mock_git, temp_dir.path().to_path_buf(), &config);

        let outcome = publisher.publish(Path::new("a.mdx"), "m");
        assert!(matches!(outcome, PublishOutcome::Failed(_)));
    }
}
