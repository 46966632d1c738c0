//! libgit2-backed access to the history of the mined repository.

pub mod commit_window;

pub use commit_window::{modified_functions, CommitWindow, HunkHeader, LineRange};

use anyhow::{Context as _, Result};
use git2::{Commit, Diff, Repository, Sort};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Wrapper around a repository's working directory.
///
/// git2::Repository is not Sync, so a fresh handle is opened per query.
pub struct CommitHistory {
    repo_path: PathBuf,
}

impl CommitHistory {
    /// Open a repository, discovering the root from any subdirectory
    pub fn open(path: &Path) -> Result<Self> {
        let repo = Repository::discover(path)
            .with_context(|| format!("Failed to discover git repository at {}", path.display()))?;

        let repo_path = repo
            .workdir()
            .ok_or_else(|| anyhow::anyhow!("Bare repositories are not supported"))?
            .to_path_buf();

        Ok(Self { repo_path })
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    fn open_repo(&self) -> Result<Repository> {
        Repository::open(&self.repo_path)
            .with_context(|| format!("Failed to open repository at {}", self.repo_path.display()))
    }

    /// Python files touched by commits in the window
    pub fn changed_files(&self, window: &CommitWindow) -> Result<BTreeSet<String>> {
        let repo = self.open_repo()?;
        let mut files = BTreeSet::new();
        for commit in commits_in_window(&repo, window)? {
            let diff = diff_against_first_parent(&repo, &commit)?;
            for delta in diff.deltas() {
                if let Some(path) = python_path(delta.new_file().path()) {
                    files.insert(path);
                }
            }
        }
        Ok(files)
    }

    /// Changed line ranges per Python file over all commits in the window.
    ///
    /// Ranges are taken from the new side of each hunk and are not merged.
    pub fn changed_line_ranges(
        &self,
        window: &CommitWindow,
    ) -> Result<BTreeMap<String, Vec<LineRange>>> {
        let repo = self.open_repo()?;
        let mut ranges: BTreeMap<String, Vec<LineRange>> = BTreeMap::new();

        for commit in commits_in_window(&repo, window)? {
            let diff = diff_against_first_parent(&repo, &commit)?;
            diff.foreach(
                &mut |_, _| true,
                None,
                Some(&mut |delta, hunk| {
                    let Some(path) = python_path(delta.new_file().path()) else {
                        return true;
                    };
                    let header = String::from_utf8_lossy(hunk.header());
                    match HunkHeader::parse(&header) {
                        Some(parsed) => {
                            if let Some(range) = parsed.new_range() {
                                ranges.entry(path).or_default().push(range);
                            }
                        }
                        None => log::warn!(
                            "Skipping malformed hunk header in {}: {}",
                            path,
                            header.trim_end()
                        ),
                    }
                    true
                }),
                None,
            )
            .with_context(|| format!("Failed to walk diff of commit {}", commit.id()))?;
        }

        log::debug!(
            "Found {} changed Python files between {} and {}",
            ranges.len(),
            window.since,
            window.until
        );
        Ok(ranges)
    }
}

fn commits_in_window<'r>(repo: &'r Repository, window: &CommitWindow) -> Result<Vec<Commit<'r>>> {
    let mut revwalk = repo.revwalk()?;
    revwalk.push_head().context("Repository has no HEAD commit")?;
    revwalk.set_sorting(Sort::TIME)?;

    // Merges carry no changes of their own
    Ok(revwalk
        .filter_map(|oid| oid.ok())
        .filter_map(|oid| repo.find_commit(oid).ok())
        .filter(|commit| commit.parent_count() <= 1)
        .filter(|commit| window.contains(commit.time().seconds()))
        .collect())
}

/// Root commits are diffed against the empty tree
fn diff_against_first_parent<'r>(repo: &'r Repository, commit: &Commit) -> Result<Diff<'r>> {
    let parent_tree = match commit.parents().next() {
        Some(parent) => Some(
            parent
                .tree()
                .with_context(|| format!("Failed to load parent tree of commit {}", commit.id()))?,
        ),
        None => None,
    };
    let tree = commit.tree()?;
    repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)
        .with_context(|| format!("Failed to diff commit {}", commit.id()))
}

fn python_path(path: Option<&Path>) -> Option<String> {
    let path = path?;
    if path.extension().is_some_and(|ext| ext == "py") {
        Some(path.to_string_lossy().replace('\\', "/"))
    } else {
        None
    }
}
