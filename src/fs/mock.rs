// src/fs/mock.rs

use super::{DirEntry, EntryKind, FileSystem};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::ffi::OsString;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Same bound as Linux `MAXSYMLINKS`.
const MAX_SYMLINK_HOPS: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockEntry {
    File,
    Dir,
    Symlink(PathBuf),
}

#[derive(Debug, Default)]
struct MockState {
    nodes: BTreeMap<PathBuf, MockEntry>,
    denied: BTreeSet<PathBuf>,
}

/// In-memory directory tree with symbolic links.
///
/// Paths are absolute; trailing slashes are ignored. Clones share the same
/// tree, so a test can keep one handle while the watcher owns another.
#[derive(Debug, Clone)]
pub struct MockFileSystem {
    state: Arc<Mutex<MockState>>,
}

impl Default for MockFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFileSystem {
    pub fn new() -> Self {
        let mut state = MockState::default();
        // Ensure root exists
        state.nodes.insert(PathBuf::from("/"), MockEntry::Dir);

        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Create a directory and any missing parents.
    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let path = normalize(path.as_ref());
        let mut state = self.state.lock().unwrap();
        ensure_dirs(&mut state.nodes, &path);
    }

    pub fn add_file(&self, path: impl AsRef<Path>) {
        self.insert(path.as_ref(), MockEntry::File);
    }

    /// Create `link` pointing at `target` (absolute or relative to the link's
    /// directory). The target does not need to exist.
    pub fn add_symlink(&self, link: impl AsRef<Path>, target: impl AsRef<Path>) {
        self.insert(link.as_ref(), MockEntry::Symlink(target.as_ref().to_path_buf()));
    }

    /// Remove `path` and, for directories, everything below it.
    pub fn remove(&self, path: impl AsRef<Path>) {
        let path = normalize(path.as_ref());
        let mut state = self.state.lock().unwrap();
        state
            .nodes
            .retain(|p, _| p == Path::new("/") || !p.starts_with(&path));
    }

    /// Move `from` (and its subtree) to `to`.
    pub fn rename(&self, from: impl AsRef<Path>, to: impl AsRef<Path>) {
        let from = normalize(from.as_ref());
        let to = normalize(to.as_ref());
        let mut state = self.state.lock().unwrap();

        let moved: Vec<(PathBuf, MockEntry)> = state
            .nodes
            .iter()
            .filter(|(p, _)| p.starts_with(&from))
            .map(|(p, e)| (p.clone(), e.clone()))
            .collect();

        if let Some(parent) = to.parent() {
            ensure_dirs(&mut state.nodes, parent);
        }
        for (old, entry) in moved {
            state.nodes.remove(&old);
            let rest = old.strip_prefix(&from).unwrap_or(Path::new(""));
            let new = if rest.as_os_str().is_empty() {
                to.clone()
            } else {
                to.join(rest)
            };
            state.nodes.insert(new, entry);
        }
    }

    /// Make `read_dir` on this directory fail with `PermissionDenied`.
    pub fn deny(&self, path: impl AsRef<Path>) {
        let path = normalize(path.as_ref());
        self.state.lock().unwrap().denied.insert(path);
    }

    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        let path = normalize(path.as_ref());
        self.state.lock().unwrap().nodes.contains_key(&path)
    }

    fn insert(&self, path: &Path, entry: MockEntry) {
        let path = normalize(path);
        let mut state = self.state.lock().unwrap();
        if let Some(parent) = path.parent() {
            ensure_dirs(&mut state.nodes, parent);
        }
        state.nodes.insert(path, entry);
    }
}

impl FileSystem for MockFileSystem {
    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let state = self.state.lock().unwrap();
        let dir = resolve(&state.nodes, path)?;

        if state.denied.contains(&dir) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("permission denied: {}", dir.display()),
            ));
        }
        match state.nodes.get(&dir) {
            Some(MockEntry::Dir) => {}
            _ => {
                return Err(io::Error::new(
                    io::ErrorKind::NotADirectory,
                    format!("not a directory: {}", dir.display()),
                ));
            }
        }

        let children = state
            .nodes
            .iter()
            .filter(|(p, _)| p.parent() == Some(dir.as_path()))
            .filter_map(|(p, entry)| {
                let name = p.file_name()?.to_string_lossy().into_owned();
                let kind = match entry {
                    MockEntry::Dir => EntryKind::Directory,
                    MockEntry::Symlink(_) => EntryKind::Symlink,
                    MockEntry::File => EntryKind::Other,
                };
                Some(DirEntry { name, kind })
            })
            .collect();
        Ok(children)
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        let state = self.state.lock().unwrap();
        resolve(&state.nodes, path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        let state = self.state.lock().unwrap();
        match resolve(&state.nodes, path) {
            Ok(real) => matches!(state.nodes.get(&real), Some(MockEntry::Dir)),
            Err(_) => false,
        }
    }
}

fn normalize(path: &Path) -> PathBuf {
    path.components().collect()
}

fn ensure_dirs(nodes: &mut BTreeMap<PathBuf, MockEntry>, path: &Path) {
    for ancestor in path.ancestors() {
        if ancestor.as_os_str().is_empty() {
            continue;
        }
        nodes
            .entry(ancestor.to_path_buf())
            .or_insert(MockEntry::Dir);
    }
}

enum Step {
    Parent,
    Name(OsString),
}

fn steps(path: &Path) -> VecDeque<Step> {
    path.components()
        .filter_map(|c| match c {
            Component::ParentDir => Some(Step::Parent),
            Component::Normal(name) => Some(Step::Name(name.to_os_string())),
            _ => None,
        })
        .collect()
}

/// Component-wise resolution, expanding symlinks the way `realpath(3)` does.
fn resolve(nodes: &BTreeMap<PathBuf, MockEntry>, path: &Path) -> io::Result<PathBuf> {
    if !path.is_absolute() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("mock paths must be absolute: {}", path.display()),
        ));
    }

    let mut pending = steps(path);
    let mut resolved = PathBuf::from("/");
    let mut hops = 0;

    while let Some(step) = pending.pop_front() {
        let name = match step {
            Step::Parent => {
                resolved.pop();
                continue;
            }
            Step::Name(name) => name,
        };

        let candidate = resolved.join(&name);
        match nodes.get(&candidate) {
            None => {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no such file or directory: {}", candidate.display()),
                ));
            }
            Some(MockEntry::Symlink(target)) => {
                hops += 1;
                if hops > MAX_SYMLINK_HOPS {
                    return Err(io::Error::other(format!(
                        "too many levels of symbolic links: {}",
                        path.display()
                    )));
                }
                let target = if target.is_absolute() {
                    target.clone()
                } else {
                    resolved.join(target)
                };
                let mut next = steps(&target);
                next.extend(pending.drain(..));
                pending = next;
                resolved = PathBuf::from("/");
            }
            Some(MockEntry::File) if !pending.is_empty() => {
                return Err(io::Error::new(
                    io::ErrorKind::NotADirectory,
                    format!("not a directory: {}", candidate.display()),
                ));
            }
            Some(_) => resolved = candidate,
        }
    }

    Ok(resolved)
}
