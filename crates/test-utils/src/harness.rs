use std::path::Path;

use treewatch::engine::{Disposition, EventDispatcher};
use treewatch::errors::Result;
use treewatch::fs::mock::MockFileSystem;
use treewatch::kernel::fake::FakeKernel;
use treewatch::kernel::{RawNotification, WatchId};
use treewatch::types::EventMask;
use treewatch::watch::path::canonicalize;
use treewatch::watch::{WatchOptions, Watcher};

use crate::sink::RecordingSink;

/// Couples a mock filesystem, a fake kernel, a watcher and a dispatcher.
///
/// Each mutation helper changes the mock filesystem first and then feeds the
/// dispatcher the record the kernel would have produced on the parent
/// directory's watch. Mutations in unwatched directories produce nothing.
pub struct Harness {
    pub fs: MockFileSystem,
    pub kernel: FakeKernel,
    pub watcher: Watcher<FakeKernel, MockFileSystem>,
    pub dispatcher: EventDispatcher<RecordingSink>,
    pub sink: RecordingSink,
}

impl Harness {
    pub fn new(fs: MockFileSystem, options: WatchOptions) -> Result<Self> {
        Self::with_kernel(fs, FakeKernel::new(), options)
    }

    pub fn with_kernel(fs: MockFileSystem, kernel: FakeKernel, options: WatchOptions) -> Result<Self> {
        let watcher = Watcher::initialize(options, kernel.clone(), fs.clone())?;
        let sink = RecordingSink::new();
        Ok(Self {
            fs,
            kernel,
            watcher,
            dispatcher: EventDispatcher::new(sink.clone()),
            sink,
        })
    }

    pub fn mkdir(&mut self, path: &str) -> Vec<Disposition> {
        self.fs.add_dir(path);
        self.emit(path, EventMask::CREATE, true)
    }

    pub fn touch(&mut self, path: &str) -> Vec<Disposition> {
        self.fs.add_file(path);
        self.emit(path, EventMask::CREATE, false)
    }

    pub fn symlink(&mut self, link: &str, target: &str) -> Vec<Disposition> {
        self.fs.add_symlink(link, target);
        self.emit(link, EventMask::CREATE, false)
    }

    pub fn rmdir(&mut self, path: &str) -> Vec<Disposition> {
        self.fs.remove(path);
        self.emit(path, EventMask::DELETE, true)
    }

    pub fn unlink(&mut self, path: &str) -> Vec<Disposition> {
        self.fs.remove(path);
        self.emit(path, EventMask::DELETE, false)
    }

    /// Rename, reporting `moved_from` on the source directory and `moved_to`
    /// on the destination directory (when they are watched).
    pub fn rename(&mut self, from: &str, to: &str, is_dir: bool) -> Vec<Disposition> {
        // The source parent must be resolved before the move.
        let from_wd = self.parent_watch(from);
        self.fs.rename(from, to);
        let to_wd = self.parent_watch(to);

        let mut out = Vec::new();
        if let Some((wd, name)) = from_wd {
            out.extend(self.dispatch_record(wd, name, EventMask::MOVED_FROM, is_dir));
        }
        if let Some((wd, name)) = to_wd {
            out.extend(self.dispatch_record(wd, name, EventMask::MOVED_TO, is_dir));
        }
        out
    }

    /// Dispatch the record the kernel would produce for `path` in its parent.
    pub fn emit(&mut self, path: &str, mask: EventMask, is_dir: bool) -> Vec<Disposition> {
        match self.parent_watch(path) {
            Some((wd, name)) => self.dispatch_record(wd, name, mask, is_dir),
            None => Vec::new(),
        }
    }

    pub fn dispatch_record(
        &mut self,
        watch_id: WatchId,
        name: String,
        mask: EventMask,
        is_dir: bool,
    ) -> Vec<Disposition> {
        let mask = if is_dir { mask | EventMask::ISDIR } else { mask };
        let record = RawNotification {
            watch_id,
            mask,
            cookie: 0,
            name,
        };
        self.dispatcher
            .dispatch(&mut self.watcher, &record.encode())
            .expect("dispatch of a well-formed record")
    }

    /// Watched paths in lexical order.
    pub fn paths(&self) -> Vec<String> {
        self.watcher.table().paths()
    }

    pub fn is_watched(&self, path: &str) -> bool {
        self.watcher.table().lookup_by_path(path).is_some()
    }

    /// Links attached to the entry at `path`.
    pub fn links_of(&self, path: &str) -> Vec<String> {
        self.watcher
            .table()
            .lookup_by_path(path)
            .and_then(|id| self.watcher.table().get(id))
            .map(|e| e.symlinks().iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn watch_id_of(&self, dir: &str) -> Option<WatchId> {
        let id = self.watcher.table().lookup_by_path(dir)?;
        self.watcher.table().get(id).map(|e| e.watch_id())
    }

    fn parent_watch(&self, path: &str) -> Option<(WatchId, String)> {
        let trimmed = path.trim_end_matches('/');
        let (parent, name) = trimmed.rsplit_once('/')?;
        let parent = if parent.is_empty() { "/" } else { parent };
        let parent = canonicalize(&self.fs, Path::new(parent)).ok()?;
        Some((self.watch_id_of(&parent)?, name.to_string()))
    }
}
