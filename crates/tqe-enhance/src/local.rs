//! Local filesystem host
//!
//! A [`CompileContext`] over plain directories, used by the command line and
//! by tests. Messages are collected in a [`MessageLog`]; progress goes to
//! `tracing`.

use crate::diagnostics::{MessageLog, MessageSink, Severity};
use crate::error::EnhanceResult;
use crate::host::{CompileContext, FileHandle, FileLayer, ProgressIndicator, Project, ReadOutcome, WriteContext};
use parking_lot::{Mutex, RwLock};
use std::fs;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

/// File layer over `std::fs`
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl FileLayer for LocalFileSystem {
    fn find_file(&self, path: &Path) -> Option<FileHandle> {
        path.is_file().then(|| FileHandle::new(path))
    }

    fn read(&self, path: &Path) -> ReadOutcome {
        ReadOutcome::from_io(fs::read(path))
    }

    fn set_binary_content(&self, file: &FileHandle, bytes: &[u8]) -> io::Result<()> {
        fs::write(file.path(), bytes)
    }
}

/// Write context serializing write actions behind a mutex
#[derive(Debug, Default)]
pub struct LockedWriteContext {
    lock: Mutex<()>,
}

impl LockedWriteContext {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl WriteContext for LockedWriteContext {
    fn run_write_action(&self, action: &mut dyn FnMut() -> EnhanceResult<()>) -> EnhanceResult<()> {
        let _guard = self.lock.lock();
        let _span = tracing::debug_span!("write_action").entered();
        action()
    }
}

/// Progress indicator that traces and remembers its labels
#[derive(Debug, Default)]
pub struct TracingProgress {
    indeterminate: AtomicBool,
    text: RwLock<String>,
    text2: RwLock<String>,
}

impl TracingProgress {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_indeterminate(&self) -> bool {
        self.indeterminate.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn text(&self) -> String {
        self.text.read().clone()
    }

    #[must_use]
    pub fn text2(&self) -> String {
        self.text2.read().clone()
    }
}

impl ProgressIndicator for TracingProgress {
    fn set_indeterminate(&self, indeterminate: bool) {
        self.indeterminate.store(indeterminate, Ordering::Relaxed);
    }

    fn set_text(&self, text: &str) {
        tracing::info!(target: "tqe::progress", "{text}");
        *self.text.write() = text.to_string();
    }

    fn set_text2(&self, text: &str) {
        tracing::trace!(target: "tqe::progress", "{text}");
        *self.text2.write() = text.to_string();
    }
}

/// Compile context over a local project
pub struct LocalCompileContext {
    project: Project,
    files: Box<dyn FileLayer>,
    progress: Box<dyn ProgressIndicator>,
    write: LockedWriteContext,
    messages: MessageLog,
}

impl LocalCompileContext {
    /// Context with the local file system and a tracing progress indicator
    #[must_use]
    pub fn new(project: Project) -> Self {
        Self {
            project,
            files: Box::new(LocalFileSystem),
            progress: Box::new(TracingProgress::new()),
            write: LockedWriteContext::new(),
            messages: MessageLog::new(),
        }
    }

    /// With a different file layer
    #[must_use]
    pub fn with_file_layer(mut self, files: impl FileLayer + 'static) -> Self {
        self.files = Box::new(files);
        self
    }

    /// With a different progress indicator
    #[must_use]
    pub fn with_progress(mut self, progress: impl ProgressIndicator + 'static) -> Self {
        self.progress = Box::new(progress);
        self
    }

    /// Build output collected so far
    #[inline]
    #[must_use]
    pub fn messages(&self) -> &MessageLog {
        &self.messages
    }
}

impl std::fmt::Debug for LocalCompileContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalCompileContext")
            .field("project", &self.project.name())
            .field("messages", &self.messages)
            .finish_non_exhaustive()
    }
}

impl MessageSink for LocalCompileContext {
    fn add_message(&self, severity: Severity, text: &str) {
        self.messages.add_message(severity, text);
    }
}

impl CompileContext for LocalCompileContext {
    fn project(&self) -> &Project {
        &self.project
    }

    fn files(&self) -> &dyn FileLayer {
        self.files.as_ref()
    }

    fn progress(&self) -> &dyn ProgressIndicator {
        self.progress.as_ref()
    }

    fn write_context(&self) -> &dyn WriteContext {
        &self.write
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_layer_distinguishes_absent_and_directory() {
        let dir = tempfile::tempdir().unwrap();
        let fs_layer = LocalFileSystem;

        assert!(matches!(fs_layer.read(&dir.path().join("missing")), ReadOutcome::Absent));
        assert!(matches!(fs_layer.read(dir.path()), ReadOutcome::Unreadable(_)));
        assert!(fs_layer.find_file(dir.path()).is_none());
    }

    #[test]
    fn file_layer_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("A.class");
        fs::write(&path, [1, 2]).unwrap();

        let fs_layer = LocalFileSystem;
        let handle = fs_layer.find_file(&path).unwrap();
        fs_layer.set_binary_content(&handle, &[3, 4, 5]).unwrap();
        assert_eq!(fs::read(&path).unwrap(), vec![3, 4, 5]);
        assert!(matches!(fs_layer.read(&path), ReadOutcome::Bytes(bytes) if bytes == [3, 4, 5]));
    }

    #[test]
    fn write_context_runs_action() {
        let ctx = LockedWriteContext::new();
        let mut runs = 0;
        ctx.run_write_action(&mut || {
            runs += 1;
            Ok(())
        })
        .unwrap();
        assert_eq!(runs, 1);
    }

    #[test]
    fn progress_remembers_labels() {
        let progress = TracingProgress::new();
        progress.set_indeterminate(true);
        progress.set_text("working");
        progress.set_text2("com.acme.Order");
        assert!(progress.is_indeterminate());
        assert_eq!(progress.text(), "working");
        assert_eq!(progress.text2(), "com.acme.Order");
    }

    #[test]
    fn context_collects_messages() {
        let ctx = LocalCompileContext::new(Project::new("p", "/p"));
        ctx.add_message(Severity::Warning, "careful");
        assert_eq!(ctx.messages().count(Severity::Warning), 1);
        assert_eq!(ctx.project().name(), "p");
    }
}
