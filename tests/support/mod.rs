//! Shared helpers for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use buildroute::{
    CompileOutcome, CompileRequest, CompilerAdapter, FileSystem, OutputTarget, ProgressEvent,
    ProgressHandler, TokenSource,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Deterministic tokens: `t0`, `t1`, ...
#[derive(Default)]
pub struct SeqTokens(AtomicUsize);

impl TokenSource for SeqTokens {
    fn next_token(&self) -> String {
        format!("t{}", self.0.fetch_add(1, Ordering::SeqCst))
    }
}

#[derive(Default)]
pub struct RecordingHandler {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingHandler {
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Sum of tick amounts reported for one build
    pub fn ticked(&self, name: &str) -> u32 {
        self.events()
            .iter()
            .filter_map(|e| match e {
                ProgressEvent::Tick {
                    name: n, amount, ..
                } if n == name => Some(*amount),
                _ => None,
            })
            .sum()
    }
}

impl ProgressHandler for RecordingHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Compiler that writes through a [`FileSystem`]:
/// directory targets get one `<input file name>.js` per input, file targets get
/// the inputs' contents joined by newlines.
pub struct WritingCompiler {
    fs: Arc<dyn FileSystem>,
    requests: Mutex<Vec<CompileRequest>>,
}

impl WritingCompiler {
    pub fn new(fs: Arc<dyn FileSystem>) -> Arc<Self> {
        Arc::new(Self {
            fs,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn files_of_call(&self, index: usize) -> Vec<PathBuf> {
        self.requests.lock().unwrap()[index].files.clone()
    }

    pub fn options_of_call(&self, index: usize) -> serde_json::Map<String, serde_json::Value> {
        self.requests.lock().unwrap()[index].options.clone()
    }
}

pub fn write_target(fs: &dyn FileSystem, request: &CompileRequest) -> CompileOutcome {
    match &request.output {
        OutputTarget::Directory(dir) => {
            for file in &request.files {
                let name = file.file_name().unwrap().to_string_lossy().to_string();
                let generated = dir.join(format!("{}.js", name));
                fs.write_atomic(&generated, &format!("// compiled from {}\n", name))
                    .unwrap();
            }
            CompileOutcome::success(dir.clone(), None)
        }
        OutputTarget::File(path) => {
            let content = request
                .files
                .iter()
                .map(|f| fs.read_to_string(f).unwrap_or_default())
                .collect::<Vec<_>>()
                .join("\n");
            fs.write_atomic(path, &content).unwrap();
            CompileOutcome::success(path.clone(), Some(content))
        }
    }
}

#[async_trait]
impl CompilerAdapter for WritingCompiler {
    fn name(&self) -> &str {
        "writing"
    }

    async fn compile(&self, request: CompileRequest) -> CompileOutcome {
        self.requests.lock().unwrap().push(request.clone());
        write_target(self.fs.as_ref(), &request)
    }
}

/// Compiler that signals `entered` when invoked and then waits for `release`
/// before writing its output
pub struct GatedCompiler {
    fs: Arc<dyn FileSystem>,
    pub entered: Notify,
    pub release: Notify,
    calls: AtomicUsize,
}

impl GatedCompiler {
    pub fn new(fs: Arc<dyn FileSystem>) -> Arc<Self> {
        Arc::new(Self {
            fs,
            entered: Notify::new(),
            release: Notify::new(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompilerAdapter for GatedCompiler {
    fn name(&self) -> &str {
        "gated"
    }

    async fn compile(&self, request: CompileRequest) -> CompileOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        self.release.notified().await;
        write_target(self.fs.as_ref(), &request)
    }
}

pub fn write(root: &Path, relative: &str, content: &str) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
}

/// Every regular file below `dir`, sorted
pub fn files_under(dir: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    if !dir.exists() {
        return found;
    }
    let mut stack = vec![dir.to_path_buf()];
    while let Some(current) = stack.pop() {
        for entry in std::fs::read_dir(&current).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                stack.push(path);
            } else {
                found.push(path);
            }
        }
    }
    found.sort();
    found
}
