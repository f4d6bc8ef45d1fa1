//! Test doubles for the transcoder, media library and output storage.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use compacter_jobs::{
    CompressionHandler, CompressionJob, Error, MediaLibrary, MemoryStore, OutputStorage,
    ProgressSink, Result, ResultStore, SettingsStore, SourceDetails, TranscodeOutput,
    TranscodeRequest, Transcoder, VideoItem,
};

pub const OUTPUT_DIR: &str = "/storage/movies";

/// In-memory output volume.
pub struct FakeStorage {
    dir: PathBuf,
    available: Mutex<u64>,
    files: Mutex<HashMap<PathBuf, u64>>,
    removed: Mutex<Vec<PathBuf>>,
}

impl FakeStorage {
    pub fn new(available: u64) -> Self {
        Self::with_dir(OUTPUT_DIR, available)
    }

    pub fn with_dir(dir: &str, available: u64) -> Self {
        Self {
            dir: PathBuf::from(dir),
            available: Mutex::new(available),
            files: Mutex::new(HashMap::new()),
            removed: Mutex::new(Vec::new()),
        }
    }

    pub fn write(&self, path: &Path, size: u64) {
        self.files.lock().unwrap().insert(path.to_path_buf(), size);
    }

    pub fn files(&self) -> Vec<PathBuf> {
        self.files.lock().unwrap().keys().cloned().collect()
    }

    pub fn removed(&self) -> Vec<PathBuf> {
        self.removed.lock().unwrap().clone()
    }
}

#[async_trait]
impl OutputStorage for FakeStorage {
    fn output_dir(&self) -> PathBuf {
        self.dir.clone()
    }

    async fn available_bytes(&self) -> Result<u64> {
        Ok(*self.available.lock().unwrap())
    }

    async fn file_size(&self, path: &Path) -> Result<Option<u64>> {
        Ok(self.files.lock().unwrap().get(path).copied())
    }

    async fn remove_file(&self, path: &Path) -> Result<()> {
        self.files.lock().unwrap().remove(path);
        self.removed.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }
}

/// Scripted transcoder outcome for one call.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Write `size` bytes and succeed.
    Succeed(u64),
    /// Write a partial file, then fail with this message.
    Fail(String),
    /// Fail with a storage error (treated as transient).
    Transient(String),
}

/// Transcoder that writes into a [`FakeStorage`] and follows a script.
pub struct FakeTranscoder {
    storage: Arc<FakeStorage>,
    script: Mutex<VecDeque<Outcome>>,
    default: Outcome,
    requests: Mutex<Vec<TranscodeRequest>>,
}

impl FakeTranscoder {
    pub fn new(storage: Arc<FakeStorage>, default: Outcome) -> Self {
        Self {
            storage,
            script: Mutex::new(VecDeque::new()),
            default,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_script(self, script: Vec<Outcome>) -> Self {
        *self.script.lock().unwrap() = script.into();
        self
    }

    pub fn requests(&self) -> Vec<TranscodeRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transcoder for FakeTranscoder {
    async fn transcode(
        &self,
        request: &TranscodeRequest,
        progress: &ProgressSink<'_>,
    ) -> Result<TranscodeOutput> {
        self.requests.lock().unwrap().push(request.clone());
        let outcome = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.default.clone());

        progress(0);
        match outcome {
            Outcome::Succeed(size) => {
                progress(50);
                self.storage.write(&request.output_path, size);
                progress(100);
                Ok(TranscodeOutput {
                    output_path: request.output_path.clone(),
                    output_size_bytes: size,
                })
            }
            Outcome::Fail(message) => {
                self.storage.write(&request.output_path, 1);
                Err(Error::Execution(message))
            }
            Outcome::Transient(message) => Err(Error::Storage(message)),
        }
    }
}

/// Library that only answers probes, from a uri-keyed table.
#[derive(Default)]
pub struct FakeLibrary {
    details: Mutex<HashMap<String, SourceDetails>>,
    unavailable: Mutex<bool>,
}

impl FakeLibrary {
    pub fn insert(&self, uri: &str, details: SourceDetails) {
        self.details.lock().unwrap().insert(uri.to_string(), details);
    }

    /// Make every probe fail.
    pub fn set_unavailable(&self) {
        *self.unavailable.lock().unwrap() = true;
    }
}

#[async_trait]
impl MediaLibrary for FakeLibrary {
    async fn list_videos(&self, _limit: usize, _offset: usize) -> Result<Vec<VideoItem>> {
        Ok(Vec::new())
    }

    async fn source_details(&self, uri: &str) -> Result<Option<SourceDetails>> {
        if *self.unavailable.lock().unwrap() {
            return Err(Error::Storage("media index unavailable".to_string()));
        }
        Ok(self.details.lock().unwrap().get(uri).cloned())
    }
}

/// Handler wired to fakes, plus the pieces tests inspect.
pub struct Harness {
    pub storage: Arc<FakeStorage>,
    pub transcoder: Arc<FakeTranscoder>,
    pub library: Arc<FakeLibrary>,
    pub kv: Arc<MemoryStore>,
    pub results: ResultStore,
    pub settings: SettingsStore,
}

impl Harness {
    pub fn new(available: u64, default: Outcome) -> Self {
        Self::build(FakeStorage::new(available), default, Vec::new())
    }

    pub fn scripted(default: Outcome, script: Vec<Outcome>) -> Self {
        Self::build(FakeStorage::new(u64::MAX), default, script)
    }

    pub fn build(storage: FakeStorage, default: Outcome, script: Vec<Outcome>) -> Self {
        let storage = Arc::new(storage);
        let transcoder = Arc::new(FakeTranscoder::new(storage.clone(), default).with_script(script));
        let kv = Arc::new(MemoryStore::new());
        Self {
            storage,
            transcoder,
            library: Arc::new(FakeLibrary::default()),
            results: ResultStore::new(kv.clone()),
            settings: SettingsStore::new(kv.clone()),
            kv,
        }
    }

    pub fn handler(&self) -> CompressionHandler {
        CompressionHandler::new(
            self.transcoder.clone(),
            self.storage.clone(),
            self.results.clone(),
            self.settings.clone(),
        )
        .with_library(self.library.clone())
    }
}

pub fn job(id: &str) -> CompressionJob {
    CompressionJob {
        id: id.to_string(),
        input_uri: format!("content://media/external/video/media/{}", id),
        target_percentage: Some(50),
        preset: Default::default(),
        original_size_bytes: 100 * 1024 * 1024,
        original_name: format!("{}.mp4", id),
        duration_ms: 60_000,
        width: 1920,
        height: 1080,
        bitrate_bps: 0,
    }
}
