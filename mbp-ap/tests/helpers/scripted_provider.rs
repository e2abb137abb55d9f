//! Scripted resource provider
//!
//! Records every call the session makes and keeps each acquire's reporter so
//! the test decides when (and whether) a load completes, fails or finishes.
//! Releases are acknowledged immediately, like a real provider would once its
//! resource is torn down.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use mbp_ap::playback::{AcquireRequest, Generation, ResourceProvider, StatusReporter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    Acquire(Generation, String),
    SetPlaying(Generation, bool),
    Release(Generation),
}

#[derive(Default)]
struct Shared {
    calls: Vec<ProviderCall>,
    reporters: HashMap<Generation, StatusReporter>,
}

/// Provider half, moved into the session
pub struct ScriptedProvider {
    shared: Arc<Mutex<Shared>>,
    auto_load_ms: Option<u64>,
}

/// Test half, used to inspect calls and drive status events
#[derive(Clone)]
pub struct ProviderControl {
    shared: Arc<Mutex<Shared>>,
}

impl ScriptedProvider {
    pub fn new() -> (Self, ProviderControl) {
        let shared = Arc::new(Mutex::new(Shared::default()));
        (
            Self {
                shared: shared.clone(),
                auto_load_ms: None,
            },
            ProviderControl { shared },
        )
    }

    /// Complete every acquire immediately with the given duration
    pub fn auto_load(mut self, duration_ms: u64) -> Self {
        self.auto_load_ms = Some(duration_ms);
        self
    }
}

impl ResourceProvider for ScriptedProvider {
    fn acquire(&mut self, request: AcquireRequest) {
        let generation = request.generation();
        let mut shared = self.shared.lock().unwrap();
        shared.calls.push(ProviderCall::Acquire(
            generation,
            request.track.locator().to_string(),
        ));
        if let Some(duration_ms) = self.auto_load_ms {
            request.reporter.loaded(duration_ms, request.autoplay);
        }
        shared.reporters.insert(generation, request.reporter);
    }

    fn set_playing(&mut self, generation: Generation, playing: bool) {
        self.shared
            .lock()
            .unwrap()
            .calls
            .push(ProviderCall::SetPlaying(generation, playing));
    }

    fn release(&mut self, generation: Generation) {
        let mut shared = self.shared.lock().unwrap();
        shared.calls.push(ProviderCall::Release(generation));
        if let Some(reporter) = shared.reporters.remove(&generation) {
            reporter.released();
        }
    }
}

impl ProviderControl {
    pub fn calls(&self) -> Vec<ProviderCall> {
        self.shared.lock().unwrap().calls.clone()
    }

    /// Generation and locator of the most recent acquire
    pub fn last_acquire(&self) -> (Generation, String) {
        self.calls()
            .into_iter()
            .rev()
            .find_map(|c| match c {
                ProviderCall::Acquire(g, locator) => Some((g, locator)),
                _ => None,
            })
            .expect("no acquire issued")
    }

    pub fn acquire_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, ProviderCall::Acquire(..)))
            .count()
    }

    pub fn release_count(&self, generation: Generation) -> usize {
        self.calls()
            .iter()
            .filter(|c| **c == ProviderCall::Release(generation))
            .count()
    }

    /// Resources acquired and not yet released
    pub fn outstanding(&self) -> usize {
        self.shared.lock().unwrap().reporters.len()
    }

    pub fn complete(&self, generation: Generation, duration_ms: u64) {
        self.with_reporter(generation, |r| {
            r.loaded(duration_ms, true);
        });
    }

    pub fn progress(&self, generation: Generation, position_ms: u64, duration_ms: u64) {
        self.with_reporter(generation, |r| {
            r.progress(position_ms, duration_ms, true);
        });
    }

    pub fn finish(&self, generation: Generation, duration_ms: u64) {
        self.with_reporter(generation, |r| {
            r.finished(duration_ms);
        });
    }

    pub fn fail(&self, generation: Generation, error: &str) {
        self.with_reporter(generation, |r| {
            r.failed(error);
        });
    }

    fn with_reporter(&self, generation: Generation, f: impl FnOnce(&StatusReporter)) {
        let shared = self.shared.lock().unwrap();
        let reporter = shared
            .reporters
            .get(&generation)
            .unwrap_or_else(|| panic!("no outstanding resource for {}", generation));
        f(reporter);
    }
}
