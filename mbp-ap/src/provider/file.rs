//! Local file resource provider
//!
//! Each acquire spawns a worker thread that opens the file, probes it with
//! symphonia and then decodes packet by packet, paced against wall-clock time.
//! There is no output device: the worker acts as a headless sink whose clock
//! drives position, end-of-track and decode-error reporting.
//!
//! Worker threads are controlled over a std channel. Release is honoured at
//! any point, including while the file is still being probed.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::units::TimeBase;
use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::playback::events::{Generation, StatusReporter};
use crate::playback::resource::{AcquireRequest, ResourceProvider};

/// Default interval between progress reports
pub const DEFAULT_POSITION_INTERVAL: Duration = Duration::from_millis(250);

enum WorkerCommand {
    SetPlaying(bool),
    Release,
}

/// Provider for `file://` URIs and plain filesystem paths
pub struct FileProvider {
    position_interval: Duration,
    workers: HashMap<Generation, Sender<WorkerCommand>>,
}

impl FileProvider {
    pub fn new(position_interval: Duration) -> Self {
        Self {
            position_interval,
            workers: HashMap::new(),
        }
    }

    /// Number of resources not yet released
    pub fn active_resources(&self) -> usize {
        self.workers.len()
    }
}

impl Default for FileProvider {
    fn default() -> Self {
        Self::new(DEFAULT_POSITION_INTERVAL)
    }
}

impl ResourceProvider for FileProvider {
    fn acquire(&mut self, request: AcquireRequest) {
        let generation = request.generation();
        let AcquireRequest {
            track,
            autoplay,
            reporter,
        } = request;

        let path = match resolve_locator(track.locator()) {
            Ok(path) => path,
            Err(e) => {
                reporter.failed(e.to_string());
                return;
            }
        };

        let (tx, rx) = mpsc::channel();
        let interval = self.position_interval;
        let worker_reporter = reporter.clone();
        let spawned = thread::Builder::new()
            .name(format!("mbp-resource-{}", generation.value()))
            .spawn(move || run_worker(path, worker_reporter, autoplay, interval, rx));

        match spawned {
            Ok(_) => {
                self.workers.insert(generation, tx);
            }
            Err(e) => {
                reporter.failed(format!("Failed to start resource worker: {}", e));
            }
        }
    }

    fn set_playing(&mut self, generation: Generation, playing: bool) {
        match self.workers.get(&generation) {
            Some(tx) => {
                if tx.send(WorkerCommand::SetPlaying(playing)).is_err() {
                    debug!("Resource {} worker already exited", generation);
                }
            }
            None => warn!("set_playing for unknown resource {}", generation),
        }
    }

    fn release(&mut self, generation: Generation) {
        if let Some(tx) = self.workers.remove(&generation) {
            // Worker may already have exited after a failure
            let _ = tx.send(WorkerCommand::Release);
        }
    }
}

impl Drop for FileProvider {
    fn drop(&mut self) {
        for (_, tx) in self.workers.drain() {
            let _ = tx.send(WorkerCommand::Release);
        }
    }
}

/// Map a track locator to a local path
///
/// Accepts `file:` URIs and plain paths. Any other URI scheme, or a `file:`
/// URI naming a remote host, is rejected. Query and fragment are ignored.
pub fn resolve_locator(locator: &str) -> Result<PathBuf> {
    if locator.is_empty() {
        return Err(Error::AcquireFailed("Empty locator".to_string()));
    }

    match Url::parse(locator) {
        Ok(url) if url.scheme() == "file" => url.to_file_path().map_err(|_| {
            Error::AcquireFailed(format!("Not a local file URI: {}", locator))
        }),
        // Single-letter "schemes" are drive letters (C:\music\a.mp3)
        Ok(url) if url.scheme().len() > 1 => Err(Error::AcquireFailed(format!(
            "Unsupported locator scheme '{}': {}",
            url.scheme(),
            locator
        ))),
        _ => Ok(PathBuf::from(locator)),
    }
}

/// Wall-clock playback position that stops while paused
#[derive(Debug)]
struct PlaybackClock {
    running_since: Option<Instant>,
    accumulated: Duration,
}

impl PlaybackClock {
    fn new(running: bool) -> Self {
        Self {
            running_since: running.then(Instant::now),
            accumulated: Duration::ZERO,
        }
    }

    fn resume(&mut self) {
        if self.running_since.is_none() {
            self.running_since = Some(Instant::now());
        }
    }

    fn pause(&mut self) {
        if let Some(since) = self.running_since.take() {
            self.accumulated += since.elapsed();
        }
    }

    fn elapsed(&self) -> Duration {
        self.accumulated
            + self
                .running_since
                .map(|since| since.elapsed())
                .unwrap_or(Duration::ZERO)
    }
}

/// Probed file with an open decoder
struct DecodedSource {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    time_base: Option<TimeBase>,
    sample_rate: u32,
    duration_ms: u64,
}

impl DecodedSource {
    fn open(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| {
            Error::AcquireFailed(format!("Failed to open {}: {}", path.display(), e))
        })?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|e| Error::AcquireFailed(format!("Failed to probe {}: {}", path.display(), e)))?;
        let format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| Error::AcquireFailed(format!("No audio track in {}", path.display())))?;

        let params = &track.codec_params;
        let track_id = track.id;
        let time_base = params.time_base;
        let sample_rate = params
            .sample_rate
            .ok_or_else(|| Error::AcquireFailed("Sample rate not found".to_string()))?;

        let duration_ms = match (params.n_frames, time_base) {
            (Some(frames), Some(tb)) => time_to_ms(tb, frames),
            (Some(frames), None) => frames * 1000 / sample_rate as u64,
            _ => 0,
        };

        let decoder = symphonia::default::get_codecs()
            .make(params, &DecoderOptions::default())
            .map_err(|e| Error::AcquireFailed(format!("Unsupported codec: {}", e)))?;

        debug!(
            "Opened {}: sample_rate={}, duration={}ms",
            path.display(),
            sample_rate,
            duration_ms
        );

        Ok(Self {
            format,
            decoder,
            track_id,
            time_base,
            sample_rate,
            duration_ms,
        })
    }

    fn ts_to_ms(&self, ts: u64) -> u64 {
        match self.time_base {
            Some(tb) => time_to_ms(tb, ts),
            None => ts * 1000 / self.sample_rate as u64,
        }
    }
}

/// Packet stream paced by a resource worker
trait PacketSource {
    fn duration_ms(&self) -> u64;

    /// Decode the next packet
    ///
    /// Returns the end timestamp of the decoded audio in milliseconds, or
    /// `None` at end of stream.
    fn decode_next(&mut self) -> Result<Option<u64>>;
}

impl PacketSource for DecodedSource {
    fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    fn decode_next(&mut self) -> Result<Option<u64>> {
        loop {
            let packet = match self.format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    return Ok(None);
                }
                Err(SymphoniaError::ResetRequired) => return Ok(None),
                Err(e) => return Err(Error::Decode(e.to_string())),
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            match self.decoder.decode(&packet) {
                Ok(_) => {
                    let end_ts = packet.ts() + packet.dur();
                    return Ok(Some(self.ts_to_ms(end_ts)));
                }
                Err(SymphoniaError::DecodeError(e)) => {
                    warn!("Decode error (skipping): {}", e);
                }
                Err(e) => return Err(Error::Decode(e.to_string())),
            }
        }
    }
}

fn time_to_ms(time_base: TimeBase, ts: u64) -> u64 {
    let time = time_base.calc_time(ts);
    time.seconds * 1000 + (time.frac * 1000.0) as u64
}

/// Resource worker: load, then pace decoding until finished or released
fn run_worker(
    path: PathBuf,
    reporter: StatusReporter,
    autoplay: bool,
    interval: Duration,
    control: Receiver<WorkerCommand>,
) {
    let generation = reporter.generation();

    match DecodedSource::open(&path) {
        Ok(source) => drive(source, &reporter, autoplay, interval, &control),
        Err(e) => {
            warn!("Acquire {} failed: {}", generation, e);
            reporter.failed(e.to_string());
        }
    }
}

/// Report the source as loaded, then decode it in step with the playback clock
fn drive<S: PacketSource>(
    mut source: S,
    reporter: &StatusReporter,
    autoplay: bool,
    interval: Duration,
    control: &Receiver<WorkerCommand>,
) {
    let generation = reporter.generation();

    // Released while probing
    if let Ok(WorkerCommand::Release) = control.try_recv() {
        reporter.released();
        return;
    }

    let duration_ms = source.duration_ms();
    let mut playing = autoplay;
    let mut finished = false;
    let mut position_ms = 0u64;
    let mut clock = PlaybackClock::new(playing);
    let mut last_report = Instant::now();

    if !reporter.loaded(duration_ms, playing) {
        return;
    }

    loop {
        // Block while idle; otherwise wait until the clock reaches the decoded position
        let command = if !playing || finished {
            match control.recv() {
                Ok(command) => Some(command),
                Err(_) => return,
            }
        } else {
            let ahead = Duration::from_millis(position_ms).saturating_sub(clock.elapsed());
            if ahead.is_zero() {
                match control.try_recv() {
                    Ok(command) => Some(command),
                    Err(TryRecvError::Empty) => None,
                    Err(TryRecvError::Disconnected) => return,
                }
            } else {
                match control.recv_timeout(ahead) {
                    Ok(command) => Some(command),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => return,
                }
            }
        };

        match command {
            Some(WorkerCommand::Release) => {
                debug!("Resource {} released", generation);
                reporter.released();
                return;
            }
            Some(WorkerCommand::SetPlaying(requested)) => {
                if finished || requested == playing {
                    continue;
                }
                playing = requested;
                if playing {
                    clock.resume();
                } else {
                    clock.pause();
                }
                if !reporter.progress(position_ms, duration_ms, playing) {
                    return;
                }
                continue;
            }
            None => {}
        }

        match source.decode_next() {
            Ok(Some(end_ms)) => {
                position_ms = end_ms;
            }
            Ok(None) => {
                finished = true;
                clock.pause();
                if !reporter.finished(duration_ms.max(position_ms)) {
                    return;
                }
                continue;
            }
            Err(e) => {
                warn!("Playback of {} failed: {}", generation, e);
                reporter.failed(e.to_string());
                return;
            }
        }

        if last_report.elapsed() >= interval {
            last_report = Instant::now();
            if !reporter.progress(position_ms, duration_ms, true) {
                return;
            }
        }
    }
}
