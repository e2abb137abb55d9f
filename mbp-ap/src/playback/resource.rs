//! Resource lifecycle controller
//!
//! Owns the single playback resource slot of a session and wraps the
//! platform resource provider 1:1. Every acquire is tagged with a fresh
//! generation; status events carrying any other generation are stale and
//! never reach the transport state machine.
//!
//! There is no hard cancellation of an in-flight acquire. Superseding one
//! marks it orphaned; when its load completes (or fails) the controller issues
//! exactly one release for it so the provider never leaks a handle.

use std::collections::HashSet;
use tracing::{debug, error, trace};

use mbp_common::TrackReference;

use super::events::{Generation, StatusEvent, StatusReporter, StatusSender};
use crate::error::{Error, Result};

/// Request to begin loading a track
#[derive(Debug)]
pub struct AcquireRequest {
    pub track: TrackReference,
    /// Start output as soon as the resource is loaded
    pub autoplay: bool,
    /// Status channel bound to this acquire's generation
    pub reporter: StatusReporter,
}

impl AcquireRequest {
    pub fn generation(&self) -> Generation {
        self.reporter.generation()
    }
}

/// Platform media/audio subsystem
///
/// All calls must return without blocking; results are reported through the
/// acquire's `StatusReporter`. `release` must accept generations whose acquire
/// is still in flight and tear the resource down once it exists.
pub trait ResourceProvider: Send + 'static {
    fn acquire(&mut self, request: AcquireRequest);
    fn set_playing(&mut self, generation: Generation, playing: bool);
    fn release(&mut self, generation: Generation);
}

impl<P: ResourceProvider + ?Sized> ResourceProvider for Box<P> {
    fn acquire(&mut self, request: AcquireRequest) {
        (**self).acquire(request)
    }

    fn set_playing(&mut self, generation: Generation, playing: bool) {
        (**self).set_playing(generation, playing)
    }

    fn release(&mut self, generation: Generation) {
        (**self).release(generation)
    }
}

/// Lifecycle state of the resource slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceSlot {
    None,
    Acquiring(Generation),
    Live(Generation),
    Releasing(Generation),
}

/// Owner of the session's single playback resource
pub struct ResourceController<P> {
    provider: P,
    status_tx: StatusSender,
    generation: Generation,
    slot: ResourceSlot,
    /// Superseded acquires still in flight; released once they complete
    orphaned: HashSet<Generation>,
    finished_delivered: bool,
}

impl<P: ResourceProvider> ResourceController<P> {
    pub fn new(provider: P, status_tx: StatusSender) -> Self {
        Self {
            provider,
            status_tx,
            generation: Generation::default(),
            slot: ResourceSlot::None,
            orphaned: HashSet::new(),
            finished_delivered: false,
        }
    }

    /// Current generation
    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn slot(&self) -> ResourceSlot {
        self.slot
    }

    /// Whether the current generation's resource is loaded
    pub fn is_live(&self) -> bool {
        self.slot == ResourceSlot::Live(self.generation)
    }

    /// Number of superseded acquires awaiting completion
    pub fn orphaned_count(&self) -> usize {
        self.orphaned.len()
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Begin loading `track`, superseding whatever the slot holds
    pub fn acquire(&mut self, track: TrackReference, autoplay: bool) -> Generation {
        self.retire();
        self.generation = self.generation.next();
        self.finished_delivered = false;

        let generation = self.generation;
        debug!("Acquiring {} for {}", generation, track.locator());
        self.provider.acquire(AcquireRequest {
            track,
            autoplay,
            reporter: StatusReporter::new(generation, self.status_tx.clone()),
        });
        self.slot = ResourceSlot::Acquiring(generation);
        generation
    }

    /// Tear down the live or in-flight resource
    ///
    /// Always bumps the generation so that every outstanding event becomes
    /// stale. Releasing an empty slot is a no-op that still succeeds.
    pub fn release(&mut self) -> Generation {
        self.retire();
        self.generation = self.generation.next();
        self.generation
    }

    /// Start or pause output on the live resource
    pub fn set_playing(&mut self, playing: bool) -> Result<()> {
        match self.slot {
            ResourceSlot::Live(generation) if generation == self.generation => {
                self.provider.set_playing(generation, playing);
                Ok(())
            }
            slot => {
                let msg = format!(
                    "set_playing({}) requires a live resource at {}, slot is {:?}",
                    playing, self.generation, slot
                );
                error!("{}", msg);
                Err(Error::PreconditionViolation(msg))
            }
        }
    }

    /// Filter a status event against the current generation
    ///
    /// Returns the event if the transport should act on it. Stale events are
    /// consumed here: they only ever trigger the deferred release of an
    /// orphaned acquire.
    pub fn accept(&mut self, event: StatusEvent) -> Option<StatusEvent> {
        let generation = event.generation;

        if generation != self.generation {
            if self.orphaned.contains(&generation) && (event.loaded || event.error.is_some()) {
                self.orphaned.remove(&generation);
                debug!("Superseded acquire {} completed, releasing it", generation);
                self.provider.release(generation);
            } else if self.slot == ResourceSlot::Releasing(generation) && event.is_release_ack() {
                self.slot = ResourceSlot::None;
            }
            trace!(
                "Discarding stale status event from {} (current {})",
                generation,
                self.generation
            );
            return None;
        }

        match self.slot {
            ResourceSlot::Acquiring(_) | ResourceSlot::Live(_) if event.error.is_some() => {
                debug!("Resource {} failed, releasing it", generation);
                self.provider.release(generation);
                self.slot = ResourceSlot::Releasing(generation);
                Some(event)
            }
            ResourceSlot::Acquiring(_) if event.loaded => {
                self.slot = ResourceSlot::Live(generation);
                Some(self.limit_finished(event))
            }
            ResourceSlot::Live(_) if event.loaded => Some(self.limit_finished(event)),
            ResourceSlot::Releasing(_) if event.is_release_ack() => {
                self.slot = ResourceSlot::None;
                None
            }
            _ => {
                trace!("Ignoring status event for {} in slot {:?}", generation, self.slot);
                None
            }
        }
    }

    /// Release everything, including orphaned acquires that never completed
    pub fn shutdown(&mut self) {
        self.release();
        for generation in self.orphaned.drain() {
            self.provider.release(generation);
        }
    }

    fn retire(&mut self) {
        match self.slot {
            ResourceSlot::None | ResourceSlot::Releasing(_) => {}
            ResourceSlot::Acquiring(generation) => {
                debug!("Superseding in-flight acquire {}", generation);
                self.orphaned.insert(generation);
                self.slot = ResourceSlot::None;
            }
            ResourceSlot::Live(generation) => {
                self.provider.release(generation);
                self.slot = ResourceSlot::Releasing(generation);
            }
        }
    }

    fn limit_finished(&mut self, mut event: StatusEvent) -> StatusEvent {
        if event.finished {
            if self.finished_delivered {
                event.finished = false;
            } else {
                self.finished_delivered = true;
            }
        }
        event
    }
}
