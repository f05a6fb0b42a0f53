//! Cross-process advisory locking keyed by document path.
//!
//! A writer owns a document while an adjacent marker file exists. The marker
//! is linked into place without clobbering, so two contenders can never both
//! succeed, and it records who created it and when. Markers older than the
//! configured stale threshold are presumed abandoned by a crashed holder and
//! reclaimed; reclaim and release move the marker aside before checking its
//! owner, so neither can delete a marker that a contender just created.
//!
//! Readers never take the lock; see [`crate::LockMode`].

mod marker;

use std::io;
use std::path::{Path, PathBuf};
use std::process;
use std::thread;
use std::time::{Duration, Instant, SystemTime};

use deckwright_config::LockTimings;
use thiserror::Error;
use tracing::{debug, info, warn};

use marker::Reclaim;
pub use marker::{LockRecord, marker_path};

/// Tracing target for lock events.
pub const LOCK_TARGET: &str = "deckwright::lock";

/// Errors raised while acquiring or releasing a document lock.
#[derive(Debug, Error)]
pub enum LockError {
    /// Another holder kept the lock for the whole timeout.
    #[error("document {path} is locked by {holder}; gave up after {waited:?}")]
    Contention {
        /// Document being locked.
        path: PathBuf,
        /// Owner recorded in the marker, or `unknown`.
        holder: String,
        /// Time spent waiting.
        waited: Duration,
    },

    /// The marker could not be created for a reason other than contention.
    #[error("failed to create lock marker {path}: {source}")]
    Create {
        /// Marker path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// A stale marker could not be removed.
    #[error("failed to reclaim stale lock marker {path}: {source}")]
    Reclaim {
        /// Marker path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// Removing the marker on release failed.
    #[error("failed to release lock marker {path}: {source}")]
    Release {
        /// Marker path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

impl LockError {
    /// Returns true for failures a caller may retry unchanged.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Contention { .. })
    }
}

/// Describes a stale marker that was forcibly reclaimed during acquisition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReclaimedLock {
    /// Owner recorded by the abandoned marker.
    pub previous_owner: String,
    /// Age of the abandoned marker when it was reclaimed.
    pub age: Duration,
}

/// Acquires document locks with the configured timings.
#[derive(Debug, Clone)]
pub struct FileLock {
    timings: LockTimings,
    owner_label: String,
}

impl FileLock {
    /// Creates a lock acquirer.
    #[must_use]
    pub fn new(timings: LockTimings) -> Self {
        Self {
            timings,
            owner_label: String::from("deckwright"),
        }
    }

    /// Sets the human-readable label recorded in markers.
    #[must_use]
    pub fn with_owner_label(mut self, label: impl Into<String>) -> Self {
        self.owner_label = label.into();
        self
    }

    /// Configured timings.
    #[must_use]
    pub const fn timings(&self) -> LockTimings {
        self.timings
    }

    /// Acquires the lock for `document`, waiting up to the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::Contention`] when a live holder keeps the lock for
    /// the whole timeout, and IO variants when the marker cannot be managed.
    pub fn acquire(&self, document: &Path) -> Result<LockHandle, LockError> {
        let marker = marker_path(document);
        let identity = self.owner_identity();
        let started = Instant::now();
        let mut reclaimed = None;
        let mut attempts = 0_u32;

        loop {
            attempts = attempts.saturating_add(1);
            let record = LockRecord::new(identity.clone(), process::id(), SystemTime::now());
            match marker::create(&marker, &record) {
                Ok(()) => {
                    info!(
                        target: LOCK_TARGET,
                        file = %marker.display(),
                        owner = %record.owner,
                        attempts,
                        "acquired document lock"
                    );
                    return Ok(LockHandle {
                        acquired_at: record.acquired_at(),
                        marker,
                        owner: record.owner,
                        reclaimed,
                        released: false,
                    });
                }
                Err(error) if error.kind() == io::ErrorKind::AlreadyExists => {}
                Err(source) => return Err(LockError::Create { path: marker, source }),
            }

            let Some(existing) = marker::inspect(&marker) else {
                // Released between our attempt and the inspection.
                continue;
            };

            if existing.age >= self.timings.stale_after {
                let outcome = marker::reclaim(
                    &marker,
                    &existing.owner,
                    &identity,
                    self.timings.stale_after,
                )
                .map_err(|source| LockError::Reclaim {
                    path: marker.clone(),
                    source,
                })?;
                match outcome {
                    Reclaim::Retired => {
                        warn!(
                            target: LOCK_TARGET,
                            file = %marker.display(),
                            previous_owner = %existing.owner,
                            age_ms = u64::try_from(existing.age.as_millis()).unwrap_or(u64::MAX),
                            "reclaimed stale document lock"
                        );
                        reclaimed = Some(ReclaimedLock {
                            previous_owner: existing.owner,
                            age: existing.age,
                        });
                        continue;
                    }
                    Reclaim::Superseded => continue,
                    Reclaim::InProgress => {}
                }
            }

            let waited = started.elapsed();
            if waited >= self.timings.timeout {
                info!(
                    target: LOCK_TARGET,
                    file = %marker.display(),
                    holder = %existing.owner,
                    "lock acquisition timed out"
                );
                return Err(LockError::Contention {
                    path: document.to_path_buf(),
                    holder: existing.owner,
                    waited,
                });
            }

            let remaining = self.timings.timeout.saturating_sub(waited);
            debug!(
                target: LOCK_TARGET,
                file = %marker.display(),
                holder = %existing.owner,
                "document lock contended; waiting"
            );
            thread::sleep(self.timings.poll_interval.min(remaining));
        }
    }

    fn owner_identity(&self) -> String {
        let nanos = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.subsec_nanos());
        format!(
            "{}:{}:{}:{nanos:09}",
            self.owner_label,
            process::id(),
            thread_tag()
        )
    }
}

fn thread_tag() -> String {
    // ThreadId's Debug output is the only stable rendering; strip the wrapper.
    let raw = format!("{:?}", thread::current().id());
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Ownership of one document's lock marker.
///
/// Released exactly once: explicitly through [`LockHandle::release`] or
/// implicitly when dropped.
#[derive(Debug)]
pub struct LockHandle {
    marker: PathBuf,
    owner: String,
    acquired_at: SystemTime,
    reclaimed: Option<ReclaimedLock>,
    released: bool,
}

impl LockHandle {
    /// Marker file guarding the document.
    #[must_use]
    pub fn marker(&self) -> &Path {
        &self.marker
    }

    /// Owner identity recorded in the marker.
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// When the lock was acquired.
    #[must_use]
    pub const fn acquired_at(&self) -> SystemTime {
        self.acquired_at
    }

    /// The abandoned lock this handle replaced, if any.
    #[must_use]
    pub const fn reclaimed(&self) -> Option<&ReclaimedLock> {
        self.reclaimed.as_ref()
    }

    /// True once the marker has been released.
    #[must_use]
    pub const fn is_released(&self) -> bool {
        self.released
    }

    /// Removes the marker. Subsequent calls are no-ops.
    ///
    /// A marker that no longer carries this handle's identity (because a
    /// contender reclaimed it as stale) is left in place.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::Release`] when the marker cannot be removed; the
    /// handle still counts as released so `Drop` does not retry.
    pub fn release(&mut self) -> Result<(), LockError> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        match marker::release_if_owned_by(&self.marker, &self.owner) {
            Ok(true) => {
                info!(
                    target: LOCK_TARGET,
                    file = %self.marker.display(),
                    "released document lock"
                );
                Ok(())
            }
            Ok(false) => {
                warn!(
                    target: LOCK_TARGET,
                    file = %self.marker.display(),
                    owner = %self.owner,
                    "lock marker no longer ours at release; leaving it in place"
                );
                Ok(())
            }
            Err(source) => Err(LockError::Release {
                path: self.marker.clone(),
                source,
            }),
        }
    }
}

impl Drop for LockHandle {
    fn drop(&mut self) {
        if let Err(error) = self.release() {
            warn!(
                target: LOCK_TARGET,
                error = %error,
                "failed to release document lock on drop"
            );
        }
    }
}

#[cfg(test)]
mod tests;
