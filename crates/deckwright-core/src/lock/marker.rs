//! On-disk lock marker format and inspection.

use std::ffi::{OsStr, OsString};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tempfile::Builder;

const UNKNOWN_OWNER: &str = "unknown";

/// Contents of a lock marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRecord {
    /// Identity of the holder.
    pub owner: String,
    /// Process id of the holder.
    pub pid: u32,
    /// Acquisition time in milliseconds since the Unix epoch.
    pub acquired_at_ms: u64,
}

impl LockRecord {
    /// Builds a record stamped with `at`.
    #[must_use]
    pub fn new(owner: String, pid: u32, at: SystemTime) -> Self {
        let acquired_at_ms = at
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX));
        Self {
            owner,
            pid,
            acquired_at_ms,
        }
    }

    /// Acquisition time as a [`SystemTime`].
    #[must_use]
    pub fn acquired_at(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_millis(self.acquired_at_ms)
    }
}

/// Derives the marker path for a document: `.<file name>.lock` beside it.
#[must_use]
pub fn marker_path(document: &Path) -> PathBuf {
    let name = document
        .file_name()
        .map_or_else(|| String::from("document"), |name| name.to_string_lossy().into_owned());
    let marker_name = format!(".{name}.lock");
    match document.parent() {
        Some(parent) => parent.join(marker_name),
        None => PathBuf::from(marker_name),
    }
}

/// Snapshot of an existing marker.
#[derive(Debug, Clone)]
pub(super) struct ExistingMarker {
    pub(super) owner: String,
    pub(super) age: Duration,
}

/// Reads the marker, returning `None` when it has disappeared.
///
/// A marker whose contents cannot be parsed is aged by its modification time.
pub(super) fn inspect(path: &Path) -> Option<ExistingMarker> {
    let metadata = fs::metadata(path).ok()?;
    let now = SystemTime::now();
    match read_record(path) {
        Some(record) => Some(ExistingMarker {
            age: now
                .duration_since(record.acquired_at())
                .unwrap_or(Duration::ZERO),
            owner: record.owner,
        }),
        None => {
            let modified = metadata.modified().unwrap_or(now);
            Some(ExistingMarker {
                owner: String::from(UNKNOWN_OWNER),
                age: now.duration_since(modified).unwrap_or(Duration::ZERO),
            })
        }
    }
}

/// Creates the marker carrying `record`, failing with
/// [`io::ErrorKind::AlreadyExists`] when one is present.
///
/// The record is written to a sibling temporary file first and linked into
/// place, so a marker is never observed half-written.
pub(super) fn create(path: &Path, record: &LockRecord) -> io::Result<()> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staged = Builder::new()
        .prefix(".deckwright-lock-")
        .suffix(".tmp")
        .tempfile_in(directory)?;
    let payload = serde_json::to_vec(record).map_err(io::Error::other)?;
    staged.write_all(&payload)?;
    staged.as_file().sync_all()?;
    staged.persist_noclobber(path).map_err(|error| error.error)?;
    Ok(())
}

/// Result of one attempt to retire a stale marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Reclaim {
    /// The stale marker was removed by this caller.
    Retired,
    /// The marker changed hands or vanished; retry acquisition.
    Superseded,
    /// Another caller is retiring the same marker.
    InProgress,
}

/// Retires the marker left by `stale_owner` on behalf of `claimant`.
///
/// Reclaimers first take a per-owner claim file with `create_new`, so at most
/// one of them retires a given marker. Under the claim the marker is
/// re-inspected and moved aside atomically; anything other than the expected
/// stale record is put back.
pub(super) fn reclaim(
    path: &Path,
    stale_owner: &str,
    claimant: &str,
    stale_after: Duration,
) -> io::Result<Reclaim> {
    let claim = sibling(path, "claim", stale_owner);
    match File::create_new(&claim) {
        Ok(_) => {}
        Err(error) if error.kind() == io::ErrorKind::AlreadyExists => {
            // A claim outliving the stale threshold belongs to a crashed reclaimer.
            if modified_age(&claim).is_some_and(|age| age >= stale_after) {
                remove_if_present(&claim)?;
            }
            return Ok(Reclaim::InProgress);
        }
        Err(error) => return Err(error),
    }

    let outcome = retire_stale(path, stale_owner, claimant, stale_after);
    let cleanup = remove_if_present(&claim);
    let outcome = outcome?;
    cleanup?;
    Ok(outcome)
}

fn retire_stale(
    path: &Path,
    stale_owner: &str,
    claimant: &str,
    stale_after: Duration,
) -> io::Result<Reclaim> {
    let Some(current) = inspect(path) else {
        return Ok(Reclaim::Superseded);
    };
    if current.owner != stale_owner || current.age < stale_after {
        return Ok(Reclaim::Superseded);
    }
    let tombstone = sibling(path, "reclaim", claimant);
    if retire(path, &tombstone, stale_owner)? {
        Ok(Reclaim::Retired)
    } else {
        Ok(Reclaim::Superseded)
    }
}

/// Removes the marker only when it still names `owner`.
///
/// Returns `Ok(true)` when the marker was removed and `Ok(false)` when it was
/// missing or held by someone else.
pub(super) fn release_if_owned_by(path: &Path, owner: &str) -> io::Result<bool> {
    retire(path, &sibling(path, "release", owner), owner)
}

/// Moves the marker to `tombstone` and deletes it when it names `owner`.
///
/// The rename is the atomic step: it takes whatever marker is current, so the
/// owner check runs on exactly the record that was removed. A record naming
/// someone else is linked back unless a newer marker already took its place.
fn retire(path: &Path, tombstone: &Path, owner: &str) -> io::Result<bool> {
    match fs::rename(path, tombstone) {
        Ok(()) => {}
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(error) => return Err(error),
    }
    let taken = read_record(tombstone).map_or_else(|| String::from(UNKNOWN_OWNER), |r| r.owner);
    if taken == owner {
        fs::remove_file(tombstone)?;
        return Ok(true);
    }
    let restored = fs::hard_link(tombstone, path);
    fs::remove_file(tombstone)?;
    match restored {
        Ok(()) => Ok(false),
        Err(error) if error.kind() == io::ErrorKind::AlreadyExists => Ok(false),
        Err(error) => Err(error),
    }
}

/// Path of a helper file beside the marker, tagged with a filesystem-safe
/// rendering of `tag`.
fn sibling(marker: &Path, kind: &str, tag: &str) -> PathBuf {
    let safe: String = tag
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '-' })
        .collect();
    let mut name = marker.file_name().map_or_else(OsString::new, OsStr::to_os_string);
    name.push(format!(".{kind}-{safe}"));
    marker.with_file_name(name)
}

fn modified_age(path: &Path) -> Option<Duration> {
    let modified = fs::metadata(path).and_then(|metadata| metadata.modified()).ok()?;
    Some(SystemTime::now().duration_since(modified).unwrap_or(Duration::ZERO))
}

fn remove_if_present(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(error) if error.kind() != io::ErrorKind::NotFound => Err(error),
        _ => Ok(()),
    }
}

fn read_record(path: &Path) -> Option<LockRecord> {
    let bytes = fs::read(path).ok()?;
    serde_json::from_slice(&bytes).ok()
}
