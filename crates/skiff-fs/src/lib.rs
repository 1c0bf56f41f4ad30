//! Path containment for sandboxed SFTP sessions.
//!
//! Every path a client supplies is resolved against the session's home
//! directory and rejected if the normalized result leaves it. Resolution is
//! purely lexical; the caller is responsible for mapping a
//! [`ContainmentError`] to a "no such file" outcome so that an escape
//! attempt is indistinguishable from a nonexistent path on the wire.

use std::path::{Path, PathBuf};

pub use crate::path::{normalize_path, strip_root};

mod path;

/// The normalized path left the session's home directory.
///
/// Carries no path detail: the offending input is the client's own, and the
/// resolved host path must never travel back over the protocol.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("path resolves outside of the session home directory")]
pub struct ContainmentError;

/// Resolve a client-supplied path against a home directory.
///
/// The client path is joined onto `home` (root components stripped first, so
/// `/foo` and `foo` are equivalent), lexically normalized, and then checked
/// for containment component-wise. A raw string-prefix comparison would let
/// `/data/srv-10` satisfy a check against `/data/srv-1`; comparing whole
/// components rules that out.
///
/// An empty client path resolves to `home` itself. A client path that is
/// already an in-sandbox absolute path resolves to itself, making resolution
/// idempotent.
///
/// `home` must be absolute and normalized.
pub fn resolve(home: &Path, client_path: impl AsRef<Path>) -> Result<PathBuf, ContainmentError> {
    let client_path = client_path.as_ref();

    // Re-resolving an already-resolved path must be a no-op, so a path that
    // is already anchored under the home directory is taken as-is rather
    // than re-joined. Containment is still checked after normalization.
    let joined = if client_path.starts_with(home) {
        client_path.to_path_buf()
    } else {
        home.join(strip_root(client_path))
    };

    let resolved = normalize_path(&joined);
    if resolved.starts_with(home) {
        Ok(resolved)
    } else {
        Err(ContainmentError)
    }
}
