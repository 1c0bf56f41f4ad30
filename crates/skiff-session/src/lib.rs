//! Per-connection session state and the capability gate.
//!
//! A [`Session`] is created once per authorized connection from the identity
//! and extension map supplied by the transport layer, and lives exactly as
//! long as the connection. It owns the sandbox root, the capability set, the
//! session-wide read-only flag, and the mutex that serializes filesystem
//! mutations issued through the connection.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use rustc_hash::FxHashMap;
use tracing::debug;

use skiff_fs::{ContainmentError, normalize_path};

pub use crate::capability::{Capability, CapabilitySet};

mod capability;

/// The extension map delivered by the transport layer at session start.
pub type Extensions = FxHashMap<String, String>;

/// Extension key selecting the home directory under the server base.
const EXTENSION_UUID: &str = "uuid";

/// Extension key carrying the comma-separated permission list.
const EXTENSION_PERMISSIONS: &str = "permissions";

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("authorization extensions are missing `{0}`")]
    MissingExtension(&'static str),
}

/// Per-connection state: sandbox root, identity, capabilities, and the
/// mutation serializer.
///
/// The home directory and capability set are immutable for the session's
/// lifetime; nothing here is persisted beyond the files the client
/// manipulates.
#[derive(Debug)]
pub struct Session {
    /// Absolute, normalized sandbox root. Every resolved path is this
    /// directory or a descendant of it.
    home: PathBuf,
    /// Opaque identity correlating the session to the panel, for
    /// diagnostics only.
    identity: String,
    capabilities: CapabilitySet,
    /// Session-wide kill switch: rejects every mutating verb regardless of
    /// the capability set.
    read_only: bool,
    mutation_lock: Mutex<()>,
}

impl Session {
    /// Create a session over `home` directly. Used by embedders and tests;
    /// connections coming through the transport layer use
    /// [`Session::from_extensions`].
    pub fn new(
        home: impl Into<PathBuf>,
        identity: impl Into<String>,
        capabilities: CapabilitySet,
        read_only: bool,
    ) -> Self {
        let home = normalize_path(home.into());
        let identity = identity.into();
        debug!("Opened session `{identity}` rooted at `{}`", home.display());
        Self {
            home,
            identity,
            capabilities,
            read_only,
            mutation_lock: Mutex::new(()),
        }
    }

    /// Create a session from the authorization extensions supplied by the
    /// transport layer: a `uuid` selecting the home directory under `base`,
    /// and a comma-separated `permissions` list.
    pub fn from_extensions(
        base: impl AsRef<Path>,
        extensions: &Extensions,
        read_only: bool,
    ) -> Result<Self, SessionError> {
        let uuid = extensions
            .get(EXTENSION_UUID)
            .ok_or(SessionError::MissingExtension(EXTENSION_UUID))?;
        let permissions = extensions
            .get(EXTENSION_PERMISSIONS)
            .ok_or(SessionError::MissingExtension(EXTENSION_PERMISSIONS))?;
        Ok(Self::new(
            base.as_ref().join(uuid),
            uuid,
            CapabilitySet::parse(permissions),
            read_only,
        ))
    }

    /// The sandbox root. Immutable for the session's lifetime.
    pub fn home(&self) -> &Path {
        &self.home
    }

    /// The identity this session was authorized as. Diagnostics only; never
    /// used in decision logic.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Whether the session-wide read-only kill switch is set.
    pub fn read_only(&self) -> bool {
        self.read_only
    }

    /// Returns `true` if the session's capability set grants the action.
    /// Pure; no default grants.
    pub fn can(&self, capability: Capability) -> bool {
        self.capabilities.grants(capability)
    }

    /// Resolve a client-supplied path against the session's home directory.
    pub fn resolve(&self, client_path: impl AsRef<Path>) -> Result<PathBuf, ContainmentError> {
        skiff_fs::resolve(&self.home, client_path)
    }

    /// Serialize filesystem mutations for this session.
    ///
    /// Held for the duration of the mutating filesystem call; reads are
    /// deliberately not serialized. A poisoned lock still serializes, since
    /// no state lives behind it.
    pub fn lock_mutations(&self) -> MutexGuard<'_, ()> {
        self.mutation_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
