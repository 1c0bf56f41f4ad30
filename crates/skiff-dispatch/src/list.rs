use std::fs::Metadata;
use std::time::SystemTime;

/// Metadata for one directory entry, as returned to the protocol layer for
/// listing and stat requests.
#[derive(Debug, Clone)]
pub struct DirEntry {
    /// Base name of the entry.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Unix permission and file-type bits.
    pub mode: u32,
    /// Modification time, if the filesystem reports one.
    pub modified: Option<SystemTime>,
}

impl DirEntry {
    /// Build an entry from a base name and its [`Metadata`].
    pub fn from_metadata(name: impl Into<String>, metadata: &Metadata) -> Self {
        Self {
            name: name.into(),
            size: metadata.len(),
            mode: mode(metadata),
            modified: metadata.modified().ok(),
        }
    }

    /// Whether the entry is a directory.
    pub fn is_dir(&self) -> bool {
        self.mode & 0o170_000 == 0o040_000
    }
}

#[cfg(unix)]
fn mode(metadata: &Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode()
}

#[cfg(not(unix))]
fn mode(metadata: &Metadata) -> u32 {
    // Synthesize type and permission bits the way SFTP servers on Windows
    // conventionally do.
    let type_bits = if metadata.is_dir() { 0o040_000 } else { 0o100_000 };
    let permission_bits = if metadata.permissions().readonly() {
        0o444
    } else {
        0o644
    };
    type_bits | permission_bits
}
