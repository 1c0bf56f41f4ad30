use std::io;
use std::path::Path;
use std::sync::Arc;

use fs_err as fs;
use tracing::{error, warn};

use skiff_session::{Capability, Extensions, Session, SessionError};

use crate::list::DirEntry;
use crate::request::{CmdMethod, CmdRequest, ListMethod, ListRequest, OpenFlags};
use crate::status::Status;

/// Read side of the protocol: open a file and hand the stream back.
pub trait FileRead {
    fn file_read(&self, path: &str) -> Result<fs::File, Status>;
}

/// Write side of the protocol: open or create a file for writing.
pub trait FileWrite {
    fn file_write(&self, path: &str, flags: OpenFlags) -> Result<fs::File, Status>;
}

/// Commands that change the tree without touching file contents.
pub trait FileCmd {
    fn file_cmd(&self, request: &CmdRequest) -> Result<(), Status>;
}

/// Directory listings and stat queries.
pub trait FileList {
    fn file_list(&self, request: &ListRequest) -> Result<Vec<DirEntry>, Status>;
}

/// One value serving all four protocol roles for a single session.
///
/// Cheap to clone; the protocol layer may pipeline requests against the same
/// session from multiple tasks. Every decision routine follows the same
/// order: the session-wide read-only switch (mutating verbs only), then path
/// containment, then the capability gate, then the filesystem call. Keeping
/// containment ahead of the capability check means a probing client can
/// never learn which capabilities exist for paths outside its sandbox.
#[derive(Debug, Clone)]
pub struct Handler {
    session: Arc<Session>,
}

impl Handler {
    pub fn new(session: Session) -> Self {
        Self {
            session: Arc::new(session),
        }
    }

    /// Create a handler for a freshly authorized connection, deriving the
    /// session from the transport layer's extension map.
    pub fn from_extensions(
        base: impl AsRef<Path>,
        extensions: &Extensions,
        read_only: bool,
    ) -> Result<Self, SessionError> {
        Ok(Self::new(Session::from_extensions(
            base, extensions, read_only,
        )?))
    }

    pub fn session(&self) -> &Session {
        &self.session
    }
}

impl FileRead for Handler {
    fn file_read(&self, path: &str) -> Result<fs::File, Status> {
        let path = self.session.resolve(path).map_err(|_| Status::NoSuchFile)?;

        if !self.session.can(Capability::ViewFileContent) {
            return Err(Status::PermissionDenied);
        }

        // Reads are deliberately not serialized against mutations; the
        // session lock covers mutating verbs only.
        match fs::OpenOptions::new().read(true).open(&path) {
            Ok(file) => Ok(file),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Err(Status::NoSuchFile),
            Err(err) => {
                error!("Failed to open `{}` for reading: {err}", path.display());
                Err(Status::Failure)
            }
        }
    }
}

impl FileWrite for Handler {
    fn file_write(&self, path: &str, flags: OpenFlags) -> Result<fs::File, Status> {
        if self.session.read_only() {
            return Err(Status::Unsupported);
        }

        let path = self.session.resolve(path).map_err(|_| Status::NoSuchFile)?;

        let _guard = self.session.lock_mutations();

        // The existence probe only picks between the create and overwrite
        // capability requirements; it is not a security boundary. The open
        // itself happens under the session mutation lock either way.
        let exists = match fs::metadata(&path) {
            Ok(_) => true,
            Err(err) if err.kind() == io::ErrorKind::NotFound => false,
            Err(err) => {
                error!("Failed to stat `{}` before writing: {err}", path.display());
                return Err(Status::Failure);
            }
        };

        if !exists {
            if !self.session.can(Capability::CreateNewFiles) {
                return Err(Status::PermissionDenied);
            }

            // Create any missing directories leading up to the file.
            if let Some(parent) = path.parent() {
                if let Err(err) = fs::create_dir_all(parent) {
                    error!(
                        "Failed to create parent directories for `{}`: {err}",
                        path.display()
                    );
                    return Err(Status::Failure);
                }
            }

            return match fs::File::create(&path) {
                Ok(file) => Ok(file),
                Err(err) => {
                    error!("Failed to create `{}`: {err}", path.display());
                    Err(Status::Failure)
                }
            };
        }

        // The file already exists: pass the request flags through so the OS
        // applies whatever the client asked for (truncate, append, ...).
        if !self.session.can(Capability::OverwriteExistingFiles) {
            return Err(Status::PermissionDenied);
        }

        match flags.open_options().open(&path) {
            Ok(file) => Ok(file),
            Err(err) => {
                error!(
                    "Failed to open `{}` for writing with flags {flags:?}: {err}",
                    path.display()
                );
                Err(Status::Failure)
            }
        }
    }
}

impl FileCmd for Handler {
    fn file_cmd(&self, request: &CmdRequest) -> Result<(), Status> {
        if self.session.read_only() {
            return Err(Status::Unsupported);
        }

        let path = self
            .session
            .resolve(&request.path)
            .map_err(|_| Status::NoSuchFile)?;

        // A destination escaping the sandbox is rejected before any
        // capability check, with the rename-specific unsupported outcome.
        let target = match &request.target {
            Some(target) => Some(
                self.session
                    .resolve(target)
                    .map_err(|_| Status::Unsupported)?,
            ),
            None => None,
        };

        match request.method {
            CmdMethod::SetStat => Err(Status::Unsupported),
            CmdMethod::Rename => {
                if !self.session.can(Capability::MoveOrRename) {
                    return Err(Status::PermissionDenied);
                }
                let Some(target) = target else {
                    warn!("Rename request for `{}` carried no target", path.display());
                    return Err(Status::Failure);
                };

                let _guard = self.session.lock_mutations();
                match fs::rename(&path, &target) {
                    Ok(()) => Ok(()),
                    Err(err) if err.kind() == io::ErrorKind::NotFound => Err(Status::NoSuchFile),
                    Err(err) => {
                        error!(
                            "Failed to rename `{}` to `{}`: {err}",
                            path.display(),
                            target.display()
                        );
                        Err(Status::Failure)
                    }
                }
            }
            CmdMethod::RemoveDirectory => {
                if !self.session.can(Capability::DeleteFilesOrDirectories) {
                    return Err(Status::PermissionDenied);
                }

                let _guard = self.session.lock_mutations();
                match fs::remove_dir_all(&path) {
                    Ok(()) => Ok(()),
                    Err(err) if err.kind() == io::ErrorKind::NotFound => Err(Status::NoSuchFile),
                    Err(err) => {
                        error!("Failed to remove directory `{}`: {err}", path.display());
                        Err(Status::Failure)
                    }
                }
            }
            CmdMethod::MakeDirectory => {
                if !self.session.can(Capability::CreateNewFiles) {
                    return Err(Status::PermissionDenied);
                }

                let _guard = self.session.lock_mutations();
                match fs::create_dir_all(&path) {
                    Ok(()) => Ok(()),
                    Err(err) => {
                        error!("Failed to create directory `{}`: {err}", path.display());
                        Err(Status::Failure)
                    }
                }
            }
            CmdMethod::Symlink => {
                if !self.session.can(Capability::CreateNewFiles) {
                    return Err(Status::PermissionDenied);
                }
                let Some(target) = target else {
                    warn!("Symlink request for `{}` carried no target", path.display());
                    return Err(Status::Failure);
                };

                let _guard = self.session.lock_mutations();
                match symlink(&path, &target) {
                    Ok(()) => Ok(()),
                    Err(err) => {
                        error!(
                            "Failed to symlink `{}` to `{}`: {err}",
                            target.display(),
                            path.display()
                        );
                        Err(Status::Failure)
                    }
                }
            }
            CmdMethod::RemoveFile => {
                if !self.session.can(Capability::DeleteFilesOrDirectories) {
                    return Err(Status::PermissionDenied);
                }

                let _guard = self.session.lock_mutations();
                match fs::remove_file(&path) {
                    Ok(()) => Ok(()),
                    Err(err) if err.kind() == io::ErrorKind::NotFound => Err(Status::NoSuchFile),
                    Err(err) => {
                        error!("Failed to remove file `{}`: {err}", path.display());
                        Err(Status::Failure)
                    }
                }
            }
        }
    }
}

impl FileList for Handler {
    fn file_list(&self, request: &ListRequest) -> Result<Vec<DirEntry>, Status> {
        let path = self
            .session
            .resolve(&request.path)
            .map_err(|_| Status::NoSuchFile)?;

        match request.method {
            ListMethod::List => {
                if !self.session.can(Capability::ListDirectoryContents) {
                    return Err(Status::PermissionDenied);
                }

                let entries = match fs::read_dir(&path) {
                    Ok(entries) => entries,
                    Err(err) if err.kind() == io::ErrorKind::NotFound => {
                        return Err(Status::NoSuchFile);
                    }
                    Err(err) => {
                        error!("Failed to list `{}`: {err}", path.display());
                        return Err(Status::Failure);
                    }
                };

                let mut listing = Vec::new();
                for entry in entries {
                    let entry = match entry {
                        Ok(entry) => entry,
                        Err(err) => {
                            error!("Failed to read an entry of `{}`: {err}", path.display());
                            return Err(Status::Failure);
                        }
                    };
                    let metadata = match entry.metadata() {
                        Ok(metadata) => metadata,
                        Err(err) => {
                            error!("Failed to stat `{}`: {err}", entry.path().display());
                            return Err(Status::Failure);
                        }
                    };
                    listing.push(DirEntry::from_metadata(
                        entry.file_name().to_string_lossy().into_owned(),
                        &metadata,
                    ));
                }
                Ok(listing)
            }
            ListMethod::Stat => {
                if !self.session.can(Capability::ListDirectoryContents) {
                    return Err(Status::PermissionDenied);
                }

                let metadata = match fs::metadata(&path) {
                    Ok(metadata) => metadata,
                    Err(err) if err.kind() == io::ErrorKind::NotFound => {
                        return Err(Status::NoSuchFile);
                    }
                    Err(err) => {
                        error!("Failed to stat `{}`: {err}", path.display());
                        return Err(Status::Failure);
                    }
                };

                let name = path
                    .file_name()
                    .map_or_else(|| ".".to_owned(), |name| name.to_string_lossy().into_owned());
                Ok(vec![DirEntry::from_metadata(name, &metadata)])
            }
            // Readlink stays unsupported until exposing symlink targets that
            // point outside the home directory has been reviewed.
            ListMethod::ReadLink => Err(Status::Unsupported),
        }
    }
}

#[cfg(unix)]
fn symlink(original: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(original, link)
}

#[cfg(not(unix))]
fn symlink(_original: &Path, _link: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "symlinks require additional privileges on this platform",
    ))
}
