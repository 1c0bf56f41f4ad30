//! Request model delivered by the protocol-handler layer.
//!
//! The wire protocol itself (framing, packet parsing) lives in the
//! collaborator; by the time a request reaches this crate it is already
//! parsed into a verb, one or two client-relative paths, and, for writes,
//! the open-flags word from the `SSH_FXP_OPEN` packet.

use fs_err as fs;

bitflags::bitflags! {
    /// The `pflags` word of an `SSH_FXP_OPEN` request, per
    /// draft-ietf-secsh-filexfer-02 §6.3. Passed through to the OS verbatim
    /// when opening an existing file for writing.
    #[derive(Debug, Clone, Copy, Eq, PartialEq)]
    pub struct OpenFlags: u32 {
        const READ = 0x0000_0001;
        const WRITE = 0x0000_0002;
        const APPEND = 0x0000_0004;
        const CREATE = 0x0000_0008;
        const TRUNCATE = 0x0000_0010;
        const EXCLUSIVE = 0x0000_0020;
    }
}

impl OpenFlags {
    /// Translate the flag word into [`fs::OpenOptions`].
    pub fn open_options(self) -> fs::OpenOptions {
        let mut options = fs::OpenOptions::new();
        options.read(self.contains(Self::READ));
        options.write(self.contains(Self::WRITE));
        options.append(self.contains(Self::APPEND));
        options.create(self.contains(Self::CREATE));
        options.truncate(self.contains(Self::TRUNCATE));
        options.create_new(self.contains(Self::EXCLUSIVE));
        options
    }
}

/// A filesystem command that neither reads nor writes file contents.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum CmdMethod {
    /// `SSH_FXP_SETSTAT`; intentionally unsupported.
    SetStat,
    Rename,
    RemoveDirectory,
    MakeDirectory,
    Symlink,
    RemoveFile,
}

/// A parsed `SSH_FXP_RENAME`/`REMOVE`/`MKDIR`/`RMDIR`/`SYMLINK`/`SETSTAT`
/// request.
#[derive(Debug, Clone)]
pub struct CmdRequest {
    pub method: CmdMethod,
    /// Client-relative source path.
    pub path: String,
    /// Client-relative destination, for rename and symlink.
    pub target: Option<String>,
}

/// A metadata query.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ListMethod {
    /// Directory listing.
    List,
    /// Metadata for a single entry.
    Stat,
    /// `SSH_FXP_READLINK`; intentionally unsupported.
    ReadLink,
}

/// A parsed `SSH_FXP_READDIR`/`STAT`/`READLINK` request.
#[derive(Debug, Clone)]
pub struct ListRequest {
    pub method: ListMethod,
    pub path: String,
}
