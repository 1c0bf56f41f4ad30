//! Per-verb decision routines mapping parsed SFTP requests onto a sandboxed
//! filesystem.
//!
//! The protocol layer parses the wire format and calls one of the four
//! narrow handler traits ([`FileRead`], [`FileWrite`], [`FileCmd`],
//! [`FileList`]); a single [`Handler`] per session implements all four.
//! Each routine resolves the client path against the session's home
//! directory, checks the required capability, performs the filesystem call,
//! and translates the result into either a stream, a listing, or a
//! [`Status`].

pub use crate::handler::{FileCmd, FileList, FileRead, FileWrite, Handler};
pub use crate::list::DirEntry;
pub use crate::request::{CmdMethod, CmdRequest, ListMethod, ListRequest, OpenFlags};
pub use crate::status::Status;

mod handler;
mod list;
mod request;
mod status;
