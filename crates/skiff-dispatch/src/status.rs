/// Protocol-level outcome of a failed operation.
///
/// Success is the `Ok` arm of each handler method; these are the only
/// failure codes a client ever sees. Containment failures map to
/// [`Status::NoSuchFile`] rather than [`Status::PermissionDenied`] so that
/// an escape attempt is indistinguishable from a nonexistent path, and
/// unexpected OS errors map to [`Status::Failure`] with the detail kept in
/// the server-side log.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, thiserror::Error)]
pub enum Status {
    #[error("no such file")]
    NoSuchFile,
    #[error("permission denied")]
    PermissionDenied,
    #[error("operation unsupported")]
    Unsupported,
    #[error("failure")]
    Failure,
}

impl Status {
    /// The `SSH_FX_*` status code for this outcome, per
    /// draft-ietf-secsh-filexfer-02 §7.
    pub fn code(self) -> u32 {
        match self {
            Self::NoSuchFile => 2,
            Self::PermissionDenied => 3,
            Self::Failure => 4,
            Self::Unsupported => 8,
        }
    }
}
