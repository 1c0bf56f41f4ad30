use rustc_hash::FxHashSet;

/// An action a session may be permitted to perform.
///
/// The wire names are the permission strings issued by the panel; they are
/// granted per identity and arrive as a comma-separated list at session
/// start.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Capability {
    /// Open and read the contents of existing files.
    ViewFileContent,
    /// Create files and directories that do not yet exist.
    CreateNewFiles,
    /// Write to files that already exist.
    OverwriteExistingFiles,
    /// Remove files or directories.
    DeleteFilesOrDirectories,
    /// Rename or move entries.
    MoveOrRename,
    /// List directory contents and stat entries.
    ListDirectoryContents,
}

impl Capability {
    /// The permission name as issued by the panel.
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::ViewFileContent => "edit-files",
            Self::CreateNewFiles => "create-files",
            Self::OverwriteExistingFiles => "save-files",
            Self::DeleteFilesOrDirectories => "delete-files",
            Self::MoveOrRename => "move-files",
            Self::ListDirectoryContents => "list-files",
        }
    }
}

/// The set of permissions granted to a session's identity.
///
/// Owners and administrators are granted the single sentinel `*`, which
/// short-circuits every check. Anything else is an opaque set of names:
/// unknown names are kept but never match, so they behave as "not granted"
/// without any parse-time validation.
#[derive(Debug, Clone)]
pub enum CapabilitySet {
    /// The `*` sentinel: every capability is granted.
    All,
    /// An explicit set of wire names. Absence of a name is a denial.
    Named(FxHashSet<String>),
}

impl CapabilitySet {
    /// Parse the comma-separated permission list from the authorization
    /// extensions.
    pub fn parse(raw: &str) -> Self {
        let names: Vec<&str> = raw.split(',').collect();
        if names.len() == 1 && names[0] == "*" {
            Self::All
        } else {
            Self::Named(names.into_iter().map(ToOwned::to_owned).collect())
        }
    }

    /// Returns `true` if the set grants the given capability.
    pub fn grants(&self, capability: Capability) -> bool {
        match self {
            Self::All => true,
            Self::Named(names) => names.contains(capability.wire_name()),
        }
    }
}
