use std::path::{Component, Path, PathBuf};

/// Normalize a path, removing things like `.` and `..`.
///
/// Purely lexical: the filesystem is never consulted, so symlinks are not
/// followed and the path does not need to exist. A `..` at the root is
/// dropped rather than preserved, which means an escape above the join point
/// surfaces as a prefix mismatch instead of a dangling parent component.
///
/// Source: <https://github.com/rust-lang/cargo/blob/b48c41aedbd69ee3990d62a0e2006edbb506a480/crates/cargo-util/src/paths.rs#L76C1-L109C2>
pub fn normalize_path(path: impl AsRef<Path>) -> PathBuf {
    let mut components = path.as_ref().components().peekable();
    let mut ret = if let Some(c @ Component::Prefix(..)) = components.peek().copied() {
        components.next();
        PathBuf::from(c.as_os_str())
    } else {
        PathBuf::new()
    };

    for component in components {
        match component {
            Component::Prefix(..) => unreachable!(),
            Component::RootDir => {
                ret.push(component.as_os_str());
            }
            Component::CurDir => {}
            Component::ParentDir => {
                ret.pop();
            }
            Component::Normal(c) => {
                ret.push(c);
            }
        }
    }
    ret
}

/// Strip any root or prefix components, leaving a relative path.
///
/// Client paths are virtual-absolute: `/foo` names `foo` under the session's
/// home directory, not `/foo` on the host. Stripping the root before joining
/// gives the same semantics as Go's `filepath.Join` in the original daemon.
pub fn strip_root(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::RootDir | Component::Prefix(..)))
        .collect()
}
