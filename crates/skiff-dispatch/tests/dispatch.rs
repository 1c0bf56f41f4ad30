use std::io::{Read, Write};

use tempfile::TempDir;

use skiff_dispatch::{
    CmdMethod, CmdRequest, FileCmd, FileList, FileRead, FileWrite, Handler, ListMethod,
    ListRequest, OpenFlags, Status,
};
use skiff_session::{CapabilitySet, Session};

fn handler(home: &TempDir, permissions: &str) -> Handler {
    Handler::new(Session::new(
        home.path(),
        "test-session",
        CapabilitySet::parse(permissions),
        false,
    ))
}

fn read_only_handler(home: &TempDir, permissions: &str) -> Handler {
    Handler::new(Session::new(
        home.path(),
        "test-session",
        CapabilitySet::parse(permissions),
        true,
    ))
}

fn cmd(method: CmdMethod, path: &str, target: Option<&str>) -> CmdRequest {
    CmdRequest {
        method,
        path: path.to_owned(),
        target: target.map(ToOwned::to_owned),
    }
}

fn list(method: ListMethod, path: &str) -> ListRequest {
    ListRequest {
        method,
        path: path.to_owned(),
    }
}

#[test]
fn reading_an_existing_file_returns_its_contents() {
    let home = TempDir::new().unwrap();
    std::fs::write(home.path().join("motd.txt"), b"welcome").unwrap();

    let handler = handler(&home, "edit-files");
    let mut file = handler.file_read("motd.txt").unwrap();
    let mut contents = String::new();
    file.read_to_string(&mut contents).unwrap();
    assert_eq!(contents, "welcome");
}

#[test]
fn reading_an_absent_file_is_no_such_file() {
    let home = TempDir::new().unwrap();
    let handler = handler(&home, "edit-files");
    assert_eq!(handler.file_read("missing.txt").unwrap_err(), Status::NoSuchFile);
}

#[test]
fn reading_without_the_view_capability_is_permission_denied() {
    let home = TempDir::new().unwrap();
    std::fs::write(home.path().join("motd.txt"), b"welcome").unwrap();

    let handler = handler(&home, "list-files");
    assert_eq!(
        handler.file_read("motd.txt").unwrap_err(),
        Status::PermissionDenied
    );
}

#[test]
fn escape_attempts_read_as_no_such_file() {
    let home = TempDir::new().unwrap();
    // No capabilities at all: a denied capability would surface as
    // permission-denied, so getting no-such-file proves containment is
    // checked first.
    let handler = handler(&home, "");
    assert_eq!(
        handler.file_read("../../etc/passwd").unwrap_err(),
        Status::NoSuchFile
    );
}

#[test]
fn writing_a_new_file_creates_missing_parents() {
    let home = TempDir::new().unwrap();
    let handler = handler(&home, "create-files");

    let mut file = handler
        .file_write("sub/deep/new.txt", OpenFlags::WRITE | OpenFlags::CREATE)
        .unwrap();
    file.write_all(b"fresh").unwrap();
    drop(file);

    let contents = std::fs::read_to_string(home.path().join("sub/deep/new.txt")).unwrap();
    assert_eq!(contents, "fresh");
}

#[test]
fn writing_a_new_file_without_create_is_permission_denied() {
    let home = TempDir::new().unwrap();
    let handler = handler(&home, "list-files");
    assert_eq!(
        handler
            .file_write("new.txt", OpenFlags::WRITE | OpenFlags::CREATE)
            .unwrap_err(),
        Status::PermissionDenied
    );
}

#[test]
fn overwriting_an_existing_file_requires_save_files() {
    let home = TempDir::new().unwrap();
    std::fs::write(home.path().join("config.yml"), b"old").unwrap();

    // create-files is not enough once the file exists.
    let handler = handler(&home, "create-files");
    assert_eq!(
        handler
            .file_write("config.yml", OpenFlags::WRITE)
            .unwrap_err(),
        Status::PermissionDenied
    );
}

#[test]
fn overwrite_honors_the_request_flags() {
    let home = TempDir::new().unwrap();
    std::fs::write(home.path().join("config.yml"), b"a much longer body").unwrap();

    let handler = handler(&home, "save-files");
    let mut file = handler
        .file_write("config.yml", OpenFlags::WRITE | OpenFlags::TRUNCATE)
        .unwrap();
    file.write_all(b"short").unwrap();
    drop(file);

    let contents = std::fs::read_to_string(home.path().join("config.yml")).unwrap();
    assert_eq!(contents, "short");
}

#[test]
fn read_only_session_rejects_mutations_even_with_the_sentinel() {
    let home = TempDir::new().unwrap();
    std::fs::write(home.path().join("motd.txt"), b"welcome").unwrap();

    let handler = read_only_handler(&home, "*");
    assert_eq!(
        handler
            .file_write("new.txt", OpenFlags::WRITE | OpenFlags::CREATE)
            .unwrap_err(),
        Status::Unsupported
    );
    assert_eq!(
        handler
            .file_cmd(&cmd(CmdMethod::MakeDirectory, "dir", None))
            .unwrap_err(),
        Status::Unsupported
    );
    // The kill switch trips before path resolution: even an absent source
    // reports unsupported, not no-such-file.
    assert_eq!(
        handler
            .file_cmd(&cmd(CmdMethod::Rename, "missing.txt", Some("other.txt")))
            .unwrap_err(),
        Status::Unsupported
    );

    // Reads are unaffected.
    assert!(handler.file_read("motd.txt").is_ok());
}

#[test]
fn rename_moves_the_file() {
    let home = TempDir::new().unwrap();
    std::fs::write(home.path().join("a.txt"), b"payload").unwrap();

    let handler = handler(&home, "move-files");
    handler
        .file_cmd(&cmd(CmdMethod::Rename, "a.txt", Some("b.txt")))
        .unwrap();

    assert!(!home.path().join("a.txt").exists());
    assert_eq!(
        std::fs::read_to_string(home.path().join("b.txt")).unwrap(),
        "payload"
    );
}

#[test]
fn rename_to_an_escaping_target_is_unsupported() {
    let home = TempDir::new().unwrap();
    std::fs::write(home.path().join("a.txt"), b"payload").unwrap();

    let handler = handler(&home, "*");
    assert_eq!(
        handler
            .file_cmd(&cmd(CmdMethod::Rename, "a.txt", Some("../b.txt")))
            .unwrap_err(),
        Status::Unsupported
    );
    assert!(home.path().join("a.txt").exists());
}

#[test]
fn rename_of_an_absent_source_is_no_such_file() {
    let home = TempDir::new().unwrap();
    let handler = handler(&home, "move-files");
    assert_eq!(
        handler
            .file_cmd(&cmd(CmdMethod::Rename, "missing.txt", Some("b.txt")))
            .unwrap_err(),
        Status::NoSuchFile
    );
}

#[test]
fn remove_directory_is_recursive() {
    let home = TempDir::new().unwrap();
    std::fs::create_dir_all(home.path().join("world/region")).unwrap();
    std::fs::write(home.path().join("world/region/r.0.0.mca"), b"chunk").unwrap();

    let handler = handler(&home, "delete-files");
    handler
        .file_cmd(&cmd(CmdMethod::RemoveDirectory, "world", None))
        .unwrap();
    assert!(!home.path().join("world").exists());
}

#[test]
fn remove_file_removes_a_single_entry() {
    let home = TempDir::new().unwrap();
    std::fs::write(home.path().join("stale.log"), b"").unwrap();

    let handler = handler(&home, "delete-files");
    handler
        .file_cmd(&cmd(CmdMethod::RemoveFile, "stale.log", None))
        .unwrap();
    assert!(!home.path().join("stale.log").exists());
}

#[test]
fn removing_an_absent_file_is_no_such_file() {
    let home = TempDir::new().unwrap();
    let handler = handler(&home, "delete-files");
    assert_eq!(
        handler
            .file_cmd(&cmd(CmdMethod::RemoveFile, "missing.log", None))
            .unwrap_err(),
        Status::NoSuchFile
    );
}

#[test]
fn make_directory_is_recursive() {
    let home = TempDir::new().unwrap();
    let handler = handler(&home, "create-files");
    handler
        .file_cmd(&cmd(CmdMethod::MakeDirectory, "plugins/Essentials/userdata", None))
        .unwrap();
    assert!(home.path().join("plugins/Essentials/userdata").is_dir());
}

#[test]
fn make_directory_without_create_is_permission_denied() {
    let home = TempDir::new().unwrap();
    let handler = handler(&home, "delete-files");
    assert_eq!(
        handler
            .file_cmd(&cmd(CmdMethod::MakeDirectory, "plugins", None))
            .unwrap_err(),
        Status::PermissionDenied
    );
}

#[test]
fn setstat_is_unsupported() {
    let home = TempDir::new().unwrap();
    let handler = handler(&home, "*");
    assert_eq!(
        handler
            .file_cmd(&cmd(CmdMethod::SetStat, "motd.txt", None))
            .unwrap_err(),
        Status::Unsupported
    );
}

#[cfg(unix)]
#[test]
fn symlink_creates_a_link_inside_the_sandbox() {
    let home = TempDir::new().unwrap();
    std::fs::write(home.path().join("server.properties"), b"eula=true").unwrap();

    let handler = handler(&home, "create-files");
    handler
        .file_cmd(&cmd(
            CmdMethod::Symlink,
            "server.properties",
            Some("server.properties.link"),
        ))
        .unwrap();

    let link = home.path().join("server.properties.link");
    assert!(std::fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
}

#[cfg(unix)]
#[test]
fn symlink_with_an_escaping_endpoint_is_rejected() {
    let home = TempDir::new().unwrap();
    let handler = handler(&home, "*");
    assert_eq!(
        handler
            .file_cmd(&cmd(CmdMethod::Symlink, "a.txt", Some("../outside.link")))
            .unwrap_err(),
        Status::Unsupported
    );
}

#[test]
fn listing_returns_entry_metadata() {
    let home = TempDir::new().unwrap();
    std::fs::write(home.path().join("a.txt"), b"abc").unwrap();
    std::fs::create_dir(home.path().join("logs")).unwrap();

    let handler = handler(&home, "list-files");
    let mut entries = handler.file_list(&list(ListMethod::List, "")).unwrap();
    entries.sort_by(|a, b| a.name.cmp(&b.name));

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].name, "a.txt");
    assert_eq!(entries[0].size, 3);
    assert!(!entries[0].is_dir());
    assert!(entries[0].modified.is_some());
    assert_eq!(entries[1].name, "logs");
    assert!(entries[1].is_dir());
}

#[test]
fn stat_returns_a_single_entry() {
    let home = TempDir::new().unwrap();
    std::fs::write(home.path().join("a.txt"), b"abc").unwrap();

    let handler = handler(&home, "list-files");
    let entries = handler.file_list(&list(ListMethod::Stat, "a.txt")).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "a.txt");
    assert_eq!(entries[0].size, 3);
    assert!(!entries[0].is_dir());
}

#[test]
fn stat_of_the_home_directory_itself_works() {
    let home = TempDir::new().unwrap();
    let handler = handler(&home, "list-files");
    let entries = handler.file_list(&list(ListMethod::Stat, "")).unwrap();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].is_dir());
}

#[test]
fn stat_of_an_absent_path_is_no_such_file() {
    let home = TempDir::new().unwrap();
    let handler = handler(&home, "list-files");
    assert_eq!(
        handler
            .file_list(&list(ListMethod::Stat, "missing.txt"))
            .unwrap_err(),
        Status::NoSuchFile
    );
}

#[test]
fn listing_without_the_capability_is_permission_denied() {
    let home = TempDir::new().unwrap();
    let handler = handler(&home, "edit-files");
    assert_eq!(
        handler.file_list(&list(ListMethod::List, "")).unwrap_err(),
        Status::PermissionDenied
    );
}

#[test]
fn readlink_is_unsupported() {
    let home = TempDir::new().unwrap();
    let handler = handler(&home, "*");
    assert_eq!(
        handler
            .file_list(&list(ListMethod::ReadLink, "server.properties.link"))
            .unwrap_err(),
        Status::Unsupported
    );
}

#[test]
fn concurrent_writes_to_distinct_files_both_complete() {
    let home = TempDir::new().unwrap();
    let handler = handler(&home, "*");

    std::thread::scope(|scope| {
        for name in ["left.bin", "right.bin"] {
            let handler = handler.clone();
            scope.spawn(move || {
                let mut file = handler
                    .file_write(name, OpenFlags::WRITE | OpenFlags::CREATE)
                    .unwrap();
                for _ in 0..128 {
                    file.write_all(&[0u8; 1024]).unwrap();
                }
            });
        }
    });

    assert_eq!(
        std::fs::metadata(home.path().join("left.bin")).unwrap().len(),
        128 * 1024
    );
    assert_eq!(
        std::fs::metadata(home.path().join("right.bin")).unwrap().len(),
        128 * 1024
    );
}
