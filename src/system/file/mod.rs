use std::fs::{File, OpenOptions, Permissions};
use std::io;
use std::os::unix::fs::{MetadataExt, OpenOptionsExt, PermissionsExt};
use std::path::Path;

use super::interface::{GroupId, UserId};

mod tmpdir;

pub(crate) use tmpdir::TempDir;

// of course we can also write "file & 0o040 != 0", but this makes the intent explicit
#[derive(Clone, Copy)]
pub(crate) enum Op {
    Read = 4,
    Write = 2,
    Exec = 1,
}

#[derive(Clone, Copy)]
pub(crate) enum Category {
    Owner = 2,
    Group = 1,
    World = 0,
}

pub(crate) const fn mode(who: Category, what: Op) -> u32 {
    (what as u32) << (3 * who as u32)
}

/// Create `path`, failing if it already exists, and give it exactly `mode`.
///
/// The mode is applied again after creation so that the process umask has no say in it.
pub(crate) fn create_exclusive(path: &Path, mode: u32) -> io::Result<File> {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create_new(true)
        .mode(mode)
        .open(path)?;

    file.set_permissions(Permissions::from_mode(mode))?;

    Ok(file)
}

/// Open an existing file for reading and writing, as `open(path, O_RDWR)` would.
pub(crate) fn open_read_write(path: &Path) -> io::Result<File> {
    OpenOptions::new().read(true).write(true).open(path)
}

/// The access-control relevant attributes of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FileAttributes {
    pub(crate) mode: u32,
    pub(crate) owner: UserId,
    pub(crate) group: GroupId,
}

impl FileAttributes {
    pub(crate) fn of(path: &Path) -> io::Result<Self> {
        let meta = std::fs::symlink_metadata(path)?;

        Ok(Self {
            mode: meta.mode() & 0o7777,
            owner: UserId::new(meta.uid()),
            group: GroupId::new(meta.gid()),
        })
    }
}
