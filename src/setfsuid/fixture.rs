//! Preparation and cleanup of the filesystem state the probes run against.
use std::{
    ffi::CString,
    fs::{File, Permissions},
    io,
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
};

use crate::common::Error;
use crate::harness::require_root;
use crate::log::dev_debug;
use crate::system::{
    file::{create_exclusive, mode, Category, FileAttributes, Op, TempDir},
    interface::{ProcessId, UserId},
    User,
};

use super::context::SetfsuidContext;

/// `rw-r--r--`: only the owner may write.
pub(crate) const ARTIFACT_MODE: u32 = mode(Category::Owner, Op::Read)
    | mode(Category::Owner, Op::Write)
    | mode(Category::Group, Op::Read)
    | mode(Category::World, Op::Read);

/// `rwxr-xr-x`: the unprivileged fsuid can reach the artifact, so a denied open is decided by
/// the artifact's own mode bits.
pub(crate) const WORKSPACE_MODE: u32 = mode(Category::Owner, Op::Read)
    | mode(Category::Owner, Op::Write)
    | mode(Category::Owner, Op::Exec)
    | mode(Category::Group, Op::Read)
    | mode(Category::Group, Op::Exec)
    | mode(Category::World, Op::Read)
    | mode(Category::World, Op::Exec);

const WORKSPACE_PREFIX: &str = "setfsuid04";

/// Look up the account the fsuid is switched to, by name or as `#<uid>`.
pub(crate) fn resolve_unprivileged_identity(name: &str) -> Result<User, Error> {
    let user = if let Some(uid) = name.strip_prefix('#') {
        let uid = uid
            .parse::<UserId>()
            .map_err(|_| Error::UserNotFound(name.to_string()))?;
        User::from_uid(uid)?
    } else {
        let name_c = CString::new(name).map_err(|_| Error::StringValidation(name.to_string()))?;
        User::from_name(&name_c)?
    };

    let user = user.ok_or_else(|| Error::UserNotFound(name.to_string()))?;
    if user.uid == UserId::ROOT {
        return Err(Error::Options(format!(
            "user '{}' is not an unprivileged account",
            user.name
        )));
    }

    Ok(user)
}

/// Returns the effective uid, which is the privileged identity of the run.
pub(crate) fn require_privileged_caller() -> Result<UserId, Error> {
    let euid = User::effective_uid();
    dev_debug!("euid {euid}, ruid {}", User::real_uid());
    require_root(euid)?;
    Ok(euid)
}

pub(crate) fn create_isolated_workspace(root: &Path) -> Result<TempDir, Error> {
    let workspace_error = |err| Error::Workspace(root.to_owned(), err);

    let workspace = TempDir::create(root, WORKSPACE_PREFIX).map_err(workspace_error)?;
    std::fs::set_permissions(workspace.path(), Permissions::from_mode(WORKSPACE_MODE))
        .map_err(workspace_error)?;

    Ok(workspace)
}

pub(crate) fn artifact_path(workspace: &Path, pid: ProcessId) -> PathBuf {
    workspace.join(format!("setfsuid04file{pid}.tst"))
}

/// The file the probes try to open, together with its attributes at creation time.
#[derive(Debug)]
pub(crate) struct Artifact {
    path: PathBuf,
    // held open until teardown
    file: File,
    attributes: FileAttributes,
}

impl Artifact {
    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn attributes(&self) -> FileAttributes {
        self.attributes
    }

    fn remove(self) -> io::Result<()> {
        let Artifact { path, file, .. } = self;
        drop(file);
        std::fs::remove_file(path)
    }
}

pub(crate) fn create_test_artifact(path: &Path) -> Result<Artifact, Error> {
    let artifact_error = |err| Error::Artifact(path.to_owned(), err);

    let file = create_exclusive(path, ARTIFACT_MODE).map_err(artifact_error)?;
    let attributes = FileAttributes::of(path).map_err(artifact_error)?;
    dev_debug!("created {} with {attributes:?}", path.display());

    Ok(Artifact {
        path: path.to_owned(),
        file,
        attributes,
    })
}

/// The identities and filesystem state shared by every iteration of a run.
#[derive(Debug)]
pub(crate) struct Fixture {
    pub(crate) unprivileged: User,
    pub(crate) privileged: UserId,
    // dropped before the workspace that contains it
    pub(crate) artifact: Artifact,
    workspace: TempDir,
}

impl Fixture {
    /// Resolve the unprivileged account, check the caller is root and create the artifact.
    ///
    /// The account is resolved first so that a bad account aborts before anything is created
    /// on disk. Whatever was created is removed again when a later step fails.
    pub(crate) fn setup(context: &SetfsuidContext) -> Result<Fixture, Error> {
        let unprivileged = resolve_unprivileged_identity(&context.user)?;
        let privileged = require_privileged_caller()?;
        let workspace = create_isolated_workspace(&context.tmp_root)?;
        let artifact = create_test_artifact(&artifact_path(workspace.path(), context.pid))?;

        Ok(Fixture {
            unprivileged,
            privileged,
            artifact,
            workspace,
        })
    }

    /// Returns the current attributes of the artifact if they differ from those it was
    /// created with.
    pub(crate) fn artifact_changes(&self) -> Result<Option<FileAttributes>, Error> {
        let path = self.artifact.path();
        let current =
            FileAttributes::of(path).map_err(|err| Error::Io(Some(path.to_owned()), err))?;

        if current == self.artifact.attributes() {
            Ok(None)
        } else {
            Ok(Some(current))
        }
    }

    pub(crate) fn teardown(self) -> Result<(), Error> {
        let Fixture {
            artifact,
            workspace,
            ..
        } = self;

        let artifact_path = artifact.path().to_owned();
        artifact
            .remove()
            .map_err(|err| Error::Io(Some(artifact_path), err))?;

        let workspace_path = workspace.path().to_owned();
        workspace
            .remove()
            .map_err(|err| Error::Io(Some(workspace_path), err))
    }
}
