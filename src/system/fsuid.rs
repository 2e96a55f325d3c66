//! The filesystem user ID: the identity the kernel uses for file permission checks.
//!
//! The fsuid is a per-thread credential on Linux. Callers are expected to be single threaded,
//! or at least to perform the change and the access it gates on the same thread.
use crate::common::Error;

use super::interface::UserId;

// `(uid_t) -1` is never a valid id, so passing it leaves the fsuid untouched and only
// reports the active value.
const QUERY: libc::uid_t = libc::uid_t::MAX;

/// Return the filesystem user ID currently active for the calling thread.
pub fn current_fsuid() -> UserId {
    // SAFETY: setfsuid has no memory safety requirements; QUERY never changes the credential.
    UserId::new(unsafe { libc::setfsuid(QUERY) } as libc::uid_t)
}

/// Set the filesystem user ID and return the previous one.
///
/// `setfsuid(2)` never reports failure, it just returns the previous value. Success is
/// therefore confirmed by reading the active value back.
pub fn set_fsuid(uid: UserId) -> Result<UserId, Error> {
    // SAFETY: setfsuid has no memory safety requirements.
    let previous = UserId::new(unsafe { libc::setfsuid(uid.get()) } as libc::uid_t);

    let active = current_fsuid();
    if active != uid {
        return Err(Error::FsuidTransition {
            requested: uid,
            active,
        });
    }

    Ok(previous)
}

#[cfg(test)]
mod tests {
    use super::{current_fsuid, set_fsuid};
    use crate::common::Error;
    use crate::system::{
        _exit, fork, interface::UserId, wait::Wait, wait::WaitOptions, ForkResult, User,
    };

    #[test]
    fn fsuid_follows_the_effective_uid() {
        assert_eq!(current_fsuid(), User::effective_uid());
    }

    #[test]
    fn setting_own_fsuid_is_a_no_op() {
        let euid = User::effective_uid();
        assert_eq!(set_fsuid(euid).unwrap(), euid);
        assert_eq!(current_fsuid(), euid);
    }

    #[test]
    fn unprivileged_callers_cannot_pick_an_arbitrary_fsuid() {
        if User::effective_uid() == UserId::ROOT {
            return;
        }

        let Err(Error::FsuidTransition { requested, active }) = set_fsuid(UserId::ROOT) else {
            panic!("an unprivileged process should not be able to switch its fsuid to root");
        };
        assert_eq!(requested, UserId::ROOT);
        assert_eq!(active, User::effective_uid());
    }

    #[test]
    #[ignore = "needs root"]
    fn root_switches_back_and_forth() {
        let ForkResult::Parent(child) = fork().unwrap() else {
            let nobody = UserId::new(65534);
            let ok = set_fsuid(nobody).is_ok_and(|previous| previous == UserId::ROOT)
                && current_fsuid() == nobody
                && User::effective_uid() == UserId::ROOT
                && set_fsuid(UserId::ROOT).is_ok_and(|previous| previous == nobody);
            _exit(if ok { 0 } else { 1 });
        };

        let (_, status) = child.wait(WaitOptions::new()).unwrap();
        assert_eq!(status.exit_status(), Some(0));
    }
}
