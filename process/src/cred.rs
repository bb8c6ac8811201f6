//! Process credentials.
//! See https://man7.org/linux/man-pages/man7/credentials.7.html for more details.

use alloc::vec::Vec;

pub type Uid = u32;
pub type Gid = u32;

/// The reserved user id with every privilege.
pub const ROOT_UID: Uid = 0;

/// Maximum number of supplementary groups a process may carry.
pub const NGROUPS: usize = 13;

/// Credential snapshot of a process.
///
/// Set at process creation and copied on fork. Nothing in the kernel core
/// changes it afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub uid: Uid,
    pub euid: Uid,
    pub gid: Gid,
    pub egid: Gid,
    groups: Vec<Gid>,
}

impl Credentials {
    pub fn new(uid: Uid, gid: Gid) -> Self {
        Self {
            uid,
            euid: uid,
            gid,
            egid: gid,
            groups: Vec::new(),
        }
    }

    pub fn root() -> Self {
        Self::new(ROOT_UID, 0)
    }

    /// Replace the supplementary group list, keeping at most [`NGROUPS`] entries.
    pub fn with_groups(mut self, groups: &[Gid]) -> Self {
        self.groups = groups.iter().copied().take(NGROUPS).collect();
        self
    }

    pub fn with_effective(mut self, euid: Uid, egid: Gid) -> Self {
        self.euid = euid;
        self.egid = egid;
        self
    }

    pub fn groups(&self) -> &[Gid] {
        &self.groups
    }

    /// Whether the effective user id is the superuser.
    ///
    /// Check this last: do the normal permission checks first and use this
    /// only as an override, so that privilege use can later be accounted for.
    pub fn is_superuser(&self) -> bool {
        self.euid == ROOT_UID
    }

    /// Whether `gid` is the effective group or one of the supplementary groups.
    pub fn in_group(&self, gid: Gid) -> bool {
        self.egid == gid || self.groups.contains(&gid)
    }

    /// Whether a process with these credentials may signal one holding `target`.
    pub fn can_signal(&self, target: &Credentials) -> bool {
        let same_user = [self.uid, self.euid]
            .iter()
            .any(|id| *id == target.uid || *id == target.euid);
        same_user || self.is_superuser()
    }
}
