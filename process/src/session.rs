use crate::table::{ProcessTable, TableError};
use crate::{DevT, Pid};
use alloc::vec::Vec;

/// Bookkeeping for one session. The leader's pid is the session id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    sid: Pid,
    tty: Option<DevT>,
    foreground: Option<Pid>,
    hung_up: bool,
}

/// Outcome of hanging up a session's controlling terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HangUp {
    /// The session was hung up before; nothing changed.
    AlreadyHungUp,
    /// The session never had a controlling terminal.
    NoTerminal,
    /// The terminal was detached from the session.
    Detached { tty: DevT, foreground: Option<Pid> },
}

impl Session {
    pub(crate) fn new(sid: Pid) -> Self {
        Self {
            sid,
            tty: None,
            foreground: None,
            hung_up: false,
        }
    }

    /// Get session id
    pub fn get_sid(&self) -> Pid {
        self.sid
    }

    pub fn get_tty(&self) -> Option<DevT> {
        self.tty
    }

    /// The foreground process group of the controlling terminal.
    pub fn get_foreground(&self) -> Option<Pid> {
        self.foreground
    }

    pub fn is_hung_up(&self) -> bool {
        self.hung_up
    }
}

impl ProcessTable {
    pub fn get_session(&self, sid: Pid) -> Option<&Session> {
        self.sessions.get(&sid)
    }

    pub fn get_session_members(&self, sid: Pid) -> Vec<Pid> {
        self.iter()
            .filter(|p| p.get_sid() == sid)
            .map(|p| p.get_pid())
            .collect()
    }

    /// Create a new session led by `pid`, which also becomes the leader of a
    /// new process group in it. Fails if `pid` already leads a group.
    pub fn create_session(&mut self, pid: Pid) -> Result<Pid, TableError> {
        let process = self.get(pid).ok_or(TableError::NoSuchProcess(pid))?;
        if process.is_group_leader() {
            return Err(TableError::GroupLeader(pid));
        }
        if self.group_exists(pid) || self.sessions.contains_key(&pid) {
            return Err(TableError::Exists(pid));
        }
        let old_sid = process.get_sid();
        if let Some(process) = self.get_mut(pid) {
            process.set_sid(pid);
            process.set_pgid(pid);
            process.set_tty(None);
        }
        self.sessions.insert(pid, Session::new(pid));
        if self.get_session_members(old_sid).is_empty() {
            self.sessions.remove(&old_sid);
        }
        Ok(pid)
    }

    /// Make `tty` the controlling terminal of the session led by `pid`.
    /// The leader's own group becomes the foreground group.
    pub fn set_controlling_tty(&mut self, pid: Pid, tty: DevT) -> Result<(), TableError> {
        let process = self.get(pid).ok_or(TableError::NoSuchProcess(pid))?;
        if !process.is_session_leader() {
            return Err(TableError::NotSessionLeader(pid));
        }
        let pgid = process.get_pgid();
        let session = self
            .sessions
            .get_mut(&pid)
            .ok_or(TableError::NoSuchSession(pid))?;
        if session.tty.is_some() {
            return Err(TableError::Exists(pid));
        }
        session.tty = Some(tty);
        session.foreground = Some(pgid);
        session.hung_up = false;
        for member in self.get_session_members(pid) {
            if let Some(member) = self.get_mut(member) {
                member.set_tty(Some(tty));
            }
        }
        Ok(())
    }

    /// Make `pgid` the foreground group of the terminal controlling `pid`'s session.
    pub fn set_foreground(&mut self, pid: Pid, pgid: Pid) -> Result<(), TableError> {
        let process = self.get(pid).ok_or(TableError::NoSuchProcess(pid))?;
        let sid = process.get_sid();
        if process.get_tty().is_none() {
            return Err(TableError::NoSuchSession(sid));
        }
        let in_session = self
            .iter()
            .any(|p| p.get_pgid() == pgid && p.get_sid() == sid);
        if !in_session {
            return Err(TableError::NoSuchGroup(pgid));
        }
        let session = self
            .sessions
            .get_mut(&sid)
            .ok_or(TableError::NoSuchSession(sid))?;
        session.foreground = Some(pgid);
        Ok(())
    }

    /// Detach the controlling terminal from session `sid` and mark it hung up.
    ///
    /// Hanging up twice is harmless: the second call reports `AlreadyHungUp`.
    pub fn hang_up_session(&mut self, sid: Pid) -> Result<HangUp, TableError> {
        let session = self
            .sessions
            .get_mut(&sid)
            .ok_or(TableError::NoSuchSession(sid))?;
        if session.hung_up {
            return Ok(HangUp::AlreadyHungUp);
        }
        let Some(tty) = session.tty.take() else {
            return Ok(HangUp::NoTerminal);
        };
        session.hung_up = true;
        let foreground = session.foreground.take();
        for member in self.get_session_members(sid) {
            if let Some(member) = self.get_mut(member) {
                member.set_tty(None);
            }
        }
        Ok(HangUp::Detached { tty, foreground })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::INIT_PID;
    use crate::cred::Credentials;
    use crate::table::MAX_TASKS;

    const TTY1: DevT = 0x0401;

    fn login_table() -> ProcessTable {
        let mut table = ProcessTable::new(MAX_TASKS);
        table.spawn_process(Credentials::root()).unwrap();
        table.spawn_with_pid(10, INIT_PID, Credentials::root()).unwrap();
        table.set_controlling_tty(10, TTY1).unwrap();
        table.fork_with_pid(10, 11).unwrap();
        table
    }

    #[test]
    fn setsid_requires_non_leader() {
        let mut table = login_table();
        assert_eq!(table.create_session(10), Err(TableError::GroupLeader(10)));
        assert_eq!(table.create_session(11), Ok(11));
        let p = table.get(11).unwrap();
        assert_eq!((p.get_sid(), p.get_pgid(), p.get_tty()), (11, 11, None));
        assert_eq!(table.get_session(11).unwrap().get_tty(), None);
    }

    #[test]
    fn children_inherit_controlling_tty() {
        let table = login_table();
        assert_eq!(table.get(11).unwrap().get_tty(), Some(TTY1));
        assert_eq!(table.get_session(10).unwrap().get_foreground(), Some(10));
    }

    #[test]
    fn only_leader_acquires_terminal() {
        let mut table = login_table();
        assert_eq!(
            table.set_controlling_tty(11, TTY1),
            Err(TableError::NotSessionLeader(11))
        );
    }

    #[test]
    fn foreground_group_must_be_in_session() {
        let mut table = login_table();
        table.create_group(11).unwrap();
        table.set_foreground(10, 11).unwrap();
        assert_eq!(table.get_session(10).unwrap().get_foreground(), Some(11));
        assert_eq!(table.set_foreground(10, INIT_PID), Err(TableError::NoSuchGroup(1)));
    }

    #[test]
    fn hang_up_is_idempotent() {
        let mut table = login_table();
        assert_eq!(
            table.hang_up_session(10),
            Ok(HangUp::Detached {
                tty: TTY1,
                foreground: Some(10)
            })
        );
        assert_eq!(table.get(11).unwrap().get_tty(), None);
        assert_eq!(table.hang_up_session(10), Ok(HangUp::AlreadyHungUp));
        assert!(table.get_session(10).unwrap().is_hung_up());
    }

    #[test]
    fn hang_up_without_terminal() {
        let mut table = login_table();
        table.create_session(11).unwrap();
        assert_eq!(table.hang_up_session(11), Ok(HangUp::NoTerminal));
        assert_eq!(table.hang_up_session(42), Err(TableError::NoSuchSession(42)));
    }
}
