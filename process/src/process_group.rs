use crate::table::{ProcessTable, TableError};
use crate::{INIT_PID, Pid};
use alloc::vec::Vec;

/// A snapshot of the processes sharing one process group id.
///
/// Groups are not stored: a group exists exactly as long as some table entry,
/// live or zombie, carries its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessGroup {
    pgid: Pid,
    processes: Vec<Pid>,
}

impl ProcessGroup {
    /// Get process group id
    pub fn get_pgid(&self) -> Pid {
        self.pgid
    }

    /// Member pids in ascending order, zombies included.
    pub fn get_processes(&self) -> &[Pid] {
        &self.processes
    }

    /// Get the leader process of the process group
    /// Return `None` if the leader has been collected
    pub fn get_leader(&self) -> Option<Pid> {
        // "leader" process is the process with the same id as the process group id
        self.processes.binary_search(&self.pgid).ok().map(|_| self.pgid)
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }
}

impl ProcessTable {
    pub fn get_process_group(&self, pgid: Pid) -> Option<ProcessGroup> {
        let processes: Vec<Pid> = self
            .iter()
            .filter(|p| p.get_pgid() == pgid)
            .map(|p| p.get_pid())
            .collect();
        if processes.is_empty() {
            None
        } else {
            Some(ProcessGroup { pgid, processes })
        }
    }

    pub fn group_exists(&self, pgid: Pid) -> bool {
        self.iter().any(|p| p.get_pgid() == pgid)
    }

    /// Make `pid` the leader of a new process group in its session.
    /// Returns the group id; a process that already leads its group keeps it.
    pub fn create_group(&mut self, pid: Pid) -> Result<Pid, TableError> {
        let process = self.get(pid).ok_or(TableError::NoSuchProcess(pid))?;
        if process.is_group_leader() {
            return Ok(pid);
        }
        if process.is_session_leader() {
            return Err(TableError::SessionLeader(pid));
        }
        if self.group_exists(pid) {
            // a collected leader's id is still held by its surviving members
            return Err(TableError::Exists(pid));
        }
        if let Some(process) = self.get_mut(pid) {
            process.set_pgid(pid);
        }
        Ok(pid)
    }

    /// Move `pid` into the existing group `pgid` of its own session.
    pub fn move_to_group(&mut self, pid: Pid, pgid: Pid) -> Result<(), TableError> {
        if pid == pgid {
            return self.create_group(pid).map(|_| ());
        }
        let process = self.get(pid).ok_or(TableError::NoSuchProcess(pid))?;
        if process.is_session_leader() {
            // session leader cannot move to another group
            return Err(TableError::SessionLeader(pid));
        }
        let sid = process.get_sid();
        let in_session = self
            .iter()
            .any(|p| p.get_pgid() == pgid && p.get_sid() == sid);
        if !in_session {
            // group does not exist, or lives in a different session
            return Err(TableError::NoSuchGroup(pgid));
        }
        if let Some(process) = self.get_mut(pid) {
            process.set_pgid(pgid);
        }
        Ok(())
    }

    /// Whether group `pgid` would be orphaned once `exiting` is gone.
    ///
    /// A group is orphaned when no live member has a parent in a different
    /// group of the same session. Init does not count as such a parent.
    pub fn is_orphaned_group(&self, pgid: Pid, exiting: Option<Pid>) -> bool {
        !self
            .iter()
            .filter(|p| p.get_pgid() == pgid && !p.is_zombie() && Some(p.get_pid()) != exiting)
            .any(|p| {
                let ppid = p.get_ppid();
                if ppid == INIT_PID || Some(ppid) == exiting {
                    return false;
                }
                self.get(ppid)
                    .is_some_and(|parent| parent.get_pgid() != pgid && parent.get_sid() == p.get_sid())
            })
    }

    pub fn has_stopped_members(&self, pgid: Pid) -> bool {
        self.iter().any(|p| p.get_pgid() == pgid && p.is_stopped())
    }
}

#[cfg(test)]
mod tests {
    use crate::cred::Credentials;
    use crate::signal::Signo;
    use crate::table::{MAX_TASKS, ProcessTable, TableError};
    use crate::INIT_PID;

    /// init(1) -> shell(10, session leader) -> job(11) -> worker(12)
    fn job_table() -> ProcessTable {
        let mut table = ProcessTable::new(MAX_TASKS);
        table.spawn_process(Credentials::root()).unwrap();
        table.spawn_with_pid(10, INIT_PID, Credentials::new(100, 100)).unwrap();
        table.fork_with_pid(10, 11).unwrap();
        table.fork_with_pid(11, 12).unwrap();
        table.create_group(11).unwrap();
        table.move_to_group(12, 11).unwrap();
        table
    }

    #[test]
    fn group_view_lists_members_in_order() {
        let table = job_table();
        let group = table.get_process_group(11).unwrap();
        assert_eq!(group.get_processes(), &[11, 12]);
        assert_eq!(group.get_leader(), Some(11));
        assert!(table.get_process_group(99).is_none());
    }

    #[test]
    fn session_leader_cannot_change_group() {
        let mut table = job_table();
        assert_eq!(table.move_to_group(10, 11), Err(TableError::SessionLeader(10)));
    }

    #[test]
    fn cannot_join_group_of_other_session() {
        let mut table = job_table();
        // init's group 1 lives in session 1
        assert_eq!(table.move_to_group(12, INIT_PID), Err(TableError::NoSuchGroup(1)));
    }

    #[test]
    fn orphaned_when_linking_parent_exits() {
        let table = job_table();
        // the job group is held to the session by the shell
        assert!(!table.is_orphaned_group(11, None));
        assert!(table.is_orphaned_group(11, Some(10)));
    }

    #[test]
    fn stopped_members_are_reported() {
        let mut table = job_table();
        assert!(!table.has_stopped_members(11));
        table.get_mut(12).unwrap().deliver(Signo::SIGSTOP);
        assert!(table.has_stopped_members(11));
    }
}
