use crate::cred::Credentials;
use crate::process::Process;
use crate::session::Session;
use crate::{INIT_PID, Pid};
use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::fmt;

/// Default number of process slots.
pub const MAX_TASKS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableError {
    /// Every slot is taken.
    Full,
    /// No entry with the given pid.
    NoSuchProcess(Pid),
    /// The entry has not exited yet.
    NotZombie(Pid),
    /// The pid is already in use.
    Exists(Pid),
    /// No live or zombie entry carries this process group id.
    NoSuchGroup(Pid),
    /// No session record with this id.
    NoSuchSession(Pid),
    /// The process leads its session and may not leave it.
    SessionLeader(Pid),
    /// The process leads a process group.
    GroupLeader(Pid),
    /// The operation needs the session leader.
    NotSessionLeader(Pid),
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableError::Full => write!(f, "process table full"),
            TableError::NoSuchProcess(pid) => write!(f, "no process {}", pid),
            TableError::NotZombie(pid) => write!(f, "process {} has not exited", pid),
            TableError::Exists(pid) => write!(f, "id {} already in use", pid),
            TableError::NoSuchGroup(pgid) => write!(f, "no process group {}", pgid),
            TableError::NoSuchSession(sid) => write!(f, "no session {}", sid),
            TableError::SessionLeader(pid) => write!(f, "process {} is a session leader", pid),
            TableError::GroupLeader(pid) => write!(f, "process {} is a group leader", pid),
            TableError::NotSessionLeader(pid) => {
                write!(f, "process {} is not a session leader", pid)
            }
        }
    }
}

/// Every process known to the kernel, live or zombie, keyed by pid.
///
/// Iteration is always in ascending pid order, so any walk over the table is
/// reproducible for a given table snapshot.
pub struct ProcessTable {
    processes: BTreeMap<Pid, Process>,
    pub(crate) sessions: BTreeMap<Pid, Session>,
    next_pid: Pid,
    capacity: usize,
}

impl ProcessTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            processes: BTreeMap::new(),
            sessions: BTreeMap::new(),
            next_pid: INIT_PID,
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    /// A pid stays taken while a process, a process group or a session
    /// record still carries it.
    fn id_in_use(&self, pid: Pid) -> bool {
        self.processes.contains_key(&pid)
            || self.sessions.contains_key(&pid)
            || self.group_exists(pid)
    }

    fn generate_next_pid(&mut self) -> Pid {
        while self.id_in_use(self.next_pid) {
            self.next_pid = self.next_pid.wrapping_add(1).max(INIT_PID);
        }
        let pid = self.next_pid;
        self.next_pid = self.next_pid.wrapping_add(1).max(INIT_PID);
        pid
    }

    /// Spawn a "newborn" process without parent, like `init`. It leads its
    /// own session and process group.
    pub fn spawn_process(&mut self, cred: Credentials) -> Result<Pid, TableError> {
        if self.processes.len() >= self.capacity {
            return Err(TableError::Full);
        }
        let pid = self.generate_next_pid();
        self.insert_leader(pid, 0, cred)?;
        Ok(pid)
    }

    /// Insert a session and group leader with a fixed pid.
    pub fn spawn_with_pid(
        &mut self,
        pid: Pid,
        ppid: Pid,
        cred: Credentials,
    ) -> Result<Pid, TableError> {
        if self.processes.len() >= self.capacity {
            return Err(TableError::Full);
        }
        if self.id_in_use(pid) {
            return Err(TableError::Exists(pid));
        }
        self.insert_leader(pid, ppid, cred)?;
        Ok(pid)
    }

    fn insert_leader(&mut self, pid: Pid, ppid: Pid, cred: Credentials) -> Result<(), TableError> {
        if ppid != 0 && !self.processes.contains_key(&ppid) {
            return Err(TableError::NoSuchProcess(ppid));
        }
        self.processes
            .insert(pid, Process::new(pid, ppid, pid, pid, cred));
        self.sessions.insert(pid, Session::new(pid));
        Ok(())
    }

    /// Duplicate `parent` into a new child. The child shares the parent's
    /// process group, session, credentials and terminal.
    pub fn fork(&mut self, parent: Pid) -> Result<Pid, TableError> {
        if self.processes.len() >= self.capacity {
            return Err(TableError::Full);
        }
        if !self.processes.get(&parent).is_some_and(|p| !p.is_zombie()) {
            return Err(TableError::NoSuchProcess(parent));
        }
        let pid = self.generate_next_pid();
        let child = self
            .processes
            .get(&parent)
            .ok_or(TableError::NoSuchProcess(parent))?
            .fork(pid);
        self.processes.insert(pid, child);
        Ok(pid)
    }

    /// Like [`fork`](Self::fork), with the child's pid chosen by the caller.
    pub fn fork_with_pid(&mut self, parent: Pid, pid: Pid) -> Result<Pid, TableError> {
        if self.processes.len() >= self.capacity {
            return Err(TableError::Full);
        }
        if self.id_in_use(pid) {
            return Err(TableError::Exists(pid));
        }
        let parent_proc = self
            .processes
            .get(&parent)
            .ok_or(TableError::NoSuchProcess(parent))?;
        let child = parent_proc.fork(pid);
        self.processes.insert(pid, child);
        Ok(pid)
    }

    pub fn get(&self, pid: Pid) -> Option<&Process> {
        self.processes.get(&pid)
    }

    pub fn get_mut(&mut self, pid: Pid) -> Option<&mut Process> {
        self.processes.get_mut(&pid)
    }

    pub fn contains(&self, pid: Pid) -> bool {
        self.processes.contains_key(&pid)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Process> {
        self.processes.values()
    }

    pub fn pids(&self) -> Vec<Pid> {
        self.processes.keys().copied().collect()
    }

    pub fn get_children(&self, pid: Pid) -> Vec<Pid> {
        self.processes
            .values()
            .filter(|p| p.get_ppid() == pid && p.get_pid() != pid)
            .map(Process::get_pid)
            .collect()
    }

    /// Hand every child of `pid` over to `reaper`.
    ///
    /// Returns the moved children in ascending pid order.
    pub fn reparent_children(&mut self, pid: Pid, reaper: Pid) -> Vec<Pid> {
        let children = self.get_children(pid);
        for child in &children {
            if let Some(child) = self.processes.get_mut(child) {
                child.set_ppid(reaper);
            }
        }
        children
    }

    /// Make `ppid` the parent of `pid`. Both must be in the table.
    pub fn set_parent(&mut self, pid: Pid, ppid: Pid) -> Result<(), TableError> {
        if !self.processes.contains_key(&ppid) {
            return Err(TableError::NoSuchProcess(ppid));
        }
        let process = self
            .processes
            .get_mut(&pid)
            .ok_or(TableError::NoSuchProcess(pid))?;
        process.set_ppid(ppid);
        Ok(())
    }

    /// Turn a live process into a zombie holding `exit_code`.
    pub fn mark_zombie(&mut self, pid: Pid, exit_code: i32) -> Result<(), TableError> {
        let process = self
            .processes
            .get_mut(&pid)
            .ok_or(TableError::NoSuchProcess(pid))?;
        process.set_zombie(exit_code);
        Ok(())
    }

    /// Reclaim the slot of an exited process once its status is collected.
    ///
    /// Drops the session record when no remaining entry belongs to it.
    pub fn release(&mut self, pid: Pid) -> Result<Process, TableError> {
        match self.processes.get(&pid) {
            None => return Err(TableError::NoSuchProcess(pid)),
            Some(p) if !p.is_zombie() => return Err(TableError::NotZombie(pid)),
            Some(_) => {}
        }
        let process = self
            .processes
            .remove(&pid)
            .ok_or(TableError::NoSuchProcess(pid))?;
        let sid = process.get_sid();
        if !self.processes.values().any(|p| p.get_sid() == sid) {
            self.sessions.remove(&sid);
        }
        debug!("[process] released process {}", pid);
        Ok(process)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with_init() -> ProcessTable {
        let mut table = ProcessTable::new(MAX_TASKS);
        let init = table.spawn_process(Credentials::root()).unwrap();
        assert_eq!(init, INIT_PID);
        table
    }

    #[test]
    fn fork_inherits_group_session_and_creds() {
        let mut table = table_with_init();
        let child = table.fork(INIT_PID).unwrap();
        let child = table.get(child).unwrap();
        assert_eq!(child.get_ppid(), INIT_PID);
        assert_eq!(child.get_pgid(), INIT_PID);
        assert_eq!(child.get_sid(), INIT_PID);
        assert!(child.get_cred().is_superuser());
    }

    #[test]
    fn fork_fails_when_full() {
        let mut table = ProcessTable::new(2);
        table.spawn_process(Credentials::root()).unwrap();
        table.fork(INIT_PID).unwrap();
        assert_eq!(table.fork(INIT_PID), Err(TableError::Full));
    }

    #[test]
    fn pids_are_not_reused_while_present() {
        let mut table = table_with_init();
        table.fork_with_pid(INIT_PID, 2).unwrap();
        let next = table.fork(INIT_PID).unwrap();
        assert_eq!(next, 3);
        assert_eq!(table.fork_with_pid(INIT_PID, 3), Err(TableError::Exists(3)));
    }

    #[test]
    fn surviving_group_keeps_its_id() {
        let mut table = table_with_init();
        table.spawn_with_pid(10, INIT_PID, Credentials::root()).unwrap();
        table.set_controlling_tty(10, 0x0401).unwrap();
        table.fork_with_pid(10, 11).unwrap();
        table.mark_zombie(10, 0).unwrap();
        table.release(10).unwrap();

        assert_eq!(
            table.spawn_with_pid(10, INIT_PID, Credentials::new(5, 5)),
            Err(TableError::Exists(10))
        );
        assert_eq!(table.fork_with_pid(INIT_PID, 10), Err(TableError::Exists(10)));
        assert_eq!(table.get_session(10).unwrap().get_tty(), Some(0x0401));
        assert_eq!(table.get(11).unwrap().get_pgid(), 10);

        table.next_pid = 10;
        assert_eq!(table.fork(INIT_PID), Ok(12));
    }

    #[test]
    fn reparent_moves_every_child() {
        let mut table = table_with_init();
        let parent = table.fork(INIT_PID).unwrap();
        let a = table.fork(parent).unwrap();
        let b = table.fork(parent).unwrap();
        let moved = table.reparent_children(parent, INIT_PID);
        assert_eq!(moved, alloc::vec![a, b]);
        assert!(table.get_children(parent).is_empty());
        assert_eq!(table.get(a).unwrap().get_ppid(), INIT_PID);
    }

    #[test]
    fn release_requires_zombie() {
        let mut table = table_with_init();
        let child = table.fork(INIT_PID).unwrap();
        assert_eq!(table.release(child).err(), Some(TableError::NotZombie(child)));
        table.mark_zombie(child, 7).unwrap();
        let gone = table.release(child).unwrap();
        assert_eq!(gone.get_exit_code(), 7);
        assert!(!table.contains(child));
        assert_eq!(table.release(child).err(), Some(TableError::NoSuchProcess(child)));
    }

    #[test]
    fn session_record_dropped_with_last_member() {
        let mut table = table_with_init();
        let leader = table.spawn_with_pid(10, INIT_PID, Credentials::root()).unwrap();
        assert!(table.get_session(leader).is_some());
        table.mark_zombie(leader, 0).unwrap();
        table.release(leader).unwrap();
        assert!(table.get_session(leader).is_none());
    }
}
