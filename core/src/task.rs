use crate::error::{KernelError, KernelResult};
use crate::kernel::Kernel;
use rmk_process::{Credentials, Delivery, Pid, ProcessTable, Signo};

impl Kernel {
    /// Snapshot of the calling process's credentials.
    ///
    /// Credentials never change after creation, so the copy stays valid
    /// after the table lock is dropped.
    pub fn current_cred(&self) -> KernelResult<Credentials> {
        let pid = self.current_pid();
        self.table()
            .get(pid)
            .map(|p| p.get_cred().clone())
            .ok_or(KernelError::NoSuchProcess)
    }

    /// Post `sig` to `pid` inside an already locked table and wake the target
    /// if the delivery made it runnable. A stop or continue of the target is
    /// announced to its parent with `SIGCHLD`.
    pub fn deliver_locked(&self, table: &mut ProcessTable, pid: Pid, sig: Signo) -> Delivery {
        let Some(process) = table.get_mut(pid) else {
            return Delivery::Dropped;
        };
        let was_stopped = process.is_stopped();
        let delivery = process.deliver(sig);
        let job_changed = match sig {
            Signo::SIGSTOP => !was_stopped && process.is_stopped(),
            Signo::SIGCONT => was_stopped,
            _ => false,
        };
        let ppid = process.get_ppid();
        match delivery {
            Delivery::Woken => {
                debug!("[signal] {} woke process {}", sig, pid);
                self.hal().wake(pid);
            }
            Delivery::Queued => trace!("[signal] {} queued for process {}", sig, pid),
            Delivery::Dropped => trace!("[signal] {} dropped for zombie {}", sig, pid),
        }
        if job_changed && ppid != 0 {
            self.deliver_locked(table, ppid, Signo::SIGCHLD);
        }
        delivery
    }

    /// Put the calling process to sleep until a signal or wakeup arrives.
    pub fn block_current(&self, interruptible: bool) {
        let pid = self.current_pid();
        if let Some(process) = self.table().get_mut(pid) {
            process.block(interruptible);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::BootParams;
    use crate::cpu::CpuLevel;
    use crate::hal::tests::StubHal;
    use crate::kernel::Kernel;
    use alloc::sync::Arc;
    use rmk_process::{Credentials, Delivery, INIT_PID, ProcessState, Signo};

    #[test]
    fn wake_reaches_the_scheduler() {
        let hal = Arc::new(StubHal::default());
        let kernel = Kernel::new(&BootParams::default(), CpuLevel::I8088, hal.clone());
        kernel.table().spawn_process(Credentials::root()).unwrap();
        kernel.block_current(true);
        assert_eq!(
            kernel.table().get(INIT_PID).unwrap().get_state(),
            ProcessState::Blocked { interruptible: true }
        );

        let mut table = kernel.table();
        assert_eq!(
            kernel.deliver_locked(&mut table, INIT_PID, Signo::SIGUSR1),
            Delivery::Woken
        );
        assert_eq!(kernel.deliver_locked(&mut table, 77, Signo::SIGUSR1), Delivery::Dropped);
        drop(table);
        assert_eq!(hal.woken(), [INIT_PID]);
        assert!(kernel.current_cred().unwrap().is_superuser());
    }

    #[test]
    fn parent_hears_of_stop_and_continue() {
        let hal = Arc::new(StubHal::default());
        let kernel = Kernel::new(&BootParams::default(), CpuLevel::I8088, hal.clone());
        let mut table = kernel.table();
        table.spawn_process(Credentials::root()).unwrap();
        let child = table.fork(INIT_PID).unwrap();
        table.get_mut(INIT_PID).unwrap().block(true);

        kernel.deliver_locked(&mut table, child, Signo::SIGSTOP);
        assert!(table.get(INIT_PID).unwrap().pending().contains(Signo::SIGCHLD));
        assert_eq!(table.get_mut(INIT_PID).unwrap().take_pending(), Some(Signo::SIGCHLD));

        // a second stop changes nothing
        kernel.deliver_locked(&mut table, child, Signo::SIGSTOP);
        assert!(table.get(INIT_PID).unwrap().pending().is_empty());

        assert_eq!(
            kernel.deliver_locked(&mut table, child, Signo::SIGCONT),
            Delivery::Woken
        );
        assert!(table.get(INIT_PID).unwrap().pending().contains(Signo::SIGCHLD));
        drop(table);
        assert_eq!(hal.woken(), [INIT_PID, child]);
    }
}
