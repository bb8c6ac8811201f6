use crate::imp::task::signal::{Sender, hang_up_locked, signal_group_locked};
use alloc::vec::Vec;
use rmk_core::{Kernel, Transfer};
use rmk_process::{INIT_PID, Pid, ProcessTable, Signo};

/// Groups that lose their last link to a parent outside the group when `pid`
/// goes away, and that have stopped members which nobody could continue.
fn newly_orphaned_groups(table: &ProcessTable, pid: Pid) -> Vec<Pid> {
    let Some(process) = table.get(pid) else {
        return Vec::new();
    };
    let mut candidates = alloc::vec![process.get_pgid()];
    for child in table.get_children(pid) {
        if let Some(child) = table.get(child) {
            let pgid = child.get_pgid();
            if child.get_sid() == process.get_sid() && !candidates.contains(&pgid) {
                candidates.push(pgid);
            }
        }
    }
    candidates.retain(|&pgid| {
        !table.is_orphaned_group(pgid, None)
            && table.is_orphaned_group(pgid, Some(pid))
            && table.has_stopped_members(pgid)
    });
    candidates
}

/// Turn the calling process into a zombie and tell everyone who cares.
///
/// Resources go back to the platform first; one that is already gone is
/// logged and skipped. Children move to init, a session leader hangs up its
/// terminal, newly orphaned stopped groups get `SIGHUP` and `SIGCONT`, and
/// the parent gets `SIGCHLD`. The exiting process keeps its table slot until
/// the parent collects it.
///
/// Returns where the CPU must go next. Exiting init, or a process without a
/// parent, is a kernel inconsistency and halts.
pub fn exit_current(kernel: &Kernel, exit_code: i32) -> Transfer {
    let pid = kernel.current_pid();
    info!("[exit] process {} exiting with code {}", pid, exit_code);
    if pid == INIT_PID {
        kernel.fatal(format_args!("init exited with code {}", exit_code));
    }
    match kernel.table().get(pid) {
        Some(p) if !p.is_zombie() => {}
        Some(_) => kernel.fatal(format_args!("process {} exited twice", pid)),
        None => kernel.fatal(format_args!("exiting process {} not in table", pid)),
    }

    if let Err(missing) = kernel.hal().release_resources(pid) {
        kernel.printk(format_args!("exit: process {}: {}", pid, missing));
    }

    let mut table = kernel.table();
    let orphaned = newly_orphaned_groups(&table, pid);
    let (ppid, sid, leader) = match table.get(pid) {
        Some(p) => (p.get_ppid(), p.get_sid(), p.is_session_leader()),
        None => {
            drop(table);
            kernel.fatal(format_args!("exiting process {} vanished", pid))
        }
    };

    if let Err(err) = table.mark_zombie(pid, exit_code) {
        drop(table);
        kernel.fatal(format_args!("exit: {}", err));
    }

    for child in table.reparent_children(pid, INIT_PID) {
        debug!("[exit] process {} handed to init", child);
        if table.get(child).is_some_and(|c| c.is_zombie()) {
            kernel.deliver_locked(&mut table, INIT_PID, Signo::SIGCHLD);
        }
    }

    if leader {
        // a session without a terminal has nothing to hang up
        let _ = hang_up_locked(kernel, &mut table, sid, pid);
    }

    for pgid in orphaned {
        info!("[exit] process group {} orphaned while stopped", pgid);
        for sig in [Signo::SIGHUP, Signo::SIGCONT] {
            let _ = signal_group_locked(kernel, &mut table, Sender::Kernel, pgid, Some(sig), false);
        }
    }

    if !table.contains(ppid) {
        drop(table);
        kernel.fatal(format_args!("process {} has no parent {}", pid, ppid));
    }
    kernel.deliver_locked(&mut table, ppid, Signo::SIGCHLD);
    Transfer::Reschedule { from: pid }
}

/// Terminate the calling process with `exit_code` and schedule something
/// else. Never returns.
pub fn terminate_current(kernel: &Kernel, exit_code: i32) -> ! {
    let transfer = exit_current(kernel, exit_code);
    kernel.transfer(transfer)
}
