use crate::config::BootParams;
use crate::error::KernelResult;
use crate::hal::Hal;
use crate::kernel::Kernel;
use alloc::sync::Arc;
use rmk_process::{Credentials, INIT_PID};

/// Bring the kernel core up: fix the CPU level and boot flags, then create
/// `init` and make it the current process.
pub fn boot(params: &BootParams, hal: Arc<dyn Hal>) -> KernelResult<Kernel> {
    let level = params.cpu.unwrap_or_else(|| hal.cpu_level());
    let kernel = Kernel::new(params, level, hal);
    kernel.printk(format_args!(
        "CPU {}{}, {} task slots",
        level,
        if params.running_qemu { " (QEMU)" } else { "" },
        params.max_tasks
    ));
    if params.debug_level > 0 {
        kernel.printk(format_args!("debug level {}", params.debug_level));
    }
    if params.pause {
        kernel.printk(format_args!("Press any key to continue"));
        kernel.hal().wait_for_keypress();
    }

    let init = kernel.table().spawn_process(Credentials::root())?;
    if init != INIT_PID {
        kernel.fatal(format_args!("init started as pid {}", init));
    }
    kernel.set_current(init);
    info!("[task manager] init is pid {}", init);
    Ok(kernel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::CpuLevel;
    use crate::hal::tests::StubHal;

    #[test]
    fn boot_probes_cpu_and_spawns_init() {
        let hal = Arc::new(StubHal::default());
        let kernel = boot(&BootParams::default(), hal.clone()).unwrap();
        assert_eq!(kernel.cpu().level(), CpuLevel::I8086);
        assert_eq!(kernel.current_pid(), INIT_PID);
        let table = kernel.table();
        let init = table.get(INIT_PID).unwrap();
        assert!(init.is_session_leader() && init.is_group_leader());
        assert!(hal.console().starts_with("CPU 8086, 16 task slots\n"));
    }

    #[test]
    fn forced_cpu_level_wins() {
        let params = BootParams::parse("cpu=7 qemu debug=1");
        let kernel = boot(&params, Arc::new(StubHal::default())).unwrap();
        assert_eq!(kernel.cpu().level(), CpuLevel::I80386);
        assert!(kernel.diag().contains("CPU 80386+ (QEMU)"));
        assert!(kernel.diag().contains("debug level 1"));
    }
}
