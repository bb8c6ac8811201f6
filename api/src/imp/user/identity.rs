use rmk_core::Kernel;
use rmk_process::Gid;

/// Whether the calling process runs with the superuser's effective user id.
///
/// This is an override, not a permission check: evaluate the ordinary
/// permission for the resource first and call this last, so that privilege
/// use can be accounted for later.
pub fn is_superuser(kernel: &Kernel) -> bool {
    kernel
        .current_cred()
        .is_ok_and(|cred| cred.is_superuser())
}

/// Whether `gid` is the calling process's effective group or one of its
/// supplementary groups.
pub fn is_in_group(kernel: &Kernel, gid: Gid) -> bool {
    kernel.current_cred().is_ok_and(|cred| cred.in_group(gid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmk_process::{Credentials, INIT_PID};

    #[test]
    fn superuser_follows_effective_uid() {
        let (_, kernel) = rmk_hal_mock::boot();
        assert!(is_superuser(&kernel));

        let pid = kernel
            .table()
            .spawn_with_pid(30, INIT_PID, Credentials::new(u32::MAX, 5))
            .unwrap();
        kernel.set_current(pid);
        assert!(!is_superuser(&kernel));
    }

    #[test]
    fn group_membership() {
        let (_, kernel) = rmk_hal_mock::boot();
        let cred = Credentials::new(100, 50);
        kernel.table().spawn_with_pid(20, INIT_PID, cred.clone()).unwrap();
        kernel
            .table()
            .spawn_with_pid(21, INIT_PID, cred.with_groups(&[7]))
            .unwrap();

        kernel.set_current(20);
        assert!(is_in_group(&kernel, 50));
        assert!(!is_in_group(&kernel, 7));

        kernel.set_current(21);
        assert!(is_in_group(&kernel, 7));
        assert!(is_in_group(&kernel, 50));
    }

    #[test]
    fn no_current_process_means_no_privilege() {
        let (_, kernel) = rmk_hal_mock::boot();
        kernel.set_current(999);
        assert!(!is_superuser(&kernel));
        assert!(!is_in_group(&kernel, 0));
    }
}
