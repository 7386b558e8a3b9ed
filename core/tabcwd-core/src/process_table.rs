//! Process table inspection.

use crate::error::{CwdError, Result};
use crate::types::ProcessRecord;
use sysinfo::{Pid, ProcessRefreshKind, System, UpdateKind};

pub trait ProcessTable: Send + Sync {
    /// Processes whose parent is `parent_pid`, ordered by pid.
    fn children_of(&self, parent_pid: u32) -> Result<Vec<ProcessRecord>>;
}

/// Reads the live process table through sysinfo. Blocking; callers on the
/// async side run it on the blocking pool.
#[derive(Debug, Clone, Default)]
pub struct SysinfoProcessTable;

impl ProcessTable for SysinfoProcessTable {
    fn children_of(&self, parent_pid: u32) -> Result<Vec<ProcessRecord>> {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err(CwdError::ProcessTableUnavailable(format!(
                "process listing is not supported on {}",
                std::env::consts::OS
            )));
        }

        let mut sys = System::new();
        sys.refresh_processes_specifics(
            ProcessRefreshKind::new().with_exe(UpdateKind::OnlyIfNotSet),
        );

        if sys.process(Pid::from(parent_pid as usize)).is_none() {
            return Err(CwdError::ProcessGone { pid: parent_pid });
        }

        let records = sys.processes().values().map(|process| ProcessRecord {
            name: process.name().to_string(),
            executable_path: process.exe().map(|path| path.to_path_buf()),
            pid: process.pid().as_u32(),
            parent_pid: process.parent().map(|pid| pid.as_u32()),
        });
        Ok(children_of(records, parent_pid))
    }
}

/// Filters a process listing down to the children of `parent_pid`.
pub fn children_of(
    records: impl IntoIterator<Item = ProcessRecord>,
    parent_pid: u32,
) -> Vec<ProcessRecord> {
    let mut children = records
        .into_iter()
        .filter(|record| record.parent_pid == Some(parent_pid) && record.pid != parent_pid)
        .collect::<Vec<_>>();
    children.sort_by_key(|record| record.pid);
    children
}
