//! Process memory sampling

use sysinfo::{Pid, Process, System};

/// Samples the resident set size of the current process.
///
/// Strategies take a reading before and after inference and report the
/// growth as their memory delta.
pub struct MemoryProbe {
    system: System,
    pid: Option<Pid>,
}

impl MemoryProbe {
    #[must_use]
    pub fn new() -> Self {
        let pid = sysinfo::get_current_pid().ok();
        if pid.is_none() {
            tracing::debug!("Current PID unavailable, memory readings will be zero");
        }
        Self {
            system: System::new(),
            pid,
        }
    }

    /// Resident memory of this process in bytes, 0 when unavailable
    pub fn resident_bytes(&mut self) -> u64 {
        let Some(pid) = self.pid else {
            return 0;
        };
        if !self.system.refresh_process(pid) {
            return 0;
        }
        self.system.process(pid).map_or(0, Process::memory)
    }

    /// Growth in resident memory since `baseline`, saturating at zero
    pub fn delta_since(&mut self, baseline: u64) -> u64 {
        self.resident_bytes().saturating_sub(baseline)
    }
}

impl Default for MemoryProbe {
    fn default() -> Self {
        Self::new()
    }
}
