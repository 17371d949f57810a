use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

#[cfg(feature = "cli")]
use std::sync::Mutex;
#[cfg(feature = "cli")]
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

/// 單次渲染的統計快照
#[derive(Debug, Clone)]
pub struct RunStats {
    pub frames_generated: usize,
    pub frames_reused: usize,
    pub retries: usize,
    pub elapsed_time: Duration,
    pub cpu_usage: Option<f32>,
    pub memory_usage_mb: Option<u64>,
    pub peak_memory_mb: Option<u64>,
}

/// 追蹤渲染進度，啟用時另外取樣本行程的 CPU 與記憶體
pub struct RunMonitor {
    start_time: Instant,
    frames_generated: AtomicUsize,
    frames_reused: AtomicUsize,
    retries: AtomicUsize,
    #[cfg(feature = "cli")]
    process: Option<Mutex<ProcessProbe>>,
}

#[cfg(feature = "cli")]
struct ProcessProbe {
    system: System,
    pid: Pid,
    peak_memory_mb: u64,
}

#[cfg(feature = "cli")]
impl ProcessProbe {
    fn new() -> Option<Self> {
        let pid = sysinfo::get_current_pid().ok()?;
        let mut system = System::new();
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::everything(),
        );
        Some(Self {
            system,
            pid,
            peak_memory_mb: 0,
        })
    }

    fn sample(&mut self) -> Option<(f32, u64, u64)> {
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[self.pid]),
            true,
            ProcessRefreshKind::everything(),
        );
        let process = self.system.process(self.pid)?;
        let memory_mb = process.memory() / 1024 / 1024;
        self.peak_memory_mb = self.peak_memory_mb.max(memory_mb);
        Some((process.cpu_usage(), memory_mb, self.peak_memory_mb))
    }
}

impl RunMonitor {
    pub fn new(system_stats: bool) -> Self {
        #[cfg(not(feature = "cli"))]
        let _ = system_stats;

        Self {
            start_time: Instant::now(),
            frames_generated: AtomicUsize::new(0),
            frames_reused: AtomicUsize::new(0),
            retries: AtomicUsize::new(0),
            #[cfg(feature = "cli")]
            process: if system_stats {
                ProcessProbe::new().map(Mutex::new)
            } else {
                None
            },
        }
    }

    pub fn record_generated(&self) {
        self.frames_generated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reused(&self) {
        self.frames_reused.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn is_system_stats_enabled(&self) -> bool {
        #[cfg(feature = "cli")]
        {
            self.process.is_some()
        }
        #[cfg(not(feature = "cli"))]
        {
            false
        }
    }

    pub fn stats(&self) -> RunStats {
        let mut stats = RunStats {
            frames_generated: self.frames_generated.load(Ordering::Relaxed),
            frames_reused: self.frames_reused.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            elapsed_time: self.start_time.elapsed(),
            cpu_usage: None,
            memory_usage_mb: None,
            peak_memory_mb: None,
        };

        #[cfg(feature = "cli")]
        if let Some(probe) = &self.process {
            if let Some((cpu, memory, peak)) = probe.lock().ok().and_then(|mut p| p.sample()) {
                stats.cpu_usage = Some(cpu);
                stats.memory_usage_mb = Some(memory);
                stats.peak_memory_mb = Some(peak);
            }
        }

        stats
    }

    pub fn log_stats(&self, phase: &str) {
        let stats = self.stats();
        match (stats.cpu_usage, stats.memory_usage_mb, stats.peak_memory_mb) {
            (Some(cpu), Some(memory), Some(peak)) => tracing::info!(
                "📊 {} - CPU: {:.1}%, Memory: {}MB, Peak: {}MB, Time: {:?}",
                phase,
                cpu,
                memory,
                peak,
                stats.elapsed_time
            ),
            _ => tracing::debug!("📊 {} - Time: {:?}", phase, stats.elapsed_time),
        }
    }

    pub fn log_final_stats(&self) {
        let stats = self.stats();
        tracing::info!(
            "📊 Final Stats - Generated: {}, Reused: {}, Retries: {}, Total Time: {:?}",
            stats.frames_generated,
            stats.frames_reused,
            stats.retries,
            stats.elapsed_time
        );
        if let Some(peak) = stats.peak_memory_mb {
            tracing::info!("📊 Peak Memory: {}MB", peak);
        }
    }
}

impl Default for RunMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let monitor = RunMonitor::default();
        monitor.record_generated();
        monitor.record_generated();
        monitor.record_reused();
        monitor.record_retry();

        let stats = monitor.stats();
        assert_eq!(stats.frames_generated, 2);
        assert_eq!(stats.frames_reused, 1);
        assert_eq!(stats.retries, 1);
        assert!(stats.cpu_usage.is_none());
        assert!(!monitor.is_system_stats_enabled());
    }
}
