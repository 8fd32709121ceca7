//! Background check-and-repair loop.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, info, warn};

use innledger_vault::Vault;

use crate::check::check_all;
use crate::repair::repair_all;

/// Runs a check-and-repair cycle on a named thread at a fixed interval.
///
/// `start` is idempotent; `stop` wakes the interval wait immediately and
/// joins the thread. Dropping a running monitor stops it.
pub struct IntegrityMonitor {
    shared: Arc<Shared>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

struct Shared {
    vault: Arc<Vault>,
    interval: Duration,
    stopped: Mutex<bool>,
    wake: Condvar,
}

impl IntegrityMonitor {
    /// A monitor over `vault` at the configured interval.
    #[must_use]
    pub fn new(vault: Arc<Vault>) -> Self {
        let interval = vault.config().monitor_interval();
        Self::with_interval(vault, interval)
    }

    /// A monitor with an explicit interval; tests run tight loops here.
    #[must_use]
    pub fn with_interval(vault: Arc<Vault>, interval: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                vault,
                interval,
                stopped: Mutex::new(false),
                wake: Condvar::new(),
            }),
            handle: Mutex::new(None),
        }
    }

    /// Spawn the monitor thread. A second call while running is a no-op.
    pub fn start(&self) {
        let mut handle = self.handle.lock();
        if handle.is_some() {
            return;
        }
        *self.shared.stopped.lock() = false;
        let shared = Arc::clone(&self.shared);
        let spawned = std::thread::Builder::new()
            .name("innledger-monitor".to_owned())
            .spawn(move || shared.run());
        match spawned {
            Ok(thread) => *handle = Some(thread),
            Err(err) => error!(error = %err, "failed to spawn integrity monitor"),
        }
    }

    /// Signal the thread to stop and wait for it to finish.
    pub fn stop(&self) {
        let handle = self.handle.lock().take();
        let Some(handle) = handle else {
            return;
        };
        *self.shared.stopped.lock() = true;
        self.shared.wake.notify_all();
        if handle.join().is_err() {
            error!("integrity monitor thread panicked");
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.lock().is_some()
    }
}

impl Drop for IntegrityMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

impl Shared {
    fn run(&self) {
        info!(
            interval_secs = self.interval.as_secs(),
            "integrity monitor started"
        );
        loop {
            self.cycle();
            let mut stopped = self.stopped.lock();
            if *stopped {
                break;
            }
            self.wake.wait_for(&mut stopped, self.interval);
            if *stopped {
                break;
            }
        }
        info!("integrity monitor stopped");
    }

    fn cycle(&self) {
        let issues = check_all(&self.vault);
        if issues.is_empty() {
            debug!("integrity cycle clean");
            return;
        }
        warn!(issues = issues.len(), "integrity issues found; repairing");
        let report = repair_all(&self.vault);
        if report.success() {
            info!(restored = report.restored(), "integrity cycle repaired all issues");
        } else {
            warn!(
                restored = report.restored(),
                unrecoverable = report.actions.len() - report.restored(),
                "integrity cycle left unrecoverable datasets"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use innledger_types::{Collection, DatasetKind};
    use innledger_vault::VaultConfig;
    use tempfile::TempDir;

    fn open_vault() -> (TempDir, Arc<Vault>) {
        let dir = TempDir::new().expect("tempdir");
        let config = VaultConfig::rooted_at(dir.path().join("data"));
        let vault = Arc::new(Vault::open(config).expect("open"));
        (dir, vault)
    }

    fn seed_all(vault: &Vault) {
        for t in &vault.config().tenants {
            for kind in DatasetKind::CRITICAL {
                let data = Collection::synthesized_default(kind, t);
                vault.save(t, kind, &data).expect("seed");
            }
        }
    }

    #[test]
    fn test_start_is_idempotent_and_stop_joins() {
        let (_dir, vault) = open_vault();
        seed_all(&vault);
        let monitor = IntegrityMonitor::with_interval(vault, Duration::from_secs(3600));

        monitor.start();
        monitor.start();
        assert!(monitor.is_running());

        // The thread is parked on a one-hour wait; stop must interrupt it
        // promptly rather than sleeping it out.
        let begun = std::time::Instant::now();
        monitor.stop();
        assert!(begun.elapsed() < Duration::from_secs(30));
        assert!(!monitor.is_running());
    }

    #[test]
    fn test_monitor_repairs_corruption_between_cycles() {
        let (_dir, vault) = open_vault();
        seed_all(&vault);
        let tenant = vault.config().tenants[0].clone();
        let primary = vault.layout().primary(&tenant, DatasetKind::Sales);
        std::fs::write(&primary, b"{ broken").expect("corrupt");

        let monitor =
            IntegrityMonitor::with_interval(Arc::clone(&vault), Duration::from_millis(20));
        monitor.start();

        let deadline = std::time::Instant::now() + Duration::from_secs(10);
        loop {
            if vault.read_primary(&tenant, DatasetKind::Sales).is_ok() {
                break;
            }
            assert!(std::time::Instant::now() < deadline, "monitor never repaired");
            std::thread::sleep(Duration::from_millis(10));
        }
        monitor.stop();
    }

    #[test]
    fn test_restart_after_stop() {
        let (_dir, vault) = open_vault();
        seed_all(&vault);
        let monitor = IntegrityMonitor::with_interval(vault, Duration::from_secs(3600));

        monitor.start();
        monitor.stop();
        monitor.start();
        assert!(monitor.is_running());
        monitor.stop();
    }

    #[test]
    fn test_stop_without_start_is_a_noop() {
        let (_dir, vault) = open_vault();
        let monitor = IntegrityMonitor::with_interval(vault, Duration::from_secs(3600));
        monitor.stop();
        assert!(!monitor.is_running());
    }
}
