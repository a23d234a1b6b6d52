//! USB auto-import
//!
//! A long-lived watcher thread polls sysfs for newly inserted USB disks.
//! Each insertion is handled on its own short-lived thread:
//! settle delay, mount point lookup, then a [`UsbEvent::Mounted`] is posted.
//! The UI thread queues it in an [`ImportQueue`], which starts one
//! [`spawn_import`] at a time after any running game is stopped. The worker
//! copies new ROMs, unmounts the drive and posts the report.
//!
//! Workers never touch UI state; everything flows back through the channel.

mod import;
mod monitor;

pub use import::{
    copy_rom, copy_roms, find_new_roms, parse_mount_point, resolve_mount_point, unmount,
    ImportReport,
};
pub use monitor::{is_usb_disk, BlockDevice, UsbDiskScanner};

use crate::config::{Config, UsbConfig};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Messages from USB worker threads to the UI thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsbEvent {
    /// A USB drive is mounted and ready to import from
    Mounted(PathBuf),
    /// Copying is about to start
    ImportStarted { pending: usize },
    /// Import finished and the drive was (or failed to be) unmounted
    ImportFinished(ImportReport),
}

/// Called after posting an event so the UI wakes up to read it
pub type Waker = Arc<dyn Fn() + Send + Sync>;

fn post(tx: &Sender<UsbEvent>, wake: &Waker, event: UsbEvent) {
    if tx.send(event).is_err() {
        log::warn!("UI is gone, dropping USB event");
    }
    wake();
}

/// Start the long-lived insertion watcher
pub fn spawn_watcher(usb: UsbConfig, tx: Sender<UsbEvent>, wake: Waker) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("usb-watcher".to_string())
        .spawn(move || {
            let mut scanner = UsbDiskScanner::new(&usb.sys_block_dir);
            log::info!("Watching {} for USB disks", usb.sys_block_dir.display());
            loop {
                for device in scanner.poll() {
                    let usb = usb.clone();
                    let tx = tx.clone();
                    let wake = wake.clone();
                    let spawned = thread::Builder::new()
                        .name(format!("usb-{}", device.name))
                        .spawn(move || handle_insertion(&usb, &device, &tx, &wake));
                    if let Err(e) = spawned {
                        log::error!("Failed to start USB insertion worker: {}", e);
                    }
                }
                thread::sleep(usb.poll_interval());
            }
        })
}

fn handle_insertion(usb: &UsbConfig, device: &BlockDevice, tx: &Sender<UsbEvent>, wake: &Waker) {
    thread::sleep(usb.settle_time());
    match resolve_mount_point(usb, &device.devnode) {
        Some(mount_point) => {
            log::info!("{} mounted at {}", device.devnode.display(), mount_point.display());
            post(tx, wake, UsbEvent::Mounted(mount_point));
        }
        None => log::info!("No mount point for {}, ignoring", device.devnode.display()),
    }
}

/// Import from a mounted drive on a worker thread
pub fn spawn_import(
    mount_point: PathBuf,
    config: Config,
    tx: Sender<UsbEvent>,
    wake: Waker,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("usb-import".to_string())
        .spawn(move || {
            let report = run_import(&mount_point, &config, &tx, &wake);
            post(&tx, &wake, UsbEvent::ImportFinished(report));
        })
}

/// Runs one import at a time. Drives mounted meanwhile wait their turn,
/// since the watcher reports each disk only once.
#[derive(Default)]
pub struct ImportQueue {
    pending: VecDeque<PathBuf>,
    worker: Option<JoinHandle<()>>,
}

impl ImportQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.worker.is_some()
    }

    /// Mount points waiting for the running import
    pub fn waiting(&self) -> usize {
        self.pending.len()
    }

    pub fn push(&mut self, mount_point: PathBuf) {
        if self.pending.contains(&mount_point) {
            log::debug!("{} already queued", mount_point.display());
            return;
        }
        if self.is_busy() {
            log::info!("Import running, queueing {}", mount_point.display());
        }
        self.pending.push_back(mount_point);
    }

    /// Start the next queued import if none is running.
    /// Mount points whose worker cannot be spawned are logged and dropped.
    pub fn start_next<F>(&mut self, mut spawn: F) -> Option<PathBuf>
    where
        F: FnMut(PathBuf) -> std::io::Result<JoinHandle<()>>,
    {
        if self.is_busy() {
            return None;
        }
        while let Some(mount_point) = self.pending.pop_front() {
            match spawn(mount_point.clone()) {
                Ok(handle) => {
                    self.worker = Some(handle);
                    return Some(mount_point);
                }
                Err(e) => log::error!("Failed to start import from {}: {}", mount_point.display(), e),
            }
        }
        None
    }

    /// The running import posted its report
    pub fn finish(&mut self) {
        self.worker = None;
    }

    /// Whether the worker thread has exited. Sample this before draining the
    /// channel: a worker that exited has already sent everything it will send.
    pub fn worker_exited(&self) -> bool {
        self.worker.as_ref().is_some_and(JoinHandle::is_finished)
    }

    /// Release a worker that exited without reporting. Returns true if it panicked.
    pub fn reap(&mut self) -> bool {
        match self.worker.take() {
            Some(handle) => handle.join().is_err(),
            None => false,
        }
    }
}

/// Find, copy, unmount. Posts `ImportStarted` when there is something to copy.
pub fn run_import(mount_point: &Path, config: &Config, tx: &Sender<UsbEvent>, wake: &Waker) -> ImportReport {
    let names = match find_new_roms(mount_point, config) {
        Ok(names) => names,
        Err(e) => {
            log::error!("Failed to list USB drive: {}", e);
            Vec::new()
        }
    };

    let mut report = if names.is_empty() {
        log::info!("No new games on {}", mount_point.display());
        ImportReport {
            mount_point: mount_point.to_path_buf(),
            ..ImportReport::default()
        }
    } else {
        log::info!("Importing {} game(s) from {}", names.len(), mount_point.display());
        post(tx, wake, UsbEvent::ImportStarted { pending: names.len() });
        copy_roms(mount_point, &names, &config.roms_dir)
    };

    match unmount(&config.usb, mount_point) {
        Ok(()) => report.unmounted = true,
        Err(e) => log::error!("Failed to unmount {}: {}", mount_point.display(), e),
    }
    report
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::config::CommandTemplate;
    use std::fs;
    use std::sync::mpsc::channel;

    #[test]
    fn import_reports_progress_and_unmounts() {
        let roms = tempfile::tempdir().unwrap();
        let usb = tempfile::tempdir().unwrap();
        fs::write(roms.path().join("a.gba"), b"a").unwrap();
        fs::write(usb.path().join("a.gba"), b"a").unwrap();
        fs::write(usb.path().join("d.sfc"), b"d").unwrap();

        let mut config = Config {
            roms_dir: roms.path().to_path_buf(),
            ..Config::default()
        };
        config.usb.unmount = CommandTemplate::new("true", &["{mount}"]);

        let (tx, rx) = channel();
        let wake: Waker = Arc::new(|| {});
        let report = run_import(usb.path(), &config, &tx, &wake);

        assert_eq!(rx.try_recv().unwrap(), UsbEvent::ImportStarted { pending: 1 });
        assert_eq!(report.copied, vec!["d.sfc"]);
        assert!(report.unmounted);
    }

    #[test]
    fn empty_import_attempts_unmount() {
        let roms = tempfile::tempdir().unwrap();
        let usb = tempfile::tempdir().unwrap();
        fs::write(usb.path().join("notes.txt"), b"x").unwrap();

        let mut config = Config {
            roms_dir: roms.path().to_path_buf(),
            ..Config::default()
        };
        config.usb.unmount = CommandTemplate::new("false", &["{mount}"]);

        let (tx, rx) = channel();
        let wake: Waker = Arc::new(|| {});
        let report = run_import(usb.path(), &config, &tx, &wake);

        assert!(rx.try_recv().is_err());
        assert_eq!(report.copied_count(), 0);
        assert!(!report.unmounted);
    }

    #[test]
    fn spawned_import_posts_finished_event() {
        let roms = tempfile::tempdir().unwrap();
        let usb = tempfile::tempdir().unwrap();
        fs::write(usb.path().join("new.gba"), b"n").unwrap();

        let mut config = Config {
            roms_dir: roms.path().to_path_buf(),
            ..Config::default()
        };
        config.usb.unmount = CommandTemplate::new("true", &[]);

        let (tx, rx) = channel();
        let handle = spawn_import(usb.path().to_path_buf(), config, tx, Arc::new(|| {})).unwrap();
        handle.join().unwrap();

        let events: Vec<UsbEvent> = rx.try_iter().collect();
        assert_eq!(events.len(), 2);
        match &events[1] {
            UsbEvent::ImportFinished(report) => assert_eq!(report.copied, vec!["new.gba"]),
            other => panic!("unexpected event {:?}", other),
        }
    }

    fn idle_worker() -> std::io::Result<JoinHandle<()>> {
        Ok(thread::spawn(|| {}))
    }

    #[test]
    fn queued_drives_import_one_at_a_time() {
        let mut queue = ImportQueue::new();
        queue.push(PathBuf::from("/media/one"));
        queue.push(PathBuf::from("/media/two"));
        queue.push(PathBuf::from("/media/two"));
        assert_eq!(queue.waiting(), 2);

        assert_eq!(queue.start_next(|_| idle_worker()), Some(PathBuf::from("/media/one")));
        assert!(queue.is_busy());
        // A drive mounted during the import is kept, not dropped
        queue.push(PathBuf::from("/media/three"));
        assert_eq!(queue.start_next(|_| idle_worker()), None);
        assert_eq!(queue.waiting(), 2);

        queue.finish();
        assert_eq!(queue.start_next(|_| idle_worker()), Some(PathBuf::from("/media/two")));
        queue.finish();
        assert_eq!(queue.start_next(|_| idle_worker()), Some(PathBuf::from("/media/three")));
        queue.finish();
        assert_eq!(queue.start_next(|_| idle_worker()), None);
    }

    #[test]
    fn spawn_failure_moves_on_to_the_next_drive() {
        let mut queue = ImportQueue::new();
        queue.push(PathBuf::from("/media/bad"));
        queue.push(PathBuf::from("/media/good"));

        let started = queue.start_next(|mount| {
            if mount.ends_with("bad") {
                Err(std::io::Error::new(std::io::ErrorKind::Other, "no threads"))
            } else {
                idle_worker()
            }
        });
        assert_eq!(started, Some(PathBuf::from("/media/good")));
        assert_eq!(queue.waiting(), 0);
    }

    #[test]
    fn crashed_worker_frees_the_queue() {
        let mut queue = ImportQueue::new();
        queue.push(PathBuf::from("/media/one"));
        queue.push(PathBuf::from("/media/two"));

        queue.start_next(|_| Ok(thread::spawn(|| panic!("copy worker died"))));
        while !queue.worker_exited() {
            thread::sleep(std::time::Duration::from_millis(5));
        }
        assert!(queue.reap());
        assert!(!queue.is_busy());
        assert_eq!(queue.start_next(|_| idle_worker()), Some(PathBuf::from("/media/two")));
    }

    #[test]
    fn reported_worker_is_released_by_finish() {
        let roms = tempfile::tempdir().unwrap();
        let usb = tempfile::tempdir().unwrap();
        let mut config = Config {
            roms_dir: roms.path().to_path_buf(),
            ..Config::default()
        };
        config.usb.unmount = CommandTemplate::new("true", &[]);

        let (tx, rx) = channel();
        let mut queue = ImportQueue::new();
        queue.push(usb.path().to_path_buf());
        queue
            .start_next(|mount| spawn_import(mount, config.clone(), tx.clone(), Arc::new(|| {})))
            .unwrap();

        match rx.recv().unwrap() {
            UsbEvent::ImportFinished(report) => assert_eq!(report.found, 0),
            other => panic!("unexpected event {:?}", other),
        }
        queue.finish();
        assert!(!queue.is_busy());
        assert!(!queue.reap());
    }
}
