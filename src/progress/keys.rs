//! Quit key watcher.
//!
//! Pressing `q` while a run is in progress trips the run's cancellation
//! token. Reading the terminal blocks, so a single watcher thread is
//! started for the whole process the first time a run asks for it. Runs
//! then arm the shared [`QuitSwitch`] for their duration; keys pressed
//! while no run is armed are ignored.
//!
//! Once started, the watcher keeps reading keys until the process exits.
//! Hosts that read stdin themselves should turn key watching off.

use console::{Key, Term};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};
use tokio_util::sync::CancellationToken;
use tracing::debug;

static SWITCH: QuitSwitch = QuitSwitch::new();
static WATCHER: OnceLock<bool> = OnceLock::new();

/// Routes quit keys to the run currently armed.
#[derive(Debug)]
pub struct QuitSwitch {
    active: Mutex<Option<(u64, CancellationToken)>>,
    next_id: AtomicU64,
}

impl Default for QuitSwitch {
    fn default() -> Self {
        Self::new()
    }
}

impl QuitSwitch {
    /// A switch with no run armed.
    pub const fn new() -> Self {
        Self {
            active: Mutex::new(None),
            next_id: AtomicU64::new(0),
        }
    }

    /// Route quit keys to `cancel` until the returned guard is dropped.
    pub fn arm(&self, cancel: CancellationToken) -> QuitGuard<'_> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        *lock(&self.active) = Some((id, cancel));
        QuitGuard { switch: self, id }
    }

    /// Handle one key. Returns whether it cancelled a run.
    pub fn press(&self, key: &Key) -> bool {
        if !is_quit(key) {
            return false;
        }
        match lock(&self.active).as_ref() {
            Some((_, cancel)) => {
                cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Whether a run is armed.
    pub fn is_armed(&self) -> bool {
        lock(&self.active).is_some()
    }

    fn disarm(&self, id: u64) {
        let mut active = lock(&self.active);
        if matches!(active.as_ref(), Some((armed, _)) if *armed == id) {
            *active = None;
        }
    }
}

/// Keeps a run armed on a [`QuitSwitch`].
#[derive(Debug)]
pub struct QuitGuard<'a> {
    switch: &'a QuitSwitch,
    id: u64,
}

impl Drop for QuitGuard<'_> {
    fn drop(&mut self) {
        self.switch.disarm(self.id);
    }
}

/// Route the quit key to `cancel` for as long as the guard lives.
///
/// Returns `None` when stdout is not a terminal or the watcher thread
/// could not be started.
pub fn watch_for_quit(cancel: CancellationToken) -> Option<QuitGuard<'static>> {
    let started = *WATCHER.get_or_init(spawn_watcher);
    started.then(|| SWITCH.arm(cancel))
}

fn spawn_watcher() -> bool {
    let term = Term::stdout();
    if !term.is_term() {
        return false;
    }

    let spawned = std::thread::Builder::new()
        .name("trawl-quit-watcher".into())
        .spawn(move || loop {
            match term.read_key() {
                Ok(key) => {
                    if SWITCH.press(&key) {
                        debug!("Quit requested from the terminal");
                    }
                }
                Err(e) => {
                    debug!("Stopped reading the terminal: {}", e);
                    break;
                }
            }
        });

    spawned.is_ok()
}

/// Whether a key asks to quit.
pub fn is_quit(key: &Key) -> bool {
    matches!(key, Key::Char('q') | Key::Char('Q'))
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
