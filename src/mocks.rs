// Recording fakes for testing - no hardware, no processes, no files

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::audio::{AudioPlayer, PlaybackError};
use crate::call::{CallId, CallState, CallTransport, TransportError};
use crate::cooldown::{MarkerStore, PersistenceError};
use crate::hardware::{GpioBackend, HardwareError};

/// In-memory GPIO lines. Unset lines read high, like pulled-up inputs.
#[derive(Debug, Default)]
pub struct FakeGpio {
    levels: Mutex<HashMap<u32, bool>>,
    pulses: Mutex<HashMap<u32, (bool, usize)>>,
    fail_reads: AtomicBool,
    released: AtomicBool,
}

impl FakeGpio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_level(&self, line: u32, high: bool) {
        self.levels.lock().unwrap().insert(line, high);
    }

    /// The next `reads` reads of `line` return `high`, then the steady level again
    pub fn pulse(&self, line: u32, high: bool, reads: usize) {
        self.pulses.lock().unwrap().insert(line, (high, reads));
    }

    pub fn level(&self, line: u32) -> bool {
        self.levels.lock().unwrap().get(&line).copied().unwrap_or(true)
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

impl GpioBackend for FakeGpio {
    fn claim_input(&self, _line: u32) -> Result<(), HardwareError> {
        Ok(())
    }

    fn claim_output(&self, line: u32) -> Result<(), HardwareError> {
        self.set_level(line, false);
        Ok(())
    }

    fn read(&self, line: u32) -> Result<bool, HardwareError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(HardwareError::LineUnavailable {
                line,
                message: "simulated read failure".to_string(),
            });
        }
        if let Some((high, remaining)) = self.pulses.lock().unwrap().get_mut(&line) {
            if *remaining > 0 {
                *remaining -= 1;
                return Ok(*high);
            }
        }
        Ok(self.level(line))
    }

    fn write(&self, line: u32, high: bool) -> Result<(), HardwareError> {
        self.set_level(line, high);
        Ok(())
    }

    fn release(&self) -> Result<(), HardwareError> {
        self.released.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Transport that records dial/hangup traffic and can be told to misbehave
#[derive(Debug, Default)]
pub struct FakeTransport {
    calls: Mutex<HashMap<CallId, CallState>>,
    dialled: Mutex<Vec<String>>,
    next_id: AtomicUsize,
    hangups: AtomicUsize,
    fail_dial: AtomicBool,
    invalid_hangup: AtomicBool,
    fault_hangup: AtomicBool,
    drop_on_dial: AtomicBool,
    shut_down: AtomicBool,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dialled(&self) -> Vec<String> {
        self.dialled.lock().unwrap().clone()
    }

    pub fn hangups(&self) -> usize {
        self.hangups.load(Ordering::SeqCst)
    }

    pub fn fail_dial(&self, fail: bool) {
        self.fail_dial.store(fail, Ordering::SeqCst);
    }

    pub fn reject_hangup_as_invalid(&self, reject: bool) {
        self.invalid_hangup.store(reject, Ordering::SeqCst);
    }

    pub fn fault_hangup(&self, fault: bool) {
        self.fault_hangup.store(fault, Ordering::SeqCst);
    }

    /// Calls end as soon as they are dialled, like a dialer rejected by the registrar
    pub fn drop_on_dial(&self, drop: bool) {
        self.drop_on_dial.store(drop, Ordering::SeqCst);
    }

    pub fn was_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    pub fn live_calls(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .values()
            .filter(|state| state.is_live())
            .count()
    }
}

#[async_trait]
impl CallTransport for FakeTransport {
    async fn dial(&self, target: &str) -> Result<CallId, TransportError> {
        if self.fail_dial.load(Ordering::SeqCst) {
            return Err(TransportError::Unreachable {
                message: "simulated registrar outage".to_string(),
            });
        }
        self.dialled.lock().unwrap().push(target.to_string());
        let id = CallId(self.next_id.fetch_add(1, Ordering::SeqCst) as u64 + 1);
        let state = if self.drop_on_dial.load(Ordering::SeqCst) {
            CallState::Ended
        } else {
            CallState::Ringing
        };
        self.calls.lock().unwrap().insert(id, state);
        Ok(id)
    }

    fn state(&self, id: CallId) -> CallState {
        self.calls
            .lock()
            .unwrap()
            .get(&id)
            .copied()
            .unwrap_or(CallState::Ended)
    }

    async fn hangup(&self, id: CallId) -> Result<(), TransportError> {
        if self.invalid_hangup.load(Ordering::SeqCst) {
            return Err(TransportError::InvalidState {
                id,
                operation: "hangup".to_string(),
            });
        }
        if self.fault_hangup.load(Ordering::SeqCst) {
            return Err(TransportError::Fault {
                message: "simulated socket error".to_string(),
            });
        }
        self.hangups.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().unwrap().insert(id, CallState::Ended);
        Ok(())
    }

    async fn shutdown(&self) {
        self.shut_down.store(true, Ordering::SeqCst);
        for state in self.calls.lock().unwrap().values_mut() {
            *state = CallState::Ended;
        }
    }
}

type PlayHook = Box<dyn Fn(usize, &Path) + Send + Sync>;

/// Player that records what it was asked to play; an optional hook runs
/// after each artifact with its 1-based play count.
#[derive(Default)]
pub struct RecordingPlayer {
    played: Mutex<Vec<PathBuf>>,
    after_play: Option<PlayHook>,
}

impl RecordingPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hook(hook: impl Fn(usize, &Path) + Send + Sync + 'static) -> Self {
        Self {
            played: Mutex::new(Vec::new()),
            after_play: Some(Box::new(hook)),
        }
    }

    pub fn played(&self) -> Vec<PathBuf> {
        self.played.lock().unwrap().clone()
    }
}

#[async_trait]
impl AudioPlayer for RecordingPlayer {
    async fn play(&self, artifact: &Path) -> Result<(), PlaybackError> {
        let count = {
            let mut played = self.played.lock().unwrap();
            played.push(artifact.to_path_buf());
            played.len()
        };
        if let Some(hook) = &self.after_play {
            hook(count, artifact);
        }
        Ok(())
    }
}

/// Marker store kept in memory, counting writes
#[derive(Debug, Default)]
pub struct MemoryMarkerStore {
    value: Mutex<Option<f64>>,
    writes: AtomicUsize,
}

impl MemoryMarkerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn value(&self) -> Option<f64> {
        *self.value.lock().unwrap()
    }
}

#[async_trait]
impl MarkerStore for MemoryMarkerStore {
    async fn load(&self) -> Result<Option<f64>, PersistenceError> {
        Ok(*self.value.lock().unwrap())
    }

    async fn store(&self, timestamp: f64) -> Result<(), PersistenceError> {
        *self.value.lock().unwrap() = Some(timestamp);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn clear(&self) -> Result<(), PersistenceError> {
        *self.value.lock().unwrap() = None;
        Ok(())
    }
}
