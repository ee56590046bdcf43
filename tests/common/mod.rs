#![allow(dead_code)]

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Installs a tracing subscriber writing to the test output.
/// Set `RUST_LOG=blockdeque=trace` to see block and growth events.
pub fn init_test_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    // Another test may have installed it already.
    let _ = fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .with_test_writer()
        .try_init();
}

/// Error produced by a deliberately failing copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyFailed {
    pub call: usize,
}

impl fmt::Display for CopyFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "copy #{} failed", self.call)
    }
}

/// Element that counts how many instances are alive.
#[derive(Debug)]
pub struct Tracked {
    pub value: u32,
    alive: Rc<Cell<usize>>,
}

impl Tracked {
    pub fn new(value: u32, alive: &Rc<Cell<usize>>) -> Self {
        alive.set(alive.get() + 1);
        Self {
            value,
            alive: Rc::clone(alive),
        }
    }
}

impl Clone for Tracked {
    fn clone(&self) -> Self {
        Tracked::new(self.value, &self.alive)
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.alive.set(self.alive.get() - 1);
    }
}

impl PartialEq for Tracked {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

/// Copier that succeeds for the first `fail_at - 1` calls and fails on the
/// `fail_at`-th one.
pub fn failing_copier<T: Clone>(fail_at: usize) -> impl FnMut(&T) -> Result<T, CopyFailed> {
    let mut calls = 0;
    move |item: &T| {
        calls += 1;
        if calls == fail_at {
            Err(CopyFailed { call: calls })
        } else {
            Ok(item.clone())
        }
    }
}
