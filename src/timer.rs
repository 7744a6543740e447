use std::{
    cell::RefCell,
    rc::Rc,
    time::{Duration, Instant},
};

use crate::{error::StatError, MetricName};

/// min/avg/max over the samples of one flush window, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aggregate {
    pub min: f64,
    pub avg: f64,
    pub max: f64,
}
impl Aggregate {
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        let (&first, rest) = samples.split_first()?;
        let mut min = first;
        let mut max = first;
        let mut sum = first;
        for &sample in rest {
            min = min.min(sample);
            max = max.max(sample);
            sum += sample;
        }
        let avg = sum / samples.len() as f64;
        Some(Self { min, avg, max })
    }
}

/// Handle to a named duration recorder.
///
/// A timer is either idle or running. `start` and `stop` move between the two
/// states and every `stop` appends the elapsed wall time as one sample.
#[derive(Debug, Clone)]
pub struct Timer {
    name: MetricName,
    state: Rc<RefCell<TimerState>>,
}

#[derive(Debug, Default)]
struct TimerState {
    started: Option<Instant>,
    samples: Vec<f64>,
    accumulate: bool,
}

impl Timer {
    pub(crate) fn new(name: MetricName) -> Self {
        let state = Rc::new(RefCell::new(TimerState::default()));
        Self { name, state }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start(&self) -> Result<(), StatError> {
        let mut state = self.state.borrow_mut();
        if state.started.is_some() {
            return Err(StatError::TimerRunning {
                name: self.name.clone(),
            });
        }
        state.started = Some(Instant::now());
        Ok(())
    }

    pub fn stop(&self) -> Result<Duration, StatError> {
        let mut state = self.state.borrow_mut();
        let Some(started) = state.started.take() else {
            return Err(StatError::TimerIdle {
                name: self.name.clone(),
            });
        };
        let elapsed = started.elapsed();
        state.samples.push(elapsed.as_secs_f64());
        Ok(elapsed)
    }

    pub fn is_running(&self) -> bool {
        self.state.borrow().started.is_some()
    }

    /// Append a duration measured elsewhere.
    pub fn record(&self, elapsed: Duration) {
        self.state.borrow_mut().samples.push(elapsed.as_secs_f64());
    }

    /// Starts the timer and stops it again when the guard is dropped,
    /// including during unwinding.
    pub fn scope(&self) -> Result<TimerGuard, StatError> {
        self.start()?;
        Ok(TimerGuard {
            timer: self.clone(),
        })
    }

    pub fn wrapper(&self) -> Wrapper {
        Wrapper {
            timer: self.clone(),
        }
    }

    pub fn samples(&self) -> Vec<f64> {
        self.state.borrow().samples.clone()
    }
    pub fn aggregate(&self) -> Option<Aggregate> {
        Aggregate::from_samples(&self.state.borrow().samples)
    }

    /// Drop the recorded samples. A running measurement is kept.
    pub fn reset(&self) {
        self.state.borrow_mut().samples.clear();
    }

    /// Carry samples over into the next flush window instead of clearing them.
    pub fn set_accumulate(&self, accumulate: bool) {
        self.state.borrow_mut().accumulate = accumulate;
    }
    pub fn accumulate(&self) -> bool {
        self.state.borrow().accumulate
    }

    /// Whether both handles point at the same registry entry.
    pub fn same_entry(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}

/// Running measurement bound to a scope.
///
/// Derefs to the timer so the scope body can stop and restart it; on drop the
/// timer is stopped only if it is still running.
#[derive(Debug)]
#[must_use = "the measurement ends as soon as the guard is dropped"]
pub struct TimerGuard {
    timer: Timer,
}
impl core::ops::Deref for TimerGuard {
    type Target = Timer;

    fn deref(&self) -> &Self::Target {
        &self.timer
    }
}
impl Drop for TimerGuard {
    fn drop(&mut self) {
        if self.timer.is_running() {
            let _ = self.timer.stop();
        }
    }
}

/// Turns callables into versions that time every invocation.
#[derive(Debug, Clone)]
pub struct Wrapper {
    timer: Timer,
}
impl Wrapper {
    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    /// The wrapped call's output is returned unchanged. Starting fails if the
    /// timer is already running, e.g. on a recursive call.
    pub fn wrap<F, R>(&self, mut f: F) -> impl FnMut() -> Result<R, StatError>
    where
        F: FnMut() -> R,
    {
        let timer = self.timer.clone();
        move || {
            let _guard = timer.scope()?;
            Ok(f())
        }
    }

    pub fn wrap_with<F, A, R>(&self, mut f: F) -> impl FnMut(A) -> Result<R, StatError>
    where
        F: FnMut(A) -> R,
    {
        let timer = self.timer.clone();
        move |arg| {
            let _guard = timer.scope()?;
            Ok(f(arg))
        }
    }
}
