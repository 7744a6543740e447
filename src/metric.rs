use std::{cell::RefCell, rc::Rc};

use crate::{error::StatError, MetricName};

/// Handle to a named counter.
///
/// Clones share the same underlying value, so a handle fetched twice from the
/// registry observes every update made through the other.
#[derive(Debug, Clone)]
pub struct Metric {
    name: MetricName,
    state: Rc<RefCell<MetricState>>,
}

#[derive(Debug, Default)]
struct MetricState {
    value: f64,
    accumulate: bool,
}

impl Metric {
    pub(crate) fn new(name: MetricName) -> Self {
        let state = Rc::new(RefCell::new(MetricState::default()));
        Self { name, state }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fails without touching the value when `delta` or the resulting sum
    /// is not finite.
    pub fn add(&self, delta: f64) -> Result<(), StatError> {
        let mut state = self.state.borrow_mut();
        let sum = state.value + delta;
        if !sum.is_finite() {
            return Err(StatError::InvalidValue {
                name: self.name.clone(),
                value: if delta.is_finite() { sum } else { delta },
            });
        }
        state.value = sum;
        Ok(())
    }
    pub fn incr(&self) {
        self.state.borrow_mut().value += 1.0;
    }

    pub fn value(&self) -> f64 {
        self.state.borrow().value
    }

    pub fn reset(&self) {
        self.state.borrow_mut().value = 0.0;
    }

    /// Keep the value across flushes instead of zeroing it.
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
