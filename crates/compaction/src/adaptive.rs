use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::leveled::Leveled;
use crate::size_tiered::SizeTiered;
use crate::strategy::{CompactionStrategy, LevelView};
use crate::time_window::TimeWindow;

enum Inner {
    SizeTiered(SizeTiered),
    Leveled(Leveled),
    TimeWindow(TimeWindow),
}

impl Inner {
    fn as_strategy(&self) -> &dyn CompactionStrategy {
        match self {
            Inner::SizeTiered(s) => s,
            Inner::Leveled(s) => s,
            Inner::TimeWindow(s) => s,
        }
    }
}

/// Re-evaluates which of the other three strategies best fits the current
/// file population every `switch_interval`: many small files favor
/// size-tiered's bucketing, few files favor leveled's tighter budget, and
/// everything in between is treated as a time-series workload.
pub struct Adaptive {
    switch_interval: Duration,
    last_switch_unix_nanos: AtomicU64,
    current: Mutex<Inner>,
    window: Duration,
    compaction_delay: Duration,
}

impl Adaptive {
    #[must_use]
    pub fn new(switch_interval: Duration, window: Duration, compaction_delay: Duration) -> Self {
        Self {
            switch_interval,
            last_switch_unix_nanos: AtomicU64::new(0),
            current: Mutex::new(Inner::TimeWindow(TimeWindow::new(window, compaction_delay))),
            window,
            compaction_delay,
        }
    }

    fn maybe_switch(&self, view: &LevelView) {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        let last = self.last_switch_unix_nanos.load(Ordering::Relaxed);
        if now.saturating_sub(last) < self.switch_interval.as_nanos() as u64 {
            return;
        }
        self.last_switch_unix_nanos.store(now, Ordering::Relaxed);

        let count = view.files.len();
        let mut current = self.current.lock().unwrap();
        *current = if count > 20 {
            Inner::SizeTiered(SizeTiered::default())
        } else if count < 5 {
            Inner::Leveled(Leveled)
        } else {
            Inner::TimeWindow(TimeWindow::new(self.window, self.compaction_delay))
        };
    }
}

impl CompactionStrategy for Adaptive {
    fn select(&self, view: &LevelView) -> Vec<String> {
        self.maybe_switch(view);
        self.current.lock().unwrap().as_strategy().select(view)
    }

    fn priority(&self, view: &LevelView) -> f64 {
        self.maybe_switch(view);
        self.current.lock().unwrap().as_strategy().priority(view)
    }
}
