use parking_lot::Mutex;

/// Callback for one tick of the frame loop. Receives the scheduler so the
/// tick can re-arm itself at its own tail, and the host refresh timestamp
/// in seconds.
pub type TickFn = Box<dyn FnOnce(&FrameScheduler, f64)>;

/// Cancellation token for a scheduled tick. Owned by whoever started the
/// loop; passing it to [`FrameScheduler::cancel`] before the tick fires
/// prevents the callback from ever running.
#[derive(Debug)]
pub struct FrameHandle {
    generation: u64,
}

/// Drives a single continuously re-scheduling callback off the host's
/// display-refresh signal.
///
/// The model is cooperative and single-threaded: the host calls
/// [`FrameScheduler::run_due`] once per refresh signal, which fires the
/// armed callback (if any). A callback that wants the loop to continue
/// calls [`FrameScheduler::start`] again before returning. There is no
/// back-pressure; a slow tick simply delays the next one.
#[derive(Default)]
pub struct FrameScheduler {
    slot: Mutex<TickSlot>,
}

#[derive(Default)]
struct TickSlot {
    armed: Option<TickFn>,
    generation: u64,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms `callback` for the next refresh signal, replacing any tick that
    /// was already armed, and returns the token that cancels it.
    pub fn start(&self, callback: TickFn) -> FrameHandle {
        let mut slot = self.slot.lock();
        slot.generation += 1;
        slot.armed = Some(callback);
        FrameHandle {
            generation: slot.generation,
        }
    }

    /// Disarms the pending tick if `handle` still refers to it. A stale
    /// handle (the tick already fired or was replaced) is a no-op.
    pub fn cancel(&self, handle: FrameHandle) {
        let mut slot = self.slot.lock();
        if slot.generation == handle.generation {
            slot.armed = None;
        }
    }

    /// True while a tick is waiting for the next refresh signal.
    pub fn is_armed(&self) -> bool {
        self.slot.lock().armed.is_some()
    }

    /// Fires the armed tick, if any. Called by the host once per refresh
    /// signal with the signal's timestamp in seconds.
    pub fn run_due(&self, now_seconds: f64) {
        let callback = self.slot.lock().armed.take();
        if let Some(callback) = callback {
            callback(self, now_seconds);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn cancel_before_first_tick_suppresses_the_callback() {
        let scheduler = FrameScheduler::new();
        let fired = Rc::new(Cell::new(false));
        let probe = Rc::clone(&fired);
        let handle = scheduler.start(Box::new(move |_, _| probe.set(true)));
        scheduler.cancel(handle);
        scheduler.run_due(0.0);
        assert!(!fired.get());
        assert!(!scheduler.is_armed());
    }

    #[test]
    fn run_due_passes_the_refresh_timestamp() {
        let scheduler = FrameScheduler::new();
        let seen = Rc::new(Cell::new(0.0));
        let probe = Rc::clone(&seen);
        scheduler.start(Box::new(move |_, now| probe.set(now)));
        scheduler.run_due(1.25);
        assert_eq!(seen.get(), 1.25);
    }

    #[test]
    fn tick_rearms_itself_at_its_tail() {
        fn arm(scheduler: &FrameScheduler, count: Rc<Cell<u32>>) {
            scheduler.start(Box::new(move |sched, _| {
                count.set(count.get() + 1);
                arm(sched, count);
            }));
        }

        let scheduler = FrameScheduler::new();
        let count = Rc::new(Cell::new(0));
        arm(&scheduler, Rc::clone(&count));
        for frame in 0..3 {
            scheduler.run_due(frame as f64 / 60.0);
        }
        assert_eq!(count.get(), 3);
        assert!(scheduler.is_armed());
    }

    #[test]
    fn stale_handle_does_not_cancel_a_newer_tick() {
        let scheduler = FrameScheduler::new();
        let fired = Rc::new(Cell::new(false));
        let old = scheduler.start(Box::new(|_, _| {}));
        let probe = Rc::clone(&fired);
        scheduler.start(Box::new(move |_, _| probe.set(true)));
        scheduler.cancel(old);
        scheduler.run_due(0.0);
        assert!(fired.get());
    }

    #[test]
    fn run_due_without_an_armed_tick_is_a_no_op() {
        let scheduler = FrameScheduler::new();
        scheduler.run_due(0.0);
        assert!(!scheduler.is_armed());
    }
}
