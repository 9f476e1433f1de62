use std::time::{Duration, Instant};

use tracing::info;

/// Instrumentation wrapped around a pipeline run.
pub trait Profiler {
    fn start(&mut self);
    fn stop(&mut self);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProfiler;

impl Profiler for NoopProfiler {
    fn start(&mut self) {}
    fn stop(&mut self) {}
}

/// Measures wall-clock time and logs it when stopped.
#[derive(Debug, Default)]
pub struct ElapsedProfiler {
    started: Option<Instant>,
    elapsed: Option<Duration>,
}

impl ElapsedProfiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Duration of the last completed run.
    pub fn elapsed(&self) -> Option<Duration> {
        self.elapsed
    }
}

impl Profiler for ElapsedProfiler {
    fn start(&mut self) {
        self.started = Some(Instant::now());
        self.elapsed = None;
    }

    fn stop(&mut self) {
        if let Some(started) = self.started.take() {
            let elapsed = started.elapsed();
            info!(elapsed_ms = elapsed.as_millis() as u64, "run finished");
            self.elapsed = Some(elapsed);
        }
    }
}

struct StopOnDrop<'a, P: Profiler + ?Sized>(&'a mut P);

impl<P: Profiler + ?Sized> Drop for StopOnDrop<'_, P> {
    fn drop(&mut self) {
        self.0.stop();
    }
}

/// Runs `run` between `start` and `stop`. `stop` is called however `run`
/// exits, unwinding included.
pub fn run_profiled<P, T, F>(profiler: &mut P, run: F) -> T
where
    P: Profiler + ?Sized,
    F: FnOnce() -> T,
{
    profiler.start();
    let _stop = StopOnDrop(profiler);
    run()
}
