mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use common::FakeSource;
use strata_sysinfo::{GpuInfo, HardwareProfiler};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

/// Counts events at WARN and ERROR.
#[derive(Clone, Default)]
struct LoudEvents(Arc<AtomicUsize>);

impl<S: Subscriber> Layer<S> for LoudEvents {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let level = *event.metadata().level();
        if level == Level::WARN || level == Level::ERROR {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[test]
fn headless_host_stays_quiet_on_repeated_gpu_queries() {
    let loud = LoudEvents::default();
    let subscriber = tracing_subscriber::registry().with(loud.clone());

    tracing::subscriber::with_default(subscriber, || {
        let p = HardwareProfiler::with_source(FakeSource::default());
        for _ in 0..3 {
            assert_eq!(p.gpu_info(), (false, GpuInfo::default()));
        }
    });

    assert_eq!(loud.0.load(Ordering::SeqCst), 0);
}
