//! Installing a tracking config. Kept in its own test binary because the
//! config is process-wide.

mod common;

use common::{as_dyn, init_tracing, Probe};
use ripple_core::reactive::Observable;
use ripple_core::{TrackError, TrackingConfig};

#[test]
fn installed_depth_limit_cuts_cycles() {
    init_tracing();
    let previous = TrackingConfig::default().with_max_notify_depth(3).install();
    assert_eq!(previous, TrackingConfig::default());
    assert_eq!(TrackingConfig::current().max_notify_depth, 3);

    let o = Observable::new();
    let looping = Probe::new();
    {
        let o = o.clone();
        looping.on_run(move || {
            if let Err(err) = o.try_notify() {
                assert!(matches!(err, TrackError::NotifyDepthExceeded { limit: 3, .. }));
            }
        });
    }
    o.add_subscriber(&as_dyn(&looping));

    o.notify();
    assert_eq!(looping.runs(), 3);
}
