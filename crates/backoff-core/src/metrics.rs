//! Retry gauges exported through OpenTelemetry.
//!
//! There is no process-wide registry: the caller owns a [`MetricsRegistry`]
//! built from its own [`Meter`], registers controllers under a name, and the
//! meter provider's readers collect the gauges. Registration shares the
//! controller's [`RetryCounters`]; observation never touches the controller.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use opentelemetry::metrics::{AsyncInstrument, Meter, MeterProvider, ObservableGauge};
use opentelemetry::{InstrumentationScope, KeyValue};

use crate::retry::RetryController;

const METER_NAME: &str = "backoff";
const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const RETRY_MAX: &str = "backoff.retry.max";
pub const NUM_RETRIES: &str = "backoff.num_retries";
/// Attribute carrying the registration name.
pub const NAME_KEY: &str = "name";

/// Meter for the retry gauges, scoped to this crate.
pub fn create_meter(meter_provider: &dyn MeterProvider) -> Meter {
    meter_provider.meter_with_scope(
        InstrumentationScope::builder(METER_NAME)
            .with_version(VERSION)
            .build(),
    )
}

/// Counters published by a controller. Only the controller writes them.
#[derive(Debug, Default)]
pub struct RetryCounters {
    max_retries: AtomicU32,
    num_retries: AtomicU32,
}

impl RetryCounters {
    pub(crate) fn new(max_retries: u32) -> Self {
        Self {
            max_retries: AtomicU32::new(max_retries),
            num_retries: AtomicU32::new(0),
        }
    }

    pub(crate) fn set_num_retries(&self, n: u32) {
        self.num_retries.store(n, Ordering::Relaxed);
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries.load(Ordering::Relaxed)
    }

    pub fn num_retries(&self) -> u32 {
        self.num_retries.load(Ordering::Relaxed)
    }
}

/// Point-in-time values of one registered controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryGauges {
    pub name: String,
    pub max_retries: u32,
    pub num_retries: u32,
}

type Controllers = Arc<RwLock<BTreeMap<String, Arc<RetryCounters>>>>;

/// Caller-owned set of named controllers, observed by two gauges.
pub struct MetricsRegistry {
    controllers: Controllers,
    _retry_max: ObservableGauge<u64>,
    _num_retries: ObservableGauge<u64>,
}

impl MetricsRegistry {
    /// Build the `backoff.retry.max` and `backoff.num_retries` gauges on `meter`.
    pub fn new(meter: &Meter) -> Self {
        let controllers = Controllers::default();

        let observed = Arc::clone(&controllers);
        let retry_max = meter
            .u64_observable_gauge(RETRY_MAX)
            .with_description("Maximum number of retries for backoff")
            .with_callback(move |observer| {
                observe(&observed, observer, RetryCounters::max_retries)
            })
            .build();

        let observed = Arc::clone(&controllers);
        let num_retries = meter
            .u64_observable_gauge(NUM_RETRIES)
            .with_description("Number of retries in a backoff")
            .with_callback(move |observer| {
                observe(&observed, observer, RetryCounters::num_retries)
            })
            .build();

        Self {
            controllers,
            _retry_max: retry_max,
            _num_retries: num_retries,
        }
    }

    /// Export `controller` under `name`, replacing any controller already
    /// registered with that name. The gauges stay readable after the
    /// controller is dropped, frozen at their last values.
    pub fn register(&self, name: impl Into<String>, controller: &RetryController) {
        let name = name.into();
        tracing::debug!(name = %name, "registering retry gauges");
        self.controllers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, controller.counters());
    }

    pub fn unregister(&self, name: &str) {
        self.controllers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name);
    }

    /// Current gauges, ordered by name.
    pub fn snapshot(&self) -> Vec<RetryGauges> {
        self.controllers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(name, counters)| RetryGauges {
                name: name.clone(),
                max_retries: counters.max_retries(),
                num_retries: counters.num_retries(),
            })
            .collect()
    }
}

fn observe(
    controllers: &Controllers,
    observer: &dyn AsyncInstrument<u64>,
    value: fn(&RetryCounters) -> u32,
) {
    let controllers = controllers.read().unwrap_or_else(PoisonError::into_inner);
    for (name, counters) in controllers.iter() {
        observer.observe(
            u64::from(value(counters)),
            &[KeyValue::new(NAME_KEY, name.clone())],
        );
    }
}
