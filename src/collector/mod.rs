//! # Client Telemetry Collector
//!
//! Session-scoped real-user monitoring for the booking flow:
//! - One sampling decision per session, final at construction
//! - Independent instrumentation channels that degrade in isolation
//! - Bounded per-category buffers (FIFO eviction, 100 entries per key)
//! - Synchronous budget checks on every Core Web Vital sample
//! - Funnel progression, abandonment, payment latency, interaction delay
//!
//! The collector is explicitly constructed and dependency-injected; there is
//! no ambient singleton. It never surfaces errors to the hosting
//! application.

pub mod funnel;
pub mod interaction;
pub mod payment;
pub mod resources;
pub mod sinks;
pub mod store;
pub mod vitals;

pub use payment::InstrumentedHttpClient;
pub use sinks::{
    AnalyticsSink, BudgetViolation, MemoryAnalyticsSink, MemoryViolationReporter,
    TracingAnalyticsSink, TracingViolationReporter, ViolationReporter,
};
pub use vitals::{ViolationSeverity, VitalRating, WebVital};

use crate::config::CollectorConfig;
use chrono::Utc;
use funnel::FunnelTracker;
use interaction::InteractionTimer;
use parking_lot::{Mutex, RwLock};
use pulse_common::{
    DeviceInfo, MetricSample, MetricUnit, NetworkInfo, PageType, PulseError, PulseResult,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use store::BoundedMetricStore;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Wired state per instrumentation channel after `initialize()`
#[derive(Debug, Clone, Copy, Default)]
struct ChannelStates {
    vitals: bool,
    resources: bool,
    funnel: bool,
    abandonment: bool,
    payment: bool,
    interaction: bool,
    touch: bool,
}

/// Summary entry for one vital in `performance_summary()`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VitalSummary {
    pub value: f64,
    pub rating: VitalRating,
    pub budget: f64,
    pub within_budget: bool,
    pub samples: usize,
}

/// Compact report of the most recent vital observations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub vitals: HashMap<String, VitalSummary>,
}

/// Session-scoped RUM collector
pub struct RumCollector {
    config: CollectorConfig,
    session_id: String,
    sampled_in: bool,
    /// True once initialize() has run, whether or not channels were wired
    initialize_called: AtomicBool,
    /// True once channels were wired (sampled-in sessions only)
    instrumented: AtomicBool,
    device: DeviceInfo,
    network: NetworkInfo,
    network_available: bool,
    current_page: RwLock<PageType>,
    store: RwLock<BoundedMetricStore>,
    funnel: Mutex<FunnelTracker>,
    interactions: Mutex<InteractionTimer>,
    channels: RwLock<ChannelStates>,
    analytics: Arc<dyn AnalyticsSink>,
    violations: Arc<dyn ViolationReporter>,
}

impl RumCollector {
    /// Construct with a fresh uniform sampling draw
    pub fn new(
        config: CollectorConfig,
        device: DeviceInfo,
        network: Option<NetworkInfo>,
        analytics: Arc<dyn AnalyticsSink>,
        violations: Arc<dyn ViolationReporter>,
    ) -> Self {
        let draw = rand::thread_rng().gen::<f64>();
        Self::with_sample_draw(config, device, network, analytics, violations, draw)
    }

    /// Construct with an explicit sampling draw (deterministic tests)
    pub fn with_sample_draw(
        config: CollectorConfig,
        device: DeviceInfo,
        network: Option<NetworkInfo>,
        analytics: Arc<dyn AnalyticsSink>,
        violations: Arc<dyn ViolationReporter>,
        draw: f64,
    ) -> Self {
        let sampled_in = draw < config.sample_rate;
        let network_available = network.is_some();
        let funnel = FunnelTracker::new(config.funnel_steps.clone());
        let max_entries = config.max_entries_per_category;

        Self {
            config,
            session_id: Uuid::new_v4().to_string(),
            sampled_in,
            initialize_called: AtomicBool::new(false),
            instrumented: AtomicBool::new(false),
            device,
            network: network.unwrap_or_else(NetworkInfo::unavailable),
            network_available,
            current_page: RwLock::new(PageType::Other),
            store: RwLock::new(BoundedMetricStore::new(max_entries)),
            funnel: Mutex::new(funnel),
            interactions: Mutex::new(InteractionTimer::new()),
            channels: RwLock::new(ChannelStates::default()),
            analytics,
            violations,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn is_sampled_in(&self) -> bool {
        self.sampled_in
    }

    /// Wire every enabled instrumentation channel. Idempotent; a no-op for
    /// sessions that were not sampled in. A failing channel is logged and
    /// skipped without affecting its siblings.
    pub fn initialize(&self) {
        if self.initialize_called.swap(true, Ordering::SeqCst) {
            return;
        }
        if !self.sampled_in {
            debug!(session = %self.session_id, "session not sampled in, instrumentation disabled");
            return;
        }
        self.instrumented.store(true, Ordering::SeqCst);

        if !self.network_available {
            warn!("network information unavailable, samples carry empty network context");
        }

        let toggles = self.config.channels.clone();
        let mut states = ChannelStates::default();

        fn wire(name: &str, result: PulseResult<()>, flag: &mut bool) {
            match result {
                Ok(()) => *flag = true,
                Err(e) => warn!(channel = name, error = %e, "instrumentation channel degraded"),
            }
        }

        if toggles.vitals {
            wire("core-vitals", self.init_vitals(), &mut states.vitals);
        }
        if toggles.resources {
            wire("resource-timing", self.init_resources(), &mut states.resources);
        }
        if toggles.funnel {
            wire("booking-funnel", self.init_funnel(), &mut states.funnel);
        }
        if toggles.abandonment {
            wire("abandonment", self.init_abandonment(), &mut states.abandonment);
        }
        if toggles.payment {
            wire("payment", self.init_payment(), &mut states.payment);
        }
        if toggles.interaction {
            wire("interaction", self.init_interaction(), &mut states.interaction);
        }
        if toggles.touch {
            wire("touch", self.init_touch(), &mut states.touch);
        }
        *self.channels.write() = states;

        let sample = self.make_sample("session_start", 1.0, MetricUnit::Count);
        self.record(store::CATEGORY_SESSION, sample);
        info!(session = %self.session_id, "telemetry collector initialized");
    }

    fn init_vitals(&self) -> PulseResult<()> {
        let b = &self.config.budgets;
        if b.lcp_ms <= 0.0 || b.fid_ms <= 0.0 || b.cls <= 0.0 || b.ttfb_ms <= 0.0 || b.fcp_ms <= 0.0
        {
            return Err(PulseError::channel_named(
                "non-positive vital budget",
                "core-vitals",
            ));
        }
        Ok(())
    }

    fn init_resources(&self) -> PulseResult<()> {
        Ok(())
    }

    fn init_funnel(&self) -> PulseResult<()> {
        if self.config.funnel_steps.is_empty() {
            return Err(PulseError::channel_named(
                "no funnel steps configured",
                "booking-funnel",
            ));
        }
        Ok(())
    }

    fn init_abandonment(&self) -> PulseResult<()> {
        if !self.config.channels.funnel || self.config.funnel_steps.is_empty() {
            return Err(PulseError::channel_named(
                "abandonment requires the funnel channel",
                "abandonment",
            ));
        }
        Ok(())
    }

    fn init_payment(&self) -> PulseResult<()> {
        if self.config.payment_url_patterns.is_empty() {
            return Err(PulseError::channel_named(
                "no payment URL patterns configured",
                "payment",
            ));
        }
        Ok(())
    }

    fn init_interaction(&self) -> PulseResult<()> {
        Ok(())
    }

    fn init_touch(&self) -> PulseResult<()> {
        if !self.device.is_mobile() {
            return Err(PulseError::channel_named(
                "touch responsiveness is mobile-only",
                "touch",
            ));
        }
        Ok(())
    }

    fn active(&self) -> bool {
        self.instrumented.load(Ordering::SeqCst)
    }

    fn make_sample(&self, name: &str, value: f64, unit: MetricUnit) -> MetricSample {
        MetricSample {
            name: name.to_string(),
            value,
            unit,
            timestamp: Utc::now(),
            session_id: self.session_id.clone(),
            page_type: *self.current_page.read(),
            device: self.device.clone(),
            network: self.network.clone(),
            journey_steps: self.funnel.lock().journey().to_vec(),
        }
    }

    fn record(&self, category: &str, sample: MetricSample) {
        self.analytics.dispatch(category, &sample);
        self.store.write().insert(category, sample);
    }

    /// Record one Core Web Vital observation, then check it against its
    /// budget immediately
    pub fn record_vital(&self, vital: WebVital, value: f64) {
        if !self.active() || !self.channels.read().vitals {
            return;
        }
        let sample = self.make_sample(vital.metric_name(), value, vital.unit());
        self.record(store::CATEGORY_VITALS, sample);

        let budget = self.config.budgets.budget_for(vital);
        if let Some(severity) = vitals::classify_against_budget(value, budget) {
            self.violations.report(&BudgetViolation {
                metric: vital.metric_name().to_string(),
                value,
                budget,
                severity,
                page_type: *self.current_page.read(),
                device_class: self.device.class,
                network_type: self.network.effective_type.clone(),
            });
        }
    }

    /// Record one observed resource load
    pub fn observe_resource(&self, url: &str, duration_ms: f64, transfer_bytes: u64) {
        if !self.active() || !self.channels.read().resources {
            return;
        }
        let class = resources::classify_resource(&self.config, url);
        let category = match class {
            resources::ResourceClass::Api => store::CATEGORY_API,
            _ => store::CATEGORY_RESOURCES,
        };
        let sample = self.make_sample(class.metric_name(), duration_ms, MetricUnit::Milliseconds);
        self.record(category, sample);

        let size_name = format!("{}_bytes", class.metric_name());
        let size_sample = self.make_sample(&size_name, transfer_bytes as f64, MetricUnit::Bytes);
        self.record(category, size_sample);
    }

    /// Poll the current URL path against the funnel step prefixes
    pub fn observe_navigation(&self, path: &str) {
        if !self.active() {
            return;
        }
        *self.current_page.write() = PageType::from_path(path);

        if !self.channels.read().funnel {
            return;
        }
        let transition = self.funnel.lock().observe_path(path);
        if let Some(t) = transition {
            let name = format!("funnel_{}", t.step);
            let sample =
                self.make_sample(&name, t.elapsed.as_secs_f64() * 1000.0, MetricUnit::Milliseconds);
            self.record(store::CATEGORY_FUNNEL, sample);
        }
    }

    /// Reset the abandonment inactivity clock on any user input
    pub fn record_input_activity(&self) {
        if !self.active() || !self.channels.read().abandonment {
            return;
        }
        self.funnel.lock().record_activity();
    }

    /// Host-driven abandonment probe; records at most one abandonment
    /// sample per session
    pub fn check_abandonment(&self) {
        if !self.active() || !self.channels.read().abandonment {
            return;
        }
        let abandoned = self
            .funnel
            .lock()
            .check_abandonment(self.config.abandonment_threshold);
        if let Some(a) = abandoned {
            warn!(step = %a.last_step, "booking flow abandoned");
            let sample = self.make_sample(
                "booking_abandonment",
                a.inactive_for.as_secs_f64() * 1000.0,
                MetricUnit::Milliseconds,
            );
            self.record(store::CATEGORY_FUNNEL, sample);
        }
    }

    /// Record an outgoing payment call; used by `InstrumentedHttpClient`
    pub fn record_payment_call(&self, url: &str, duration_ms: f64, success: bool) {
        if !self.active() || !self.channels.read().payment {
            return;
        }
        if !resources::is_payment_url(&self.config, url) {
            return;
        }
        let name = if success {
            "payment_call_success"
        } else {
            "payment_call_failure"
        };
        let sample = self.make_sample(name, duration_ms, MetricUnit::Milliseconds);
        self.record(store::CATEGORY_PAYMENT, sample);
    }

    pub fn record_pointer_down(&self) {
        if !self.active() || !self.channels.read().interaction {
            return;
        }
        self.interactions.lock().pointer_down();
    }

    /// Complete a pointer-down/click pair; only delays above the configured
    /// minimum are recorded
    pub fn record_click(&self) {
        if !self.active() || !self.channels.read().interaction {
            return;
        }
        let delay = self.interactions.lock().click();
        if let Some(delay_ms) = delay {
            if delay_ms >= self.config.interaction_delay_min_ms {
                let sample =
                    self.make_sample("interaction_delay", delay_ms, MetricUnit::Milliseconds);
                self.record(store::CATEGORY_INTERACTIONS, sample);
            }
        }
    }

    pub fn record_touch_start(&self) {
        if !self.active() || !self.channels.read().touch {
            return;
        }
        self.interactions.lock().touch_start();
    }

    pub fn record_touch_end(&self) {
        if !self.active() || !self.channels.read().touch {
            return;
        }
        let duration = self.interactions.lock().touch_end();
        if let Some(duration_ms) = duration {
            let sample = self.make_sample("touch_response", duration_ms, MetricUnit::Milliseconds);
            self.record(store::CATEGORY_INTERACTIONS, sample);
        }
    }

    /// Manual instrumentation hook. Not gated by the sampling decision;
    /// requires only that `initialize()` has been called.
    pub fn track_event(&self, name: &str, data: serde_json::Value) {
        if !self.initialize_called.load(Ordering::SeqCst) {
            return;
        }
        let value = data.get("value").and_then(|v| v.as_f64()).unwrap_or(1.0);
        debug!(event = name, payload = %data, "custom event tracked");
        let sample = self.make_sample(name, value, MetricUnit::Count);
        self.record(store::CATEGORY_CUSTOM, sample);
    }

    /// Manual interaction hook; same gating as `track_event`
    pub fn track_interaction(&self, element: &str, action: &str, value: Option<f64>) {
        if !self.initialize_called.load(Ordering::SeqCst) {
            return;
        }
        let name = format!("{}_{}", element, action);
        let sample = self.make_sample(&name, value.unwrap_or(1.0), MetricUnit::Count);
        self.record(store::CATEGORY_INTERACTIONS, sample);
    }

    /// Full current buffer snapshot (category -> samples)
    pub fn metrics(&self) -> HashMap<String, Vec<MetricSample>> {
        self.store.read().snapshot()
    }

    /// Latest vital observations versus their budgets
    pub fn performance_summary(&self) -> PerformanceSummary {
        let store = self.store.read();
        let mut summary = PerformanceSummary::default();

        for vital in WebVital::ALL {
            let name = vital.metric_name();
            if let Some(latest) = store.latest_named(store::CATEGORY_VITALS, name) {
                let budget = self.config.budgets.budget_for(vital);
                let samples = store
                    .category(store::CATEGORY_VITALS)
                    .iter()
                    .filter(|s| s.name == name)
                    .count();
                summary.vitals.insert(
                    name.to_string(),
                    VitalSummary {
                        value: latest.value,
                        rating: vital.rating(latest.value),
                        budget,
                        within_budget: latest.value <= budget,
                        samples,
                    },
                );
            }
        }
        summary
    }

    /// Reset all buffers and timers. The sampling decision and session
    /// identity are preserved; in-flight async work is not cancelled.
    pub fn clear_data(&self) {
        self.store.write().clear();
        self.funnel.lock().reset();
        self.interactions.lock().reset();
        info!(session = %self.session_id, "telemetry buffers cleared");
    }
}
