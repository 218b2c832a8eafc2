use crate::snapshot::SystemSnapshot;
use prometheus::core::Collector;
use prometheus::{opts, Counter, CounterVec, Encoder, Gauge, Registry, TextEncoder};
use std::sync::Arc;

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub vitalsd_info_requests_total: Counter,
    pub vitalsd_collector_fallbacks_total: CounterVec,
    pub vitalsd_scrape_count_total: Counter,
    pub vitalsd_cpu_usage_percent: Gauge,
    pub vitalsd_memory_used_mb: Gauge,
    pub vitalsd_memory_total_mb: Gauge,
    pub vitalsd_disk_used_gb: Gauge,
    pub vitalsd_disk_total_gb: Gauge,
    pub vitalsd_uptime_seconds: Gauge,
}

impl Metrics {
    pub fn new() -> Result<Arc<Self>, prometheus::Error> {
        let registry = Registry::new();

        let vitalsd_info_requests_total = Counter::with_opts(opts!(
            "vitalsd_info_requests_total",
            "Number of /api/server-info requests"
        ))?;
        let vitalsd_collector_fallbacks_total = CounterVec::new(
            opts!(
                "vitalsd_collector_fallbacks_total",
                "Degraded collector results total by collector"
            ),
            &["collector"],
        )?;
        let vitalsd_scrape_count_total = Counter::with_opts(opts!(
            "vitalsd_scrape_count_total",
            "Number of /metrics scrapes"
        ))?;
        let vitalsd_cpu_usage_percent = Gauge::with_opts(opts!(
            "vitalsd_cpu_usage_percent",
            "CPU usage from the last snapshot in percent (0..100)"
        ))?;
        let vitalsd_memory_used_mb = Gauge::with_opts(opts!(
            "vitalsd_memory_used_mb",
            "Used memory from the last snapshot in megabytes"
        ))?;
        let vitalsd_memory_total_mb = Gauge::with_opts(opts!(
            "vitalsd_memory_total_mb",
            "Total memory from the last snapshot in megabytes"
        ))?;
        let vitalsd_disk_used_gb = Gauge::with_opts(opts!(
            "vitalsd_disk_used_gb",
            "Aggregated used disk space from the last snapshot in gigabytes"
        ))?;
        let vitalsd_disk_total_gb = Gauge::with_opts(opts!(
            "vitalsd_disk_total_gb",
            "Aggregated total disk space from the last snapshot in gigabytes"
        ))?;
        let vitalsd_uptime_seconds = Gauge::with_opts(opts!(
            "vitalsd_uptime_seconds",
            "Host uptime from the last snapshot in seconds"
        ))?;

        register(&registry, &vitalsd_info_requests_total)?;
        register(&registry, &vitalsd_collector_fallbacks_total)?;
        register(&registry, &vitalsd_scrape_count_total)?;
        register(&registry, &vitalsd_cpu_usage_percent)?;
        register(&registry, &vitalsd_memory_used_mb)?;
        register(&registry, &vitalsd_memory_total_mb)?;
        register(&registry, &vitalsd_disk_used_gb)?;
        register(&registry, &vitalsd_disk_total_gb)?;
        register(&registry, &vitalsd_uptime_seconds)?;

        Ok(Arc::new(Self {
            registry,
            vitalsd_info_requests_total,
            vitalsd_collector_fallbacks_total,
            vitalsd_scrape_count_total,
            vitalsd_cpu_usage_percent,
            vitalsd_memory_used_mb,
            vitalsd_memory_total_mb,
            vitalsd_disk_used_gb,
            vitalsd_disk_total_gb,
            vitalsd_uptime_seconds,
        }))
    }

    pub fn update_from_snapshot(&self, snapshot: &SystemSnapshot) {
        self.vitalsd_cpu_usage_percent.set(snapshot.cpu_usage);
        self.vitalsd_memory_used_mb
            .set(snapshot.memory_usage.used_mb);
        self.vitalsd_memory_total_mb
            .set(snapshot.memory_usage.total_mb);
        self.vitalsd_disk_used_gb.set(snapshot.disk_usage.used_gb);
        self.vitalsd_disk_total_gb.set(snapshot.disk_usage.total_gb);

        let uptime = snapshot.uptime.day * 86_400
            + snapshot.uptime.hour * 3_600
            + snapshot.uptime.minute * 60
            + snapshot.uptime.second;
        self.vitalsd_uptime_seconds.set(uptime as f64);
    }

    pub fn inc_info_request(&self) {
        self.vitalsd_info_requests_total.inc();
    }

    pub fn inc_collector_fallback(&self, collector: &str) {
        self.vitalsd_collector_fallbacks_total
            .with_label_values(&[collector])
            .inc();
    }

    pub fn inc_scrape_count(&self) {
        self.vitalsd_scrape_count_total.inc();
    }

    pub fn encode_metrics(&self) -> Result<Vec<u8>, prometheus::Error> {
        let mut buf = Vec::new();
        let encoder = TextEncoder::new();
        let mf = self.registry.gather();
        encoder.encode(&mf, &mut buf)?;
        Ok(buf)
    }
}

fn register<T: Collector + Clone + 'static>(
    registry: &Registry,
    collector: &T,
) -> Result<(), prometheus::Error> {
    registry.register(Box::new(collector.clone()))
}
