#[cfg(feature = "metrics")]
pub struct Metrics {
    namespace: String,
    registry: prometheus::Registry,
}

#[cfg(feature = "metrics")]
impl Metrics {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            registry: prometheus::Registry::new(),
        }
    }

    pub fn registry(&self) -> &prometheus::Registry {
        &self.registry
    }

    /// Prefixes `name` with the registry namespace.
    pub fn metric_name(&self, name: &str) -> String {
        format!("{}_{name}", self.namespace)
    }

    pub fn counter(&self, name: &str, help: &str) -> anyhow::Result<prometheus::IntCounter> {
        let counter =
            prometheus::IntCounter::with_opts(prometheus::Opts::new(self.metric_name(name), help))?;
        self.registry.register(Box::new(counter.clone()))?;
        Ok(counter)
    }

    pub fn counter_vec(
        &self,
        name: &str,
        help: &str,
        labels: &[&str],
    ) -> anyhow::Result<prometheus::IntCounterVec> {
        let counter = prometheus::IntCounterVec::new(
            prometheus::Opts::new(self.metric_name(name), help),
            labels,
        )?;
        self.registry.register(Box::new(counter.clone()))?;
        Ok(counter)
    }

    pub fn gather(&self) -> String {
        use prometheus::Encoder;

        let encoder = prometheus::TextEncoder::new();
        let mf = self.registry.gather();
        let mut buf = Vec::new();
        let _ = encoder.encode(&mf, &mut buf);
        String::from_utf8_lossy(&buf).to_string()
    }
}

#[cfg(not(feature = "metrics"))]
pub struct Metrics;

#[cfg(not(feature = "metrics"))]
impl Metrics {
    pub fn new(_namespace: impl Into<String>) -> Self {
        Metrics
    }

    pub fn gather(&self) -> String {
        String::new()
    }
}
