//! Prometheus counters served on `/metrics`.
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

pub struct Metrics {
    registry: Registry,
    /// SPML uploads by outcome (`success` / `failure`)
    pub imports: IntCounterVec,
    pub exports: IntCounter,
    /// Sign writes by kind (`added` / `updated`)
    pub signs_written: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let imports = IntCounterVec::new(
            Opts::new("puddle_imports_total", "SPML uploads processed"),
            &["outcome"],
        )?;
        let exports = IntCounter::new("puddle_exports_total", "SPML documents exported")?;
        let signs_written = IntCounterVec::new(
            Opts::new("puddle_signs_written_total", "Signs written by dictionary imports"),
            &["kind"],
        )?;

        registry.register(Box::new(imports.clone()))?;
        registry.register(Box::new(exports.clone()))?;
        registry.register(Box::new(signs_written.clone()))?;

        Ok(Self {
            registry,
            imports,
            exports,
            signs_written,
        })
    }

    pub fn record_import(&self, success: bool) {
        let outcome = if success { "success" } else { "failure" };
        self.imports.with_label_values(&[outcome]).inc();
    }

    pub fn record_signs(&self, added: usize, updated: usize) {
        self.signs_written
            .with_label_values(&["added"])
            .inc_by(added as u64);
        self.signs_written
            .with_label_values(&["updated"])
            .inc_by(updated as u64);
    }

    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_are_encoded() {
        let metrics = Metrics::new().unwrap();
        metrics.record_import(true);
        metrics.record_import(false);
        metrics.record_signs(3, 1);
        metrics.exports.inc();

        let text = metrics.encode().unwrap();
        assert!(text.contains("puddle_imports_total{outcome=\"success\"} 1"));
        assert!(text.contains("puddle_imports_total{outcome=\"failure\"} 1"));
        assert!(text.contains("puddle_signs_written_total{kind=\"added\"} 3"));
        assert!(text.contains("puddle_exports_total 1"));
    }
}
