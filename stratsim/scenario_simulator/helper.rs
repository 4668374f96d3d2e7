use std::{fmt, path::PathBuf, sync::Arc};

use anyhow::Result;
use rand::{rngs::SmallRng, Rng, SeedableRng};
use serde_json::Value;
use sim_logging::{JsonLogger, LogLevel, LogRecord, LogSink};

/// Telemetry builder for the simulator.
pub struct SimulationTelemetryBuilder {
    module: String,
    log_path: Option<PathBuf>,
    sinks: Vec<Arc<dyn LogSink>>,
    min_level: LogLevel,
}

impl SimulationTelemetryBuilder {
    /// Creates a new builder scoped to a module label.
    #[must_use]
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            log_path: None,
            sinks: Vec::new(),
            min_level: LogLevel::Info,
        }
    }

    /// Appends JSON lines to a file.
    #[must_use]
    pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    /// Adds an extra sink.
    #[must_use]
    pub fn sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Drops records below this level.
    #[must_use]
    pub fn min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Builds telemetry, opening the log file if one was configured.
    pub fn build(self) -> Result<SimulationTelemetry> {
        let mut sinks = self.sinks;
        if let Some(path) = self.log_path {
            sinks.push(Arc::new(JsonLogger::new(path)?));
        }
        Ok(SimulationTelemetry {
            inner: Arc::new(TelemetryInner {
                module: self.module,
                sinks,
                min_level: self.min_level,
            }),
        })
    }
}

/// Telemetry handle shared across simulator components and sample workers.
#[derive(Clone)]
pub struct SimulationTelemetry {
    inner: Arc<TelemetryInner>,
}

impl fmt::Debug for SimulationTelemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulationTelemetry")
            .field("module", &self.inner.module)
            .field("sinks", &self.inner.sinks.len())
            .field("min_level", &self.inner.min_level)
            .finish()
    }
}

struct TelemetryInner {
    module: String,
    sinks: Vec<Arc<dyn LogSink>>,
    min_level: LogLevel,
}

impl SimulationTelemetry {
    /// Returns a builder.
    #[must_use]
    pub fn builder(module: impl Into<String>) -> SimulationTelemetryBuilder {
        SimulationTelemetryBuilder::new(module)
    }

    /// Writes a record to every sink; the first sink error is returned after all sinks ran.
    pub fn log(&self, level: LogLevel, message: &str, metadata: Value) -> Result<()> {
        if level < self.inner.min_level {
            return Ok(());
        }
        let record = LogRecord::new(&self.inner.module, level, message).with_metadata(metadata);
        let mut first_err = None;
        for sink in &self.inner.sinks {
            if let Err(err) = sink.write(&record) {
                first_err.get_or_insert(err);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

/// Generates a random run seed.
#[must_use]
pub fn random_seed() -> u64 {
    rand::thread_rng().gen()
}

/// Returns a reproducible RNG.
#[must_use]
pub fn seeded_rng(seed: u64) -> SmallRng {
    SmallRng::seed_from_u64(seed)
}

/// Seed for one sample of a run.
#[must_use]
pub fn sample_seed(run_seed: u64, index: usize) -> u64 {
    run_seed.wrapping_add(index as u64)
}
