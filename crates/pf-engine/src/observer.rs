//! Per-tick observers and the sampling data collector.

use crate::engine::Engine;
use crate::error::{EngineError, EngineResult};

/// Notified once after every completed tick.
pub trait TickObserver {
    fn on_tick(&mut self, engine: &Engine) -> EngineResult<()>;
}

/// Observer that does nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullObserver;

impl TickObserver for NullObserver {
    fn on_tick(&mut self, _engine: &Engine) -> EngineResult<()> {
        Ok(())
    }
}

/// One sampled row.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    pub time: f64,
    pub values: Vec<f64>,
}

/// Samples a fixed list of dotted property paths at a regular interval.
#[derive(Clone, Debug)]
pub struct DataCollector {
    paths: Vec<String>,
    sample_interval: f64,
    stride: Option<u64>,
    rows: Vec<Sample>,
}

impl DataCollector {
    /// `sample_interval` is rounded to a whole number of ticks (at least
    /// one) on the first tick.
    pub fn new<I, S>(paths: I, sample_interval: f64) -> EngineResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if !(sample_interval.is_finite() && sample_interval >= 0.0) {
            return Err(EngineError::InvalidArg {
                what: "sample interval must be finite and non-negative",
            });
        }
        Ok(Self {
            paths: paths.into_iter().map(Into::into).collect(),
            sample_interval,
            stride: None,
            rows: Vec::new(),
        })
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn rows(&self) -> &[Sample] {
        &self.rows
    }

    /// Fail early if any path does not resolve to a number.
    pub fn check(&self, engine: &Engine) -> EngineResult<()> {
        for path in &self.paths {
            engine.get_number(path)?;
        }
        Ok(())
    }

    /// Take a sample now, regardless of the interval.
    pub fn sample(&mut self, engine: &Engine) -> EngineResult<()> {
        let values = self
            .paths
            .iter()
            .map(|p| engine.get_number(p))
            .collect::<EngineResult<Vec<_>>>()?;
        self.rows.push(Sample {
            time: engine.time(),
            values,
        });
        Ok(())
    }

    /// `(time, value)` pairs for one path.
    pub fn series(&self, path: &str) -> Option<Vec<(f64, f64)>> {
        let column = self.paths.iter().position(|p| p == path)?;
        Some(self.rows.iter().map(|r| (r.time, r.values[column])).collect())
    }

    pub fn to_csv(&self) -> String {
        let mut out = String::from("time");
        for path in &self.paths {
            out.push(',');
            out.push_str(path);
        }
        out.push('\n');
        for row in &self.rows {
            out.push_str(&row.time.to_string());
            for v in &row.values {
                out.push_str(&format!(",{v}"));
            }
            out.push('\n');
        }
        out
    }
}

impl TickObserver for DataCollector {
    fn on_tick(&mut self, engine: &Engine) -> EngineResult<()> {
        let stride = *self.stride.get_or_insert_with(|| {
            ((self.sample_interval / engine.time_step()).round() as u64).max(1)
        });
        if engine.ticks() % stride == 0 {
            self.sample(engine)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_has_header_and_one_line_per_row() {
        let mut collector = DataCollector::new(["A.vol", "A.pres"], 0.01).unwrap();
        collector.rows.push(Sample {
            time: 0.0,
            values: vec![1.0, 2.5],
        });
        collector.rows.push(Sample {
            time: 0.01,
            values: vec![0.5, -3.0],
        });
        assert_eq!(collector.to_csv(), "time,A.vol,A.pres\n0,1,2.5\n0.01,0.5,-3\n");
    }

    #[test]
    fn negative_interval_is_rejected() {
        assert!(DataCollector::new(["A.vol"], -1.0).is_err());
    }
}
