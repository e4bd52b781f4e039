//! Cardiac timing controller.
//!
//! A sinus node fires every `60 / heart_rate` seconds. Each beat runs one
//! cycle through the phases below, measured from the start of atrial
//! depolarization:
//!
//! ```text
//! | P wave | AV delay | QRS | QTc (refractory) | idle ...
//! 0      p_time    pq_time  +qrs_time        +cqt
//! ```
//!
//! Atrial activation is a half sine over the PQ interval. Ventricular
//! activation is a sine over QRS + QTc whose peak is pulled forward by
//! `ventricular_skew`. A beat that fires before the previous cycle has ended
//! waits until the controller is idle again.

use std::f64::consts::PI;
use std::fmt;

use pf_core::numeric::compose_factors;
use pf_core::{AttrValue, CompId};
use tracing::debug;

use crate::common::{self, names, number, positive, resolve_capacitive, unknown};
use crate::context::TickContext;
use crate::error::{ComponentError, ComponentResult};
use crate::traits::{Component, ComponentMeta, RegistryHandle, StepOutcome};

/// Phase of the cardiac cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CardiacPhase {
    #[default]
    Idle,
    AtrialDepolarization,
    AvDelay,
    VentricularDepolarization,
    Refractory,
}

impl CardiacPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            CardiacPhase::Idle => "idle",
            CardiacPhase::AtrialDepolarization => "atrial_depolarization",
            CardiacPhase::AvDelay => "av_delay",
            CardiacPhase::VentricularDepolarization => "ventricular_depolarization",
            CardiacPhase::Refractory => "refractory",
        }
    }
}

impl fmt::Display for CardiacPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug)]
pub struct Heart {
    meta: ComponentMeta,
    /// Reference heart rate (beats/min)
    pub heart_rate_ref: f64,
    /// P wave duration (s)
    pub p_time: f64,
    /// PQ interval (s)
    pub pq_time: f64,
    pub qrs_time: f64,
    /// QT interval at 60 beats/min (s)
    pub qt_time: f64,
    /// Exponent applied to the ventricular cycle fraction; below 1 gives a
    /// fast rise and slow relaxation.
    pub ventricular_skew: f64,
    pub hr_factor: f64,
    pub hr_factor_ps: f64,
    /// Autonomic modulation, persistent.
    pub hr_ans_factor: f64,
    pub atrial_chambers: Vec<String>,
    pub ventricular_chambers: Vec<String>,
    atrial_ids: Vec<CompId>,
    ventricular_ids: Vec<CompId>,

    heart_rate: f64,
    cqt_time: f64,
    phase: CardiacPhase,
    sa_timer: f64,
    cycle_timer: f64,
    beat_pending: bool,
    beats: u64,
    aaf: f64,
    vaf: f64,
}

impl Heart {
    pub const MODEL_TYPE: &'static str = "Heart";

    const KEYS: [&'static str; 11] = [
        "heart_rate_ref",
        "p_time",
        "pq_time",
        "qrs_time",
        "qt_time",
        "ventricular_skew",
        "hr_factor",
        "hr_factor_ps",
        "hr_ans_factor",
        "atrial_chambers",
        "ventricular_chambers",
    ];

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            meta: ComponentMeta::new(name),
            heart_rate_ref: 60.0,
            p_time: 0.08,
            pq_time: 0.16,
            qrs_time: 0.09,
            qt_time: 0.4,
            ventricular_skew: 0.75,
            hr_factor: 1.0,
            hr_factor_ps: 1.0,
            hr_ans_factor: 1.0,
            atrial_chambers: Vec::new(),
            ventricular_chambers: Vec::new(),
            atrial_ids: Vec::new(),
            ventricular_ids: Vec::new(),
            heart_rate: 60.0,
            cqt_time: 0.4,
            phase: CardiacPhase::Idle,
            sa_timer: 0.0,
            cycle_timer: 0.0,
            beat_pending: false,
            beats: 0,
            aaf: 0.0,
            vaf: 0.0,
        }
    }

    pub fn phase(&self) -> CardiacPhase {
        self.phase
    }

    /// Heart rate in effect this tick (beats/min).
    pub fn heart_rate(&self) -> f64 {
        self.heart_rate
    }

    /// Atrial and ventricular activation of the last tick.
    pub fn activation(&self) -> (f64, f64) {
        (self.aaf, self.vaf)
    }

    /// Cycles started so far.
    pub fn beats(&self) -> u64 {
        self.beats
    }

    /// Rate-corrected QT: `qt_time · sqrt(60 / hr)`.
    pub fn corrected_qt(qt_time: f64, heart_rate: f64) -> f64 {
        qt_time * (60.0 / heart_rate).sqrt()
    }

    fn classify(&self, t: f64) -> CardiacPhase {
        let qrs_end = self.pq_time + self.qrs_time;
        if t < self.p_time {
            CardiacPhase::AtrialDepolarization
        } else if t < self.pq_time {
            CardiacPhase::AvDelay
        } else if t < qrs_end {
            CardiacPhase::VentricularDepolarization
        } else if t < qrs_end + self.cqt_time {
            CardiacPhase::Refractory
        } else {
            CardiacPhase::Idle
        }
    }

    /// Advance timers and phase by `dt`, recomputing both activations.
    pub fn advance(&mut self, dt: f64) -> ComponentResult<()> {
        self.heart_rate = compose_factors(
            self.heart_rate_ref,
            &[self.hr_factor, self.hr_factor_ps, self.hr_ans_factor],
        );
        self.hr_factor = 1.0;
        if !(self.heart_rate.is_finite() && self.heart_rate > 0.0) {
            return Err(ComponentError::NonPhysical {
                what: "heart rate",
            });
        }
        self.cqt_time = Self::corrected_qt(self.qt_time, self.heart_rate);

        let period = 60.0 / self.heart_rate;
        self.sa_timer += dt;
        if self.sa_timer >= period {
            self.sa_timer -= period;
            if self.beat_pending {
                debug!(component = %self.meta.name, "sinus beat dropped while previous beat held");
            }
            self.beat_pending = true;
        }

        if self.phase == CardiacPhase::Idle {
            if self.beat_pending {
                self.beat_pending = false;
                self.beats += 1;
                self.cycle_timer = 0.0;
                self.phase = CardiacPhase::AtrialDepolarization;
            }
        } else {
            self.cycle_timer += dt;
            self.phase = self.classify(self.cycle_timer);
        }

        let t = self.cycle_timer;
        let window = self.qrs_time + self.cqt_time;
        (self.aaf, self.vaf) = if self.phase == CardiacPhase::Idle {
            (0.0, 0.0)
        } else {
            let aaf = if t < self.pq_time {
                (PI * t / self.pq_time).sin()
            } else {
                0.0
            };
            let vaf = if t >= self.pq_time && t < self.pq_time + window {
                let fraction = (t - self.pq_time) / window;
                (PI * fraction.powf(self.ventricular_skew)).sin()
            } else {
                0.0
            };
            (aaf.clamp(0.0, 1.0), vaf.clamp(0.0, 1.0))
        };
        Ok(())
    }
}

impl Component for Heart {
    fn meta(&self) -> &ComponentMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut ComponentMeta {
        &mut self.meta
    }

    fn model_type(&self) -> &'static str {
        Self::MODEL_TYPE
    }

    fn set_attribute(&mut self, key: &str, value: &AttrValue) -> ComponentResult<()> {
        match key {
            "heart_rate_ref" => self.heart_rate_ref = positive(key, value)?,
            "p_time" => self.p_time = positive(key, value)?,
            "pq_time" => self.pq_time = positive(key, value)?,
            "qrs_time" => self.qrs_time = positive(key, value)?,
            "qt_time" => self.qt_time = positive(key, value)?,
            "ventricular_skew" => self.ventricular_skew = positive(key, value)?,
            "hr_factor" => self.hr_factor = number(key, value)?,
            "hr_factor_ps" => self.hr_factor_ps = number(key, value)?,
            "hr_ans_factor" => self.hr_ans_factor = number(key, value)?,
            "atrial_chambers" => {
                self.atrial_chambers = names(key, value)?;
                self.atrial_ids.clear();
            }
            "ventricular_chambers" => {
                self.ventricular_chambers = names(key, value)?;
                self.ventricular_ids.clear();
            }
            _ => return Err(unknown(&self.meta.name, key)),
        }
        Ok(())
    }

    fn attribute(&self, key: &str) -> Option<AttrValue> {
        let v = match key {
            "heart_rate_ref" => self.heart_rate_ref,
            "p_time" => self.p_time,
            "pq_time" => self.pq_time,
            "qrs_time" => self.qrs_time,
            "qt_time" => self.qt_time,
            "ventricular_skew" => self.ventricular_skew,
            "hr_factor" => self.hr_factor,
            "hr_factor_ps" => self.hr_factor_ps,
            "hr_ans_factor" => self.hr_ans_factor,
            "heart_rate" => self.heart_rate,
            "cqt_time" => self.cqt_time,
            "aaf" => self.aaf,
            "vaf" => self.vaf,
            "beats" => self.beats as f64,
            "atrial_chambers" => return Some(AttrValue::Names(self.atrial_chambers.clone())),
            "ventricular_chambers" => {
                return Some(AttrValue::Names(self.ventricular_chambers.clone()));
            }
            "phase" => return Some(AttrValue::Text(self.phase.as_str().to_string())),
            _ => return None,
        };
        Some(AttrValue::Number(v))
    }

    fn attribute_keys(&self) -> Vec<&'static str> {
        Self::KEYS.to_vec()
    }

    fn resolve(&mut self, registry: &dyn RegistryHandle) -> ComponentResult<()> {
        // checked here so attribute order within one init does not matter
        if self.p_time > self.pq_time {
            return Err(ComponentError::InvalidValue {
                key: "p_time".to_string(),
                reason: "p_time must not exceed pq_time",
            });
        }
        let owner = self.meta.name.as_str();
        self.atrial_ids = self
            .atrial_chambers
            .iter()
            .map(|n| resolve_capacitive(owner, n, registry))
            .collect::<ComponentResult<_>>()?;
        self.ventricular_ids = self
            .ventricular_chambers
            .iter()
            .map(|n| resolve_capacitive(owner, n, registry))
            .collect::<ComponentResult<_>>()?;
        Ok(())
    }

    fn calc(&mut self, ctx: &mut TickContext<'_>) -> ComponentResult<StepOutcome> {
        self.advance(ctx.dt)?;
        common::check_finite(self.vaf, "ventricular activation")?;
        for &id in &self.atrial_ids {
            ctx.capacitive_mut(id)?.set_activation(self.aaf);
        }
        for &id in &self.ventricular_ids {
            ctx.capacitive_mut(id)?.set_activation(self.vaf);
        }
        Ok(StepOutcome::Done)
    }
}
