//! Cardiac electrical timing and the varying-elastance activation driver
//! (spec §4.5), grounded on
//! `original_source/explain_core/core_models/Heart.py`.
//!
//! The original depends on an `ecg` component for `ncc_atrial`/
//! `ncc_ventricular` tick counters and the `pq_time`/`qrs_time`/`cqt_time`
//! durations but the reference source never defines that component itself
//! (SPEC_FULL.md §5.1) — `Ecg` below supplies it: a fixed-rate pacemaker
//! that advances one cycle counter per tick and derives the atrial and
//! ventricular counters from it with a configurable AV delay.

use crate::math::gaussian;

/// Fixed-rate cardiac pacemaker producing the tick counters the heart
/// driver windows its activation functions against.
#[derive(Debug, Clone)]
pub struct Ecg {
    pub name: String,
    pub enabled: bool,

    pub heart_rate: f64,
    pub pq_time: f64,
    pub qrs_time: f64,
    pub cqt_time: f64,
    pub av_delay: f64,

    pub ncc_atrial: i64,
    pub ncc_ventricular: i64,
    cycle_counter: i64,
}

impl Ecg {
    pub fn new(name: impl Into<String>) -> Self {
        Ecg {
            name: name.into(),
            enabled: true,
            heart_rate: 140.0,
            pq_time: 0.1,
            qrs_time: 0.075,
            cqt_time: 0.26,
            av_delay: 0.1,
            ncc_atrial: 0,
            ncc_ventricular: -1,
            cycle_counter: 0,
        }
    }

    pub fn ventricular_duration(&self) -> f64 {
        self.qrs_time + self.cqt_time
    }

    /// Advances the pacemaker by one tick of size `dt`.
    pub fn step(&mut self, dt: f64) {
        if !self.enabled {
            return;
        }
        let cycle_length = ((60.0 / self.heart_rate) / dt).round() as i64;
        let av_delay_ticks = (self.av_delay / dt).round() as i64;

        self.cycle_counter += 1;
        if self.cycle_counter >= cycle_length {
            self.cycle_counter = 0;
        }

        self.ncc_atrial = self.cycle_counter;
        self.ncc_ventricular = self.cycle_counter - av_delay_ticks;
    }
}

/// Writes atrial/ventricular activation factors into the four chambers
/// and the coronaries each tick.
#[derive(Debug, Clone)]
pub struct HeartDriver {
    pub name: String,
    pub enabled: bool,

    pub ecg: usize,
    pub ra: usize,
    pub la: usize,
    pub rv: usize,
    pub lv: usize,
    pub cor: usize,

    pub aaf: f64,
    pub vaf: f64,
    pub state: u8,
}

impl HeartDriver {
    pub fn new(name: impl Into<String>, ecg: usize, ra: usize, la: usize, rv: usize, lv: usize, cor: usize) -> Self {
        HeartDriver {
            name: name.into(),
            enabled: true,
            ecg,
            ra,
            la,
            rv,
            lv,
            cor,
            aaf: 0.0,
            vaf: 0.0,
            state: 0,
        }
    }

    /// spec §4.5: computes this tick's atrial/ventricular activation
    /// factors from the ECG's counters. Returns `None` when disabled.
    pub fn activate(&mut self, dt: f64, ncc_atrial: i64, ncc_ventricular: i64, pq_time: f64, ventricular_duration: f64) {
        if !self.enabled {
            return;
        }

        let atrial_window = (pq_time / dt) as i64;
        self.aaf = if ncc_atrial >= 0 && ncc_atrial < atrial_window {
            let t = ncc_atrial as f64 * dt;
            gaussian(t, 1.0, 0.5 * pq_time, 0.2 * pq_time)
        } else {
            0.0
        };

        let ventricular_window = (ventricular_duration / dt) as i64;
        if ncc_ventricular >= 0 && ncc_ventricular < ventricular_window {
            let t = ncc_ventricular as f64 * dt;
            let vaf1 = gaussian(t, 0.5, 0.5 * ventricular_duration, 0.2 * ventricular_duration);
            let vaf2 = gaussian(t, 0.59, 0.6 * ventricular_duration, 0.13 * ventricular_duration);
            self.vaf = vaf1 + vaf2;
            self.state = 1;
        } else {
            self.vaf = 0.0;
            self.state = 0;
        }
    }
}
