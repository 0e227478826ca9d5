use crate::prelude::*;

/// Drives the virtual clock from elapsed real time.
///
/// The caller measures real time and feeds it in, usually once per UI
/// frame. Real time that passes while the pacer is stopped is dropped, so
/// the clock doesn't jump forward on resume.
#[derive(Copy, Clone, Default, Debug)]
pub struct Pacer {
    running: bool,
}

impl Pacer {
    /// Stopped pacer.
    pub fn new() -> Self {
        Default::default()
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Run the simulation for `real_dt` seconds of real time scaled by the
    /// configured time scale.
    ///
    /// Returns the amount of virtual time that passed.
    pub fn advance(&mut self, r: &mut Runtime, real_dt: f64) -> f64 {
        if !self.running || !(real_dt > 0.0) {
            return 0.0;
        }
        let dt = real_dt * r.settings().time_scale.max(0.0);
        r.step(dt);
        dt
    }
}
