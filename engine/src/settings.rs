use serde::{Deserialize, Serialize};

/// Tunable simulation parameters.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Settings {
    /// Grid size used by `Runtime::new`.
    pub world_width: i32,
    pub world_height: i32,

    /// How long an idle task sleeps between wakeups.
    pub idle_timeout: f64,
    /// Priority of background behaviors, lower values are more urgent.
    pub idle_priority: i32,
    /// Priority of player navigation commands.
    pub navigate_priority: i32,

    /// Movement speeds in cells per unit of virtual time.
    pub marine_speed: f64,
    pub alien_speed: f64,

    pub fov_radius: i32,
    pub sensor_radius: i32,

    pub camera_width: i32,
    pub camera_height: i32,

    /// Chance a roaming alien changes heading before taking a step.
    pub roam_turn_chance: f64,

    /// Units of virtual time that pass per second of real time.
    pub time_scale: f64,

    pub seed: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            world_width: 200,
            world_height: 200,
            idle_timeout: 100.0,
            idle_priority: 10,
            navigate_priority: 0,
            marine_speed: 100.0,
            alien_speed: 2.0,
            fov_radius: 10,
            sensor_radius: 8,
            camera_width: 90,
            camera_height: 45,
            roam_turn_chance: 0.25,
            time_scale: 1.0,
            seed: 0xdeadbeef,
        }
    }
}

impl Settings {
    /// Parse settings from IDM text, missing fields get default values.
    pub fn from_idm(text: &str) -> anyhow::Result<Self> {
        Ok(idm::from_str(text)?)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() {
        let s = Settings::default();
        assert!(s.navigate_priority < s.idle_priority);
        assert!(s.marine_speed > 0.0 && s.alien_speed > 0.0);
        assert!(s.world_width > 0 && s.world_height > 0);
    }

    #[test]
    fn idm_round_trip() {
        let mut s = Settings::default();
        s.world_width = 32;
        s.idle_timeout = 12.5;
        s.seed = 7;

        let text = idm::to_string(&s).unwrap();
        assert_eq!(Settings::from_idm(&text).unwrap(), s);
    }
}
