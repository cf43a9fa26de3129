use std::path::Path;

use miette::{Context, IntoDiagnostic, miette};
use serde::Deserialize;

/// Named, bounded coefficients consumed by time management. Constructed
/// once at startup and passed by reference into the components that use
/// them; an external tuning framework adjusts them by name between
/// searches, never mid-search.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Tunables {
    pub base_time_scale: f64,
    pub increment_scale: f64,
    pub percent_limit: f64,
    pub hard_limit_scale: f64,
    pub soft_limit_scale: f64,
    pub node_fraction_base: f64,
    pub node_fraction_scale: f64,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            base_time_scale: 54.0,
            increment_scale: 85.0,
            percent_limit: 76.0,
            hard_limit_scale: 304.0,
            soft_limit_scale: 76.0,
            node_fraction_base: 152.0,
            node_fraction_scale: 174.0,
        }
    }
}

/// (name, min, max) for every tunable, the surface exposed to the tuner
const BOUNDS: [(&str, f64, f64); 7] = [
    ("base_time_scale", 0.0, 1000.0),
    ("increment_scale", 0.0, 100.0),
    ("percent_limit", 0.0, 1000.0),
    ("hard_limit_scale", 100.0, 450.0),
    ("soft_limit_scale", 0.0, 150.0),
    ("node_fraction_base", 50.0, 250.0),
    ("node_fraction_scale", 50.0, 250.0),
];

impl Tunables {
    pub fn load(path: &Path) -> miette::Result<Self> {
        let text = std::fs::read_to_string(path)
            .into_diagnostic()
            .with_context(|| format!("reading tunables from {}", path.display()))?;
        let tunables: Self = toml::from_str(&text)
            .into_diagnostic()
            .context("parsing tunables TOML")?;
        tunables.validate()?;
        Ok(tunables)
    }

    pub fn validate(&self) -> miette::Result<()> {
        for (name, min, max) in BOUNDS {
            let value = self.get(name).expect("bounds table names a known field");
            miette::ensure!(
                (min..=max).contains(&value),
                "tunable {name} = {value} outside [{min}, {max}]"
            );
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        Some(match name {
            "base_time_scale" => self.base_time_scale,
            "increment_scale" => self.increment_scale,
            "percent_limit" => self.percent_limit,
            "hard_limit_scale" => self.hard_limit_scale,
            "soft_limit_scale" => self.soft_limit_scale,
            "node_fraction_base" => self.node_fraction_base,
            "node_fraction_scale" => self.node_fraction_scale,
            _ => return None,
        })
    }

    /// By-name setter for the tuning framework, with bound enforcement
    pub fn set(&mut self, name: &str, value: f64) -> miette::Result<()> {
        let (_, min, max) = BOUNDS
            .iter()
            .find(|(n, _, _)| *n == name)
            .ok_or_else(|| miette!("unknown tunable: {name}"))?;
        miette::ensure!(
            (*min..=*max).contains(&value),
            "tunable {name} = {value} outside [{min}, {max}]"
        );
        match name {
            "base_time_scale" => self.base_time_scale = value,
            "increment_scale" => self.increment_scale = value,
            "percent_limit" => self.percent_limit = value,
            "hard_limit_scale" => self.hard_limit_scale = value,
            "soft_limit_scale" => self.soft_limit_scale = value,
            "node_fraction_base" => self.node_fraction_base = value,
            "node_fraction_scale" => self.node_fraction_scale = value,
            _ => unreachable!("bounds table covers every name"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_within_bounds() {
        Tunables::default().validate().unwrap();
    }

    #[test]
    fn set_enforces_bounds() {
        let mut tunables = Tunables::default();
        tunables.set("hard_limit_scale", 200.0).unwrap();
        assert_eq!(tunables.hard_limit_scale, 200.0);
        assert!(tunables.set("hard_limit_scale", 9999.0).is_err());
        assert!(tunables.set("no_such_knob", 1.0).is_err());
    }

    #[test]
    fn toml_overrides_merge_with_defaults() {
        let tunables: Tunables = toml::from_str("base_time_scale = 60.0").unwrap();
        assert_eq!(tunables.base_time_scale, 60.0);
        assert_eq!(tunables.increment_scale, 85.0);
    }
}
