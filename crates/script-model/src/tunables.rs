//! Post-processing tunables.
//!
//! These control how the raw distance series is reshaped into the exported
//! timeline. Every field is configuration, not code: values are range-checked
//! at load time and carried through the run context unchanged.

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Parameters for the signal post-processor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptTunables {
    /// Amplify frame-to-frame deltas to compensate for detector damping.
    pub boost_enabled: bool,

    /// Percentage added to positive deltas, in `[0, 20]`.
    pub boost_up_percent: u32,

    /// Percentage added to negative deltas, in `[0, 20]`.
    pub boost_down_percent: u32,

    /// Remap the dynamic range so near-extremes saturate to 0/100.
    pub threshold_enabled: bool,

    /// Values at or below this map to 0, in `[0, 15]`.
    pub threshold_low: i32,

    /// Values at or above this map to 100, in `[80, 100]`.
    pub threshold_high: i32,

    /// Reduce point count with effective-area simplification.
    pub simplification_enabled: bool,

    /// Simplification tolerance, in `[2.0, 10.0]`; higher removes more points.
    pub simplification_factor: f64,

    /// Quantize surviving positions to this multiple: 5 or 10.
    pub rounding_unit: i32,
}

impl Default for ScriptTunables {
    fn default() -> Self {
        Self {
            boost_enabled: true,
            boost_up_percent: 10,
            boost_down_percent: 15,
            threshold_enabled: true,
            threshold_low: 10,
            threshold_high: 90,
            simplification_enabled: true,
            simplification_factor: 8.0,
            rounding_unit: 5,
        }
    }
}

impl ScriptTunables {
    /// Check every field against its allowed range.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.boost_up_percent > 20 {
            return Err(ModelError::invalid(format!(
                "boost_up_percent {} outside [0, 20]",
                self.boost_up_percent
            )));
        }
        if self.boost_down_percent > 20 {
            return Err(ModelError::invalid(format!(
                "boost_down_percent {} outside [0, 20]",
                self.boost_down_percent
            )));
        }
        if !(0..=15).contains(&self.threshold_low) {
            return Err(ModelError::invalid(format!(
                "threshold_low {} outside [0, 15]",
                self.threshold_low
            )));
        }
        if !(80..=100).contains(&self.threshold_high) {
            return Err(ModelError::invalid(format!(
                "threshold_high {} outside [80, 100]",
                self.threshold_high
            )));
        }
        if !(2.0..=10.0).contains(&self.simplification_factor) {
            return Err(ModelError::invalid(format!(
                "simplification_factor {} outside [2.0, 10.0]",
                self.simplification_factor
            )));
        }
        if self.rounding_unit != 5 && self.rounding_unit != 10 {
            return Err(ModelError::invalid(format!(
                "rounding_unit {} must be 5 or 10",
                self.rounding_unit
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        ScriptTunables::default().validate().unwrap();
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        let mut t = ScriptTunables::default();
        t.boost_up_percent = 21;
        assert!(t.validate().is_err());

        let mut t = ScriptTunables::default();
        t.threshold_high = 79;
        assert!(t.validate().is_err());

        let mut t = ScriptTunables::default();
        t.simplification_factor = 1.0;
        assert!(t.validate().is_err());

        let mut t = ScriptTunables::default();
        t.rounding_unit = 7;
        assert!(t.validate().is_err());
    }
}
