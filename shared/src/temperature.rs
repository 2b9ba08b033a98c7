//! Temperature presets and limit helpers

use crate::printer::{HeaterLimits, TemperatureLimits};

/// Recommended hotend/bed temperatures for a material
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperaturePreset {
    pub name: &'static str,
    pub hotend: f64,
    pub bed: f64,
    pub description: &'static str,
}

/// Hotend/bed target pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Temperature {
    pub hotend: f64,
    pub bed: f64,
}

pub const TEMPERATURE_PRESETS: &[TemperaturePreset] = &[
    TemperaturePreset {
        name: "PLA",
        hotend: 200.0,
        bed: 60.0,
        description: "Recommended temperatures for PLA",
    },
    TemperaturePreset {
        name: "PETG",
        hotend: 240.0,
        bed: 80.0,
        description: "Recommended temperatures for PETG",
    },
    TemperaturePreset {
        name: "TPU",
        hotend: 220.0,
        bed: 60.0,
        description: "Recommended temperatures for TPU",
    },
];

/// Look up a preset by material name (case-insensitive)
pub fn preset(name: &str) -> Option<&'static TemperaturePreset> {
    TEMPERATURE_PRESETS
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name))
}

/// Whether `temp` lies within the inclusive limits
pub fn is_temperature_in_range(temp: f64, limits: &HeaterLimits) -> bool {
    temp >= limits.min_temp && temp <= limits.max_temp
}

/// Clamp a preset into the printer's limits
pub fn adjusted_preset_temperature(
    preset: &TemperaturePreset,
    limits: &TemperatureLimits,
) -> Temperature {
    Temperature {
        hotend: clamp(preset.hotend, &limits.extruder),
        bed: clamp(preset.bed, &limits.heater_bed),
    }
}

/// One decimal place
pub fn format_temperature(temp: f64) -> String {
    format!("{temp:.1}")
}

/// Parse a temperature value from the printer config.
///
/// Takes the longest leading decimal number, exponent included, and ignores
/// whatever follows ("230.0 # max", "1.2.3"); `None` when there is no
/// number at all.
pub fn parse_config_temperature(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let end = numeric_prefix_len(trimmed.as_bytes());
    if end == 0 {
        return None;
    }
    trimmed[..end].parse().ok()
}

// Length of `[+-]?digits[.digits][(e|E)[+-]?digits]`, 0 without mantissa digits
fn numeric_prefix_len(bytes: &[u8]) -> usize {
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut i = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i = 1;
    }
    let int_end = digits_from(i);
    let mut mantissa_digits = int_end - i;
    i = int_end;
    if bytes.get(i) == Some(&b'.') {
        let frac_end = digits_from(i + 1);
        mantissa_digits += frac_end - (i + 1);
        i = frac_end;
    }
    if mantissa_digits == 0 {
        return 0;
    }

    if matches!(bytes.get(i), Some(b'e' | b'E')) {
        let mut j = i + 1;
        if matches!(bytes.get(j), Some(b'+' | b'-')) {
            j += 1;
        }
        let exp_end = digits_from(j);
        if exp_end > j {
            i = exp_end;
        }
    }
    i
}

fn clamp(value: f64, limits: &HeaterLimits) -> f64 {
    value.max(limits.min_temp).min(limits.max_temp)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> TemperatureLimits {
        TemperatureLimits {
            extruder: HeaterLimits {
                min_temp: 0.0,
                max_temp: 230.0,
            },
            heater_bed: HeaterLimits {
                min_temp: 0.0,
                max_temp: 100.0,
            },
        }
    }

    #[test]
    fn test_preset_lookup() {
        assert_eq!(preset("petg").map(|p| p.hotend), Some(240.0));
        assert!(preset("ABS").is_none());
    }

    #[test]
    fn test_adjusted_preset_clamps_to_limits() {
        let petg = preset("PETG").unwrap();
        let adjusted = adjusted_preset_temperature(petg, &limits());
        assert_eq!(adjusted, Temperature { hotend: 230.0, bed: 80.0 });
    }

    #[test]
    fn test_range_is_inclusive() {
        let l = limits();
        assert!(is_temperature_in_range(230.0, &l.extruder));
        assert!(!is_temperature_in_range(230.5, &l.extruder));
    }

    #[test]
    fn test_format_and_parse() {
        assert_eq!(format_temperature(199.96), "200.0");
        assert_eq!(parse_config_temperature("245"), Some(245.0));
        assert_eq!(parse_config_temperature(" -10.5 "), Some(-10.5));
        assert_eq!(parse_config_temperature("230.0 # max"), Some(230.0));
        assert_eq!(parse_config_temperature("abc"), None);
    }

    #[test]
    fn test_parse_takes_longest_numeric_prefix() {
        assert_eq!(parse_config_temperature("1e3"), Some(1000.0));
        assert_eq!(parse_config_temperature("2.5E-1C"), Some(0.25));
        assert_eq!(parse_config_temperature("1.2.3"), Some(1.2));
        assert_eq!(parse_config_temperature("7e"), Some(7.0));
        assert_eq!(parse_config_temperature(".5"), Some(0.5));
        assert_eq!(parse_config_temperature("-."), None);
        assert_eq!(parse_config_temperature(""), None);
    }
}
