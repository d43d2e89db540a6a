//! Keyword/value configuration files.
//!
//! One `Keyword Value` pair per line. `#` starts a comment and blank lines are skipped.

use std::{
    collections::HashSet,
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use tracing::debug;

use super::{adc::AdcMode, bandpass::BandpassShape, config::RadarConfig};
use crate::{
    antenna::BeamShape,
    error::{RadarError, RadarResult},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ValueKind {
    Float,
    Integer,
    Text,
}

const KEYWORDS: &[(&str, ValueKind)] = &[
    ("Frequency", ValueKind::Float),
    ("PeakPower", ValueKind::Float),
    ("PulseWidth", ValueKind::Float),
    ("AntRotationSpeed", ValueKind::Float),
    ("SamplingTime", ValueKind::Float),
    ("PRT", ValueKind::Float),
    ("MaxReceiveTime", ValueKind::Float),
    ("NoiseFigure", ValueKind::Float),
    ("DuplexSwitchTime", ValueKind::Float),
    ("AntennaeGain", ValueKind::Float),
    ("BandWidth", ValueKind::Float),
    ("AzBeamWidth", ValueKind::Float),
    ("ElBeamWidth", ValueKind::Float),
    ("Azimuth", ValueKind::Float),
    ("ADCResolution", ValueKind::Integer),
    ("ADCMode", ValueKind::Text),
    ("ADCMin2Noise", ValueKind::Float),
    ("ADCMax2Noise", ValueKind::Float),
    ("AzBeamShape", ValueKind::Text),
    ("ElBeamShape", ValueKind::Text),
    ("BandpassFilter", ValueKind::Text),
];

enum Value<'a> {
    Float(f64),
    Integer(u32),
    Text(&'a str),
}

fn parse_error(line: usize, message: String) -> RadarError {
    RadarError::Parse { line, message }
}

// Tokens up to the first one starting a comment
fn split_line(line: &str) -> Vec<&str> {
    line.split_whitespace()
        .take_while(|token| !token.starts_with('#'))
        .collect()
}

fn parse_value<'a>(line: usize, keyword: &str, raw: &'a str) -> RadarResult<Value<'a>> {
    let kind = KEYWORDS
        .iter()
        .find(|(name, _)| *name == keyword)
        .map(|(_, kind)| *kind)
        .ok_or_else(|| parse_error(line, format!("unknown keyword '{}'", keyword)))?;

    let bad_value = || parse_error(line, format!("failed to read value '{}' of keyword '{}'", raw, keyword));
    match kind {
        ValueKind::Float => raw.parse::<f64>().map(Value::Float).map_err(|_| bad_value()),
        ValueKind::Integer => {
            if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_digit()) {
                return Err(bad_value());
            }
            raw.parse::<u32>().map(Value::Integer).map_err(|_| bad_value())
        }
        ValueKind::Text => Ok(Value::Text(raw)),
    }
}

fn beam_shape(line: usize, name: &str) -> RadarResult<BeamShape> {
    match name {
        "Gaussian" => Ok(BeamShape::Gaussian),
        "Triangular" => Ok(BeamShape::Triangular),
        _ => Err(parse_error(line, format!("unrecognized beam shape '{}'", name))),
    }
}

fn apply(config: &mut RadarConfig, line: usize, keyword: &str, value: Value) -> RadarResult<()> {
    match (keyword, value) {
        ("Frequency", Value::Float(x)) => config.set_frequency(x),
        ("PeakPower", Value::Float(x)) => config.set_peak_power(x),
        ("PulseWidth", Value::Float(x)) => config.set_pulse_width(x),
        ("AntRotationSpeed", Value::Float(x)) => config.set_rotation_speed(x),
        ("SamplingTime", Value::Float(x)) => config.set_sampling_time(x),
        ("PRT", Value::Float(x)) => config.set_prt(x),
        ("MaxReceiveTime", Value::Float(x)) => config.set_max_receive_time(x),
        ("NoiseFigure", Value::Float(x)) => config.set_noise_figure(x),
        ("DuplexSwitchTime", Value::Float(x)) => config.set_switch_time(x),
        ("AntennaeGain", Value::Float(x)) => config.set_antenna_gain(x),
        ("BandWidth", Value::Float(x)) => config.set_bandwidth(x),
        ("AzBeamWidth", Value::Float(x)) => config.set_az_beamwidth(x),
        ("ElBeamWidth", Value::Float(x)) => config.set_el_beamwidth(x),
        ("Azimuth", Value::Float(x)) => config.set_azimuth(x),
        ("ADCMin2Noise", Value::Float(x)) => config.set_adc_min2noise(x),
        ("ADCMax2Noise", Value::Float(x)) => config.set_adc_max2noise(x),
        ("ADCResolution", Value::Integer(n)) => config.set_adc_resolution(n),
        ("ADCMode", Value::Text(name)) => config.set_adc_mode(match name {
            "Power" => AdcMode::Power,
            "Logarithm" => AdcMode::Logarithm,
            _ => return Err(parse_error(line, format!("unrecognized ADCMode '{}'", name))),
        }),
        ("AzBeamShape", Value::Text(name)) => config.set_hor_beam_shape(beam_shape(line, name)?),
        ("ElBeamShape", Value::Text(name)) => config.set_el_beam_shape(beam_shape(line, name)?),
        ("BandpassFilter", Value::Text(name)) => config.set_bandpass(match name {
            "Standard" => BandpassShape::Standard,
            "Rectangular" => BandpassShape::Rectangular,
            _ => return Err(parse_error(line, format!("unrecognized bandpass filter '{}'", name))),
        }),
        _ => return Err(parse_error(line, format!("keyword '{}' has the wrong value type", keyword))),
    }
    Ok(())
}

/// Reads a configuration from text. Missing values are only reported by
/// [`RadarConfig::validate`].
pub fn parse_reader(reader: impl BufRead) -> RadarResult<RadarConfig> {
    let mut config = RadarConfig::new();
    let mut seen = HashSet::new();

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line?;
        let tokens = split_line(&line);
        let keyword = match tokens.first() {
            Some(keyword) => *keyword,
            None => continue,
        };

        if seen.contains(keyword) {
            return Err(parse_error(
                line_no,
                format!("keyword '{}' given more than once", keyword),
            ));
        }
        if tokens.len() != 2 {
            return Err(parse_error(
                line_no,
                format!("keyword '{}' needs exactly one value, got {}", keyword, tokens.len() - 1),
            ));
        }

        let value = parse_value(line_no, keyword, tokens[1])?;
        apply(&mut config, line_no, keyword, value)?;
        seen.insert(keyword.to_owned());
    }

    debug!(keywords = seen.len(), "Parsed radar config");
    Ok(config)
}

pub fn parse_config(text: &str) -> RadarResult<RadarConfig> {
    parse_reader(text.as_bytes())
}

pub fn load_config(path: impl AsRef<Path>) -> RadarResult<RadarConfig> {
    let file = File::open(path.as_ref())?;
    debug!(path = %path.as_ref().display(), "Loading radar config");
    parse_reader(BufReader::new(file))
}
