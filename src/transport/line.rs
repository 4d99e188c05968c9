//! Compact newline-framed telemetry line.
//!
//! One frame per line over the raw ingest socket:
//!
//! ```text
//! <ts>,<temp>,<hum>,<motion>,<gas>,<sound>,<ir>,<dist>\n
//! ```
//!
//! Floats carry two decimals, booleans are `0`/`1`. A line that does
//! not have exactly eight parseable fields is silently discarded by the
//! receiver; the stream framing stays intact either way.

use core::fmt::Write as _;

use heapless::String;

use crate::frame::SensorFrame;

/// Upper bound: 10-digit ts + two `-xx.xx` floats + 4 flags + distance
/// plus commas and the newline fits well inside this.
pub const MAX_LINE_LEN: usize = 64;

/// Render a frame as one wire line, newline included.
pub fn format_line(frame: &SensorFrame) -> String<MAX_LINE_LEN> {
    let mut out = String::new();
    // Infallible for any representable frame; MAX_LINE_LEN is sized for
    // the worst case.
    let _ = write!(
        out,
        "{},{:.2},{:.2},{},{},{},{},{}\n",
        frame.timestamp,
        frame.temperature_c,
        frame.humidity_pct,
        frame.motion as u8,
        frame.gas as u8,
        frame.sound as u8,
        frame.ir_object as u8,
        frame.distance_cm,
    );
    out
}

/// Parse one wire line back into a frame.
///
/// Returns `None` on any malformed input: wrong field count, a field
/// that fails to parse, or a flag outside `0`/`1`. Fields the line does
/// not carry (levels, error flags) come back at their defaults with
/// `is_valid` true.
pub fn parse_line(line: &str) -> Option<SensorFrame> {
    let line = line.trim_end_matches(['\r', '\n']);
    let mut fields = line.split(',');

    let timestamp = fields.next()?.parse().ok()?;
    let temperature_c = fields.next()?.parse().ok()?;
    let humidity_pct = fields.next()?.parse().ok()?;
    let motion = parse_flag(fields.next()?)?;
    let gas = parse_flag(fields.next()?)?;
    let sound = parse_flag(fields.next()?)?;
    let ir_object = parse_flag(fields.next()?)?;
    let distance_cm = fields.next()?.parse().ok()?;
    if fields.next().is_some() {
        return None; // more than eight fields
    }

    let mut frame = SensorFrame::quiet(timestamp);
    frame.temperature_c = temperature_c;
    frame.humidity_pct = humidity_pct;
    frame.motion = motion;
    frame.gas = gas;
    frame.sound = sound;
    frame.ir_object = ir_object;
    frame.distance_cm = distance_cm;
    Some(frame)
}

fn parse_flag(s: &str) -> Option<bool> {
    match s {
        "0" => Some(false),
        "1" => Some(true),
        _ => None,
    }
}
