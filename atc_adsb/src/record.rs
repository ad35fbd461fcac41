/*
 * Copyright © 2025, United States Government, as represented by the Administrator of
 * the National Aeronautics and Space Administration. All rights reserved.
 *
 * The “ODIN” software is licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License. You may obtain a copy
 * of the License at http://www.apache.org/licenses/LICENSE-2.0.
 *
 * Unless required by applicable law or agreed to in writing, software distributed under
 * the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND,
 * either express or implied. See the License for the specific language governing permissions
 * and limitations under the License.
 */

use std::fmt;
use serde::{Serialize,Deserialize,Deserializer};
use serde_json::Value;
use tracing::debug;
use atc_common::datetime::EpochMillis;

/// the position/recency view of an aircraft report that is used by the replace policy.
/// All accessors are optional since raw upstream reports can lack any of them
pub trait PositionReport {
    fn lat (&self)->Option<f64>;
    fn lon (&self)->Option<f64>;
    fn alt_ft (&self)->Option<i64>;
    fn seen_pos (&self)->Option<f64>;
}

/// an aircraft entry as we get it from the upstream provider (readsb/tar1090 style JSON).
/// Numeric fields are accepted as JSON numbers or numeric strings, anything else maps to `None`
#[derive(Deserialize,Serialize,Debug,Clone,Default,PartialEq)]
pub struct RawRecord {
    #[serde(default, deserialize_with="de_lenient_string")]
    pub hex: Option<String>,
    #[serde(default, deserialize_with="de_lenient_string")]
    pub flight: Option<String>,
    #[serde(default, deserialize_with="de_lenient_string")]
    pub r: Option<String>,
    #[serde(default, deserialize_with="de_lenient_string")]
    pub t: Option<String>,

    #[serde(default, deserialize_with="de_lenient_f64")]
    pub lat: Option<f64>,
    #[serde(default, deserialize_with="de_lenient_f64")]
    pub lon: Option<f64>,
    #[serde(default, deserialize_with="de_lenient_f64")]
    pub alt_baro: Option<f64>, // "ground" maps to None
    #[serde(default, deserialize_with="de_lenient_f64")]
    pub alt_geom: Option<f64>,
    #[serde(default, deserialize_with="de_lenient_f64")]
    pub gs: Option<f64>,
    #[serde(default, deserialize_with="de_lenient_f64")]
    pub track: Option<f64>,
    #[serde(default, deserialize_with="de_lenient_f64")]
    pub baro_rate: Option<f64>,
    #[serde(default, deserialize_with="de_lenient_f64")]
    pub geom_rate: Option<f64>,

    #[serde(default, deserialize_with="de_lenient_string")]
    pub squawk: Option<String>,
    #[serde(default, deserialize_with="de_lenient_string")]
    pub emergency: Option<String>,

    #[serde(default, deserialize_with="de_lenient_f64")]
    pub seen_pos: Option<f64>,
}

impl PositionReport for RawRecord {
    fn lat (&self)->Option<f64> { self.lat }
    fn lon (&self)->Option<f64> { self.lon }
    fn alt_ft (&self)->Option<i64> {
        self.alt_baro.filter( is_plausible_alt).or( self.alt_geom.filter( is_plausible_alt)).map( |a| a as i64)
    }
    fn seen_pos (&self)->Option<f64> { self.seen_pos }
}

/// altitudes outside this range (feet) are treated as transponder garbage and dropped
pub const MIN_ALT_FT: f64 = -2_000.0;
pub const MAX_ALT_FT: f64 = 100_000.0;

pub fn is_plausible_alt (alt: &f64)->bool { *alt >= MIN_ALT_FT && *alt <= MAX_ALT_FT }

fn value_as_f64 (v: &Value)->Option<f64> {
    let x = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None
    };
    x.filter( |x| x.is_finite())
}

fn de_lenient_f64 <'a,D>(deserializer: D) -> Result<Option<f64>,D::Error> where D: Deserializer<'a> {
    let v: Option<Value> = Option::deserialize(deserializer)?;
    Ok( v.as_ref().and_then( value_as_f64))
}

fn de_lenient_string <'a,D>(deserializer: D) -> Result<Option<String>,D::Error> where D: Deserializer<'a> {
    let v: Option<Value> = Option::deserialize(deserializer)?;
    Ok( match v {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None
    })
}

/// trimmed and uppercased, `None` if empty
fn upper_trimmed (s: &Option<String>)->Option<String> {
    s.as_ref().map( |s| s.trim().to_uppercase()).filter( |s| !s.is_empty())
}

fn emergency_state (s: &Option<String>)->Option<String> {
    s.as_ref().map( |s| s.trim().to_lowercase()).filter( |s| !s.is_empty() && s != "none")
}

/// the canonical dedup key for an ICAO24 address
pub fn normalize_hex (hex: &str)->String { hex.trim().to_uppercase() }

/// the reasons for which we drop records before they make it into an aggregate
#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum DiscardReason {
    NoHex,
    NoPosition,
    OutsideRadius,
    Malformed, // entry does not even parse as a record
}

impl fmt::Display for DiscardReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DiscardReason::NoHex => "no_hex",
            DiscardReason::NoPosition => "no_position",
            DiscardReason::OutsideRadius => "outside_radius",
            DiscardReason::Malformed => "malformed",
        };
        write!( f, "{s}")
    }
}

/// one observed aircraft state as we serve it to clients
#[derive(Serialize,Deserialize,Debug,Clone,PartialEq)]
pub struct AircraftRecord {
    pub hex: String,
    pub flight: Option<String>,
    pub reg: Option<String>,
    #[serde(rename="type")]
    pub ac_type: Option<String>,

    pub lat: f64,
    pub lon: f64,
    pub alt: Option<i64>, // feet
    pub gs: Option<i64>, // knots
    pub track: Option<i64>, // degrees
    pub baro_rate: Option<i64>, // ft/min
    pub geom_rate: Option<i64>,

    pub squawk: Option<String>,
    pub emergency: Option<String>,

    pub seen_pos: Option<f64>,

    #[serde(default)]
    pub last_seen_ms: Option<i64>,
    #[serde(default)]
    pub distance_nm: Option<f64>,
    #[serde(default)]
    pub stale: bool,
}

impl AircraftRecord {

    /// normalize a raw upstream record. Records without hex or without a numeric position are dropped
    /// and reported with a `filter_discard` debug log entry
    pub fn from_raw (raw: &RawRecord)->Option<AircraftRecord> {
        let hex = match raw.hex.as_deref().map( normalize_hex) {
            Some(hex) if !hex.is_empty() => hex,
            _ => {
                log_filter_discard( DiscardReason::NoHex, raw);
                return None
            }
        };

        let (lat,lon) = match (raw.lat, raw.lon) {
            (Some(lat), Some(lon)) => (lat,lon),
            _ => {
                log_filter_discard( DiscardReason::NoPosition, raw);
                return None
            }
        };

        Some( AircraftRecord {
            hex,
            flight: upper_trimmed( &raw.flight),
            reg: upper_trimmed( &raw.r),
            ac_type: upper_trimmed( &raw.t),
            lat,
            lon,
            alt: raw.alt_ft(),
            gs: raw.gs.map( |v| v.round() as i64),
            track: raw.track.map( |v| v.round() as i64),
            baro_rate: raw.baro_rate.map( |v| v as i64),
            geom_rate: raw.geom_rate.map( |v| v as i64),
            squawk: upper_trimmed( &raw.squawk),
            emergency: emergency_state( &raw.emergency),
            seen_pos: raw.seen_pos,
            last_seen_ms: None,
            distance_nm: None,
            stale: false,
        })
    }

    /// absolute time of the last position update, derived from `seen_pos`
    pub fn compute_last_seen (&self, now: EpochMillis)->EpochMillis {
        match self.seen_pos {
            Some(seen) if seen > 0.0 => EpochMillis::new( now.millis() - (seen * 1000.0).round() as i64),
            _ => now
        }
    }
}

impl PositionReport for AircraftRecord {
    fn lat (&self)->Option<f64> { Some(self.lat) }
    fn lon (&self)->Option<f64> { Some(self.lon) }
    fn alt_ft (&self)->Option<i64> { self.alt }
    fn seen_pos (&self)->Option<f64> { self.seen_pos }
}

/// parse raw upstream records, dropping the ones we can't track
pub fn parse_records (raw: &[RawRecord])->Vec<AircraftRecord> {
    raw.iter().filter_map( AircraftRecord::from_raw).collect()
}

fn opt_display<T: fmt::Display> (v: Option<T>)->String {
    v.map( |v| v.to_string()).unwrap_or( "UNKNOWN".to_string())
}

/// the single line format we use to report dropped records
pub fn filter_discard_line (reason: DiscardReason, hex: Option<&str>, flight: Option<&str>, lat: Option<f64>, lon: Option<f64>, alt: Option<i64>, seen_pos: Option<f64>)->String {
    format!("filter_discard reason={} hex={} flight={} lat={} lon={} alt={} seen_pos={}",
        reason,
        hex.map( |s| s.trim()).filter( |s| !s.is_empty()).unwrap_or("UNKNOWN"),
        flight.map( |s| s.trim()).filter( |s| !s.is_empty()).unwrap_or("UNKNOWN"),
        opt_display( lat.map( |v| format!("{v:.6}"))),
        opt_display( lon.map( |v| format!("{v:.6}"))),
        opt_display( alt),
        opt_display( seen_pos)
    )
}

pub fn log_filter_discard (reason: DiscardReason, report: &RawRecord) {
    debug!("{}", filter_discard_line( reason, report.hex.as_deref(), report.flight.as_deref(), report.lat, report.lon, report.alt_ft(), report.seen_pos));
}

pub fn log_record_discard (reason: DiscardReason, rec: &AircraftRecord) {
    debug!("{}", filter_discard_line( reason, Some(rec.hex.as_str()), rec.flight.as_deref(), Some(rec.lat), Some(rec.lon), rec.alt, rec.seen_pos));
}

pub fn log_malformed_discard (hex: Option<&str>) {
    debug!("{}", filter_discard_line( DiscardReason::Malformed, hex, None, None, None, None, None));
}
