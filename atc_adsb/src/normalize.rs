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

//! pure functions that decide if an incoming aircraft report supersedes the one we already have.
//! Upstream can report the same aircraft several times per poll (e.g. from overlapping centers) with
//! noise level differences. We only switch to the fresher report if it is materially different

use atc_common::round_to;
use crate::config::FeedConfig;
use crate::record::PositionReport;

pub const DEFAULT_COORD_DECIMALS: u32 = 3;
pub const DEFAULT_ALT_THRESHOLD_FT: i64 = 100;

/// round a coordinate for equality comparison
#[inline]
pub fn normalize_coordinate (value: f64, decimals: u32)->f64 {
    round_to( value, decimals)
}

/// missing or non-numeric `seen_pos` counts as infinitely old
#[inline]
pub fn seen_pos_value<R: PositionReport> (r: &R)->f64 {
    r.seen_pos().unwrap_or( f64::INFINITY)
}

/// true if rounded lat or lon differ, or if the altitude changed by at least `alt_threshold_ft`.
/// Fields that are missing on either side never count as change
pub fn has_significant_geo_change<E,I> (existing: &E, incoming: &I, alt_threshold_ft: i64, coord_decimals: u32)->bool
    where E: PositionReport, I: PositionReport
{
    let coord_changed = |a: Option<f64>, b: Option<f64>| {
        match (a,b) {
            (Some(a), Some(b)) => normalize_coordinate( a, coord_decimals) != normalize_coordinate( b, coord_decimals),
            _ => false
        }
    };

    if coord_changed( existing.lat(), incoming.lat()) { return true }
    if coord_changed( existing.lon(), incoming.lon()) { return true }

    match (existing.alt_ft(), incoming.alt_ft()) {
        (Some(a), Some(b)) => a.abs_diff(b) >= alt_threshold_ft.max(0) as u64,
        _ => false
    }
}

/// an incoming report only replaces the existing one if it is strictly fresher *and* significantly different
pub fn should_replace_entry<E,I> (existing: &E, incoming: &I, alt_threshold_ft: i64, coord_decimals: u32)->bool
    where E: PositionReport, I: PositionReport
{
    if seen_pos_value(incoming) >= seen_pos_value(existing) {
        false
    } else {
        has_significant_geo_change( existing, incoming, alt_threshold_ft, coord_decimals)
    }
}

/// the tagged result of the dedup fold step
#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum ReplaceDecision {
    Keep,
    Replace
}

/// thresholds of the replace policy, usually taken from the [FeedConfig]
#[derive(Debug,Clone,Copy,PartialEq)]
pub struct ReplacePolicy {
    pub alt_threshold_ft: i64,
    pub coord_decimals: u32,
}

impl Default for ReplacePolicy {
    fn default()->Self {
        ReplacePolicy { alt_threshold_ft: DEFAULT_ALT_THRESHOLD_FT, coord_decimals: DEFAULT_COORD_DECIMALS }
    }
}

impl ReplacePolicy {
    pub fn new (alt_threshold_ft: i64, coord_decimals: u32)->Self { ReplacePolicy { alt_threshold_ft, coord_decimals } }

    pub fn from_config (config: &FeedConfig)->Self {
        ReplacePolicy::new( config.altitude_change_threshold_ft, config.coordinate_round_decimals)
    }

    pub fn decide<E,I> (&self, existing: &E, incoming: &I)->ReplaceDecision where E: PositionReport, I: PositionReport {
        if should_replace_entry( existing, incoming, self.alt_threshold_ft, self.coord_decimals) {
            ReplaceDecision::Replace
        } else {
            ReplaceDecision::Keep
        }
    }
}
