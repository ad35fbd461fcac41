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

use std::collections::HashMap;
use crate::record::AircraftRecord;

/// an entry is stale if its `seen_pos` is missing or exceeds the threshold (in seconds).
/// Thresholds <= 0 disable reaping altogether
#[inline]
pub fn is_stale (seen_pos: Option<f64>, threshold_secs: f64)->bool {
    if threshold_secs <= 0.0 { return false }
    match seen_pos {
        Some(seen) => seen > threshold_secs,
        None => true
    }
}

/// remove stale entries from a hex-keyed map, returning the number of removed entries
pub fn cleanup_stale_entries (by_hex: &mut HashMap<String,AircraftRecord>, threshold_secs: f64)->usize {
    let len = by_hex.len();
    by_hex.retain( |_,rec| !is_stale( rec.seen_pos, threshold_secs));
    len - by_hex.len()
}

/// same for an (ordered) record list
pub fn cleanup_stale_records (records: &mut Vec<AircraftRecord>, threshold_secs: f64)->usize {
    let len = records.len();
    records.retain( |rec| !is_stale( rec.seen_pos, threshold_secs));
    len - records.len()
}
