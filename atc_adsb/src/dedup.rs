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
use crate::normalize::{ReplaceDecision, ReplacePolicy};
use crate::record::{AircraftRecord, RawRecord, normalize_hex, parse_records};

/// collapse records to one per hex. The first record of each hex seeds its slot, later records
/// only replace it if the policy says so. Output order is the order in which hex codes were first seen
pub fn dedupe<I> (records: I, policy: &ReplacePolicy)->Vec<AircraftRecord> where I: IntoIterator<Item=AircraftRecord> {
    let mut slots: Vec<AircraftRecord> = Vec::new();
    let mut index: HashMap<String,usize> = HashMap::new();

    for mut rec in records {
        let hex = normalize_hex( &rec.hex);
        if hex.is_empty() { continue }

        if let Some(&idx) = index.get( &hex) {
            if policy.decide( &slots[idx], &rec) == ReplaceDecision::Replace {
                rec.hex = hex;
                slots[idx] = rec;
            }
        } else {
            rec.hex = hex.clone();
            index.insert( hex, slots.len());
            slots.push( rec);
        }
    }

    slots
}

/// parse and dedupe a raw upstream batch
pub fn dedupe_raw (raw: &[RawRecord], policy: &ReplacePolicy)->Vec<AircraftRecord> {
    dedupe( parse_records( raw), policy)
}
