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

use std::{collections::HashSet, time::Duration};
use dashmap::DashMap;
use atc_common::datetime::{EpochMillis, duration_millis};
use crate::record::AircraftRecord;

/// the retained aircraft set. Aircraft that drop out of the upstream results are kept (and flagged as
/// `stale`) until their `last_seen_ms` is older than the retention window
pub struct AircraftStore {
    aircraft: DashMap<String,AircraftRecord>,
    dropped_list: Vec<String>, // hex codes removed in the last merge
}

impl AircraftStore {
    pub fn new ()->Self {
        AircraftStore { aircraft: DashMap::new(), dropped_list: Vec::new() }
    }

    pub fn len (&self)->usize { self.aircraft.len() }

    pub fn is_empty (&self)->bool { self.aircraft.is_empty() }

    pub fn get (&self, hex: &str)->Option<AircraftRecord> { self.aircraft.get( hex).map( |e| e.value().clone()) }

    pub fn dropped_list (&self)->&[String] { self.dropped_list.as_slice() }

    /// upsert the records of the current cycle and return them (in their given order) followed by the
    /// retained records that were not reported in this cycle
    pub fn merge (&mut self, current: Vec<AircraftRecord>, now: EpochMillis, drop_after: Duration)->Vec<AircraftRecord> {
        let mut reported: HashSet<String> = HashSet::with_capacity( current.len());
        let mut list: Vec<AircraftRecord> = Vec::with_capacity( current.len());

        for mut rec in current {
            rec.last_seen_ms = Some( rec.compute_last_seen( now).millis());
            rec.stale = false;
            reported.insert( rec.hex.clone());
            self.aircraft.insert( rec.hex.clone(), rec.clone());
            list.push( rec);
        }

        self.remove_stale( now, drop_after);

        let mut retained: Vec<AircraftRecord> = self.aircraft.iter()
            .filter( |e| !reported.contains( e.key()))
            .map( |e| {
                let mut rec = e.value().clone();
                rec.stale = true;
                rec
            })
            .collect();
        retained.sort_by( |a,b| a.hex.cmp( &b.hex));
        list.extend( retained);

        list
    }

    /// remove aircraft that have not been seen within `drop_after`, returning the number of removed entries
    pub fn remove_stale (&mut self, now: EpochMillis, drop_after: Duration)->usize {
        let max_age = duration_millis( &drop_after);

        self.dropped_list.clear();
        for e in self.aircraft.iter() {
            let last_seen = e.value().last_seen_ms.unwrap_or(0);
            if now.millis() - last_seen > max_age {
                self.dropped_list.push( e.key().clone());
            }
        }

        for hex in &self.dropped_list {
            self.aircraft.remove( hex);
        }
        self.dropped_list.len()
    }
}

impl Default for AircraftStore {
    fn default()->Self { Self::new() }
}
