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

use serde::{Serialize,Deserialize};
use geo::{Distance, Point};
use geo::algorithm::line_measures::metric_spaces::Haversine;

pub const METERS_PER_NM: f64 = 1852.0;

/// a plain lat/lon position in degrees. Accepts both `lat`/`lon` and `latitude`/`longitude` field names
#[derive(Serialize,Deserialize,Debug,Clone,Copy,PartialEq)]
pub struct LatLon {
    #[serde(alias="latitude")]
    pub lat: f64,
    #[serde(alias="longitude")]
    pub lon: f64,
}

impl LatLon {
    pub fn new (lat: f64, lon: f64)->Self { LatLon{lat,lon} }

    pub fn point (&self)->Point { Point::new( self.lon, self.lat) }

    pub fn distance_nm (&self, other: &LatLon)->f64 {
        Haversine.distance( self.point(), other.point()) / METERS_PER_NM
    }
}

/// great circle distance in nautical miles on a spherical (mean radius) earth
pub fn haversine_distance_nm (lat1: f64, lon1: f64, lat2: f64, lon2: f64)->f64 {
    LatLon::new( lat1, lon1).distance_nm( &LatLon::new( lat2, lon2))
}
