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

use std::{fmt, time::Duration};
use chrono::{DateTime,SecondsFormat,Utc};
use serde::{Serialize,Deserialize,Serializer,Deserializer};
use parse_duration::parse;

/// wall clock time stamp in milliseconds since the unix epoch. This is what we use for all cache and
/// status time stamps since it serializes as a plain integer
#[derive(Serialize,Deserialize,Debug,Clone,Copy,PartialEq,Eq,PartialOrd,Ord,Hash)]
pub struct EpochMillis(i64);

impl EpochMillis {
    pub fn now ()->Self { EpochMillis( Utc::now().timestamp_millis()) }

    pub fn new (millis: i64)->Self { EpochMillis(millis) }

    pub fn millis (&self)->i64 { self.0 }

    /// milliseconds elapsed between `self` and a later `now`. Never negative
    pub fn age_at (&self, now: EpochMillis)->i64 { (now.0 - self.0).max(0) }

    pub fn plus (&self, dur: Duration)->EpochMillis { EpochMillis( self.0 + dur.as_millis() as i64) }

    pub fn minus (&self, dur: Duration)->EpochMillis { EpochMillis( self.0 - dur.as_millis() as i64) }

    pub fn to_rfc3339 (&self)->String {
        match DateTime::<Utc>::from_timestamp_millis( self.0) {
            Some(dt) => dt.to_rfc3339_opts( SecondsFormat::Secs, true),
            None => String::new()
        }
    }
}

impl fmt::Display for EpochMillis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_rfc3339())
    }
}

impl From<DateTime<Utc>> for EpochMillis {
    fn from (date: DateTime<Utc>)->Self { EpochMillis( date.timestamp_millis()) }
}

#[inline] pub fn millis (n: u64)->Duration { Duration::from_millis(n) }
#[inline] pub fn secs (n: u64)->Duration { Duration::from_secs(n) }

#[inline] pub fn duration_millis (dur: &Duration)->i64 { dur.as_millis() as i64 }

pub fn deserialize_duration <'a,D>(deserializer: D) -> Result<Duration,D::Error>
    where D: Deserializer<'a>
{
    String::deserialize(deserializer).and_then( |string| {
        parse(string.as_str())
            .map_err( |e| serde::de::Error::custom(format!("{:?}",e)))
    })
}

pub fn deserialize_optional_duration <'a,D>(deserializer: D) -> Result<Option<Duration>,D::Error>
    where D: Deserializer<'a>
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    if let Some(s) = s {
        let d = parse(s.as_str()).map_err( |e| serde::de::Error::custom(format!("{:?}",e)))?;
        return Ok( Some(d) )
    }
    Ok(None)
}

/// serialize an optional time stamp as RFC 3339 string (or null)
pub fn ser_optional_rfc3339<S: Serializer> (opt: &Option<EpochMillis>, s: S) -> Result<S::Ok, S::Error> {
    match opt {
        Some(t) => s.serialize_str( &t.to_rfc3339()),
        None => s.serialize_none()
    }
}

pub fn de_optional_rfc3339 <'a,D>(deserializer: D) -> Result<Option<EpochMillis>,D::Error> where D: Deserializer<'a> {
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) => {
            let dt = DateTime::parse_from_rfc3339( s.as_str()).map_err( |e| serde::de::Error::custom(e.to_string()))?;
            Ok( Some( EpochMillis::new( dt.timestamp_millis())))
        }
        None => Ok(None)
    }
}
