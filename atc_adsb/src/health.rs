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

use std::path::PathBuf;
use serde::{Serialize,Deserialize};
use atc_common::datetime::{EpochMillis, duration_millis, ser_optional_rfc3339, de_optional_rfc3339};

use crate::cache::{FeedCache, CenterStatus, is_aggregate_ok, is_expired};
use crate::config::FeedConfig;

pub const WARN_NO_AGGREGATE: &str = "Feed aggregate cache has not been created yet.";
pub const WARN_STALE_AGGREGATE: &str = "Feed aggregate is stale or not updating.";

#[derive(Serialize,Deserialize,Debug,Clone,PartialEq)]
pub struct CenterHealth {
    pub name: String,
    pub upstream_status: Option<u16>,
    #[serde(serialize_with="ser_optional_rfc3339", deserialize_with="de_optional_rfc3339")]
    pub center_last_ok_at: Option<EpochMillis>,
    #[serde(serialize_with="ser_optional_rfc3339", deserialize_with="de_optional_rfc3339")]
    pub center_last_attempt_at: Option<EpochMillis>,
    pub error: Option<String>,
}

impl From<&CenterStatus> for CenterHealth {
    fn from (s: &CenterStatus)->Self {
        CenterHealth {
            name: s.name.clone(),
            upstream_status: s.upstream_http,
            center_last_ok_at: s.center_last_ok_at,
            center_last_attempt_at: s.center_last_attempt_at,
            error: s.error.clone(),
        }
    }
}

#[derive(Serialize,Deserialize,Debug,Clone,PartialEq)]
pub struct FeedHealth {
    pub upstream: String,
    pub upstream_last_status_per_center: Vec<CenterHealth>,
    pub aggregate_ok: bool,
    pub aggregate_age_s: Option<i64>,
    pub aggregate_total: Option<usize>,
    pub latest_cache_time: Option<String>,
    pub cache_stale: bool,
    pub cache_ttl_ms: i64,
    pub cache_max_stale_ms: i64,
    pub cache_dir: Option<PathBuf>,
    pub cache_entries: usize,
}

#[derive(Serialize,Deserialize,Debug,Clone,PartialEq)]
pub struct HealthReport {
    pub ok: bool,
    pub time: String,
    pub feed: FeedHealth,
    pub warnings: Vec<String>,
}

/// assemble the health report from what is currently cached. This never touches upstream
pub async fn health_report (config: &FeedConfig, cache: &FeedCache, now: EpochMillis)->HealthReport {
    let aggregate = cache.read_aggregate().await;
    let mut warnings: Vec<String> = Vec::new();

    // keep the configured center order
    let upstream_last_status_per_center: Vec<CenterHealth> = config.feed_centers.iter()
        .filter_map( |c| cache.center_status( &c.name))
        .map( |s| CenterHealth::from( &s))
        .collect();

    let (aggregate_ok, aggregate_age_s, aggregate_total, latest_cache_time, cache_stale) = match &aggregate {
        Some(entry) => {
            let age = entry.age_ms( now);
            let aggregate_ok = is_aggregate_ok( entry, now, config.aggregate_ttl());
            let cache_stale = is_expired( age, config.feed_cache_max_stale);
            if !aggregate_ok {
                warnings.push( WARN_STALE_AGGREGATE.to_string());
            }
            (aggregate_ok, Some(age / 1000), Some(entry.payload.total), Some(entry.stored_ms.to_rfc3339()), cache_stale)
        }
        None => {
            warnings.push( WARN_NO_AGGREGATE.to_string());
            (false, None, None, None, true)
        }
    };

    let feed = FeedHealth {
        upstream: config.adsb_feed_url.clone(),
        upstream_last_status_per_center,
        aggregate_ok,
        aggregate_age_s,
        aggregate_total,
        latest_cache_time,
        cache_stale,
        cache_ttl_ms: duration_millis( &config.feed_center_cache_ttl),
        cache_max_stale_ms: duration_millis( &config.feed_cache_max_stale),
        cache_dir: cache.dir().map( |d| d.to_path_buf()),
        cache_entries: cache.entry_count().await,
    };

    HealthReport { ok: warnings.is_empty(), time: now.to_rfc3339(), feed, warnings }
}
