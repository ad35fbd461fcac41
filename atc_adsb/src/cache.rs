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

//! the in-memory feed cache with optional file persistence.
//!
//! The cache holds the last aggregate, the last payload of each center and the last upstream status of
//! each center. It is only written by the [crate::aggregator::FeedAggregator]. Readers (services) get
//! `Arc` snapshots of the aggregate and hence never see partially updated data.
//!
//! If a cache dir is configured all entries are also written (atomically) to JSON files so that a
//! restarted server can serve last known data before the first upstream request completes

use std::{path::{Path,PathBuf}, sync::Arc, time::Duration};
use dashmap::DashMap;
use serde::{Serialize,Deserialize};
use tokio::sync::RwLock;
use tracing::{debug,warn};
use atc_common::{
    datetime::{EpochMillis, duration_millis, ser_optional_rfc3339, de_optional_rfc3339},
    fs::{ensure_writable_dir, write_json_atomic, read_json_if_exists, file_slug, count_files_with_extension}
};

use crate::errors::Result;
use crate::record::AircraftRecord;

pub const AGGREGATE_FILE: &str = "feed_aggregate.json";
pub const STATUS_FILE: &str = "feed_status.json";
pub const RR_STATE_FILE: &str = "feed_rr_state.json";
pub const CENTER_FILE_PREFIX: &str = "feed_center_";

/// a cached payload plus the time it was stored
#[derive(Serialize,Deserialize,Debug,Clone,PartialEq)]
pub struct CacheEntry<T> {
    pub stored_ms: EpochMillis,
    pub center: Option<String>,
    pub payload: T,
}

impl<T> CacheEntry<T> {
    pub fn new (payload: T, stored_ms: EpochMillis, center: Option<String>)->Self {
        CacheEntry { stored_ms, center, payload }
    }

    pub fn age_ms (&self, now: EpochMillis)->i64 { self.stored_ms.age_at( now) }
}

/// what we keep per center
#[derive(Serialize,Deserialize,Debug,Clone,Default,PartialEq)]
pub struct CenterPayload {
    pub ac: Vec<AircraftRecord>,
    pub upstream_http: Option<u16>,
}

/// the last known upstream state of a center plus the flags of the last aggregation cycle
#[derive(Serialize,Deserialize,Debug,Clone,Default,PartialEq)]
pub struct CenterStatus {
    pub name: String,
    pub upstream_http: Option<u16>,
    pub error: Option<String>,

    #[serde(default, serialize_with="ser_optional_rfc3339", deserialize_with="de_optional_rfc3339")]
    pub center_last_ok_at: Option<EpochMillis>,
    #[serde(default, serialize_with="ser_optional_rfc3339", deserialize_with="de_optional_rfc3339")]
    pub center_last_attempt_at: Option<EpochMillis>,
    #[serde(default)]
    pub backoff_until_ms: Option<i64>,

    // per cycle
    #[serde(default)]
    pub cache_age_ms: Option<i64>,
    #[serde(default)]
    pub cache_hit: bool,
    #[serde(default)]
    pub used_stale: bool,
    #[serde(default)]
    pub updated: bool,
}

impl CenterStatus {
    pub fn new (name: impl ToString)->Self {
        CenterStatus { name: name.to_string(), ..Default::default() }
    }

    /// clear the per-cycle flags, keeping the persistent upstream state
    pub fn reset_cycle (&mut self) {
        self.cache_age_ms = None;
        self.cache_hit = false;
        self.used_stale = false;
        self.updated = false;
    }

    pub fn is_backoff_active (&self, now: EpochMillis)->bool {
        self.backoff_until_ms.map( |until| now.millis() < until).unwrap_or(false)
    }
}

/// the merged, deduplicated result of one aggregation cycle
#[derive(Serialize,Deserialize,Debug,Clone,PartialEq)]
pub struct AggregateResult {
    pub ok: bool,
    pub ac: Vec<AircraftRecord>,
    pub total: usize,
    pub generated_at_ms: EpochMillis,
    /// store time of the newest center payload that went into this aggregate
    pub data_ms: Option<EpochMillis>,
    pub upstream_http: Option<u16>,
    pub cache_stale: bool,
    /// true if no center was refreshed in this cycle
    pub cache_hit: bool,
    /// some centers could not contribute or only contributed stale data
    pub degraded: bool,
    pub error: Option<String>,
    pub centers: Vec<CenterStatus>,
}

impl AggregateResult {
    /// age of the data this aggregate is based on (falls back to the aggregate age)
    pub fn data_age_ms (&self, now: EpochMillis)->i64 {
        self.data_ms.unwrap_or( self.generated_at_ms).age_at( now)
    }
}

//--- freshness policy

/// a zero ttl means we never consider cached data fresh
#[inline]
pub fn is_fresh (age_ms: i64, ttl: Duration)->bool {
    !ttl.is_zero() && age_ms <= duration_millis( &ttl)
}

/// beyond the max-stale window cached data must not be served as current
#[inline]
pub fn is_expired (age_ms: i64, max_stale: Duration)->bool {
    age_ms > duration_millis( &max_stale)
}

#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum Freshness {
    Fresh,
    Stale,  // older than ttl but still within the max-stale window
    Expired
}

pub fn classify (age_ms: i64, ttl: Duration, max_stale: Duration)->Freshness {
    if is_fresh( age_ms, ttl) {
        Freshness::Fresh
    } else if !is_expired( age_ms, max_stale) {
        Freshness::Stale
    } else {
        Freshness::Expired
    }
}

/// an aggregate is OK if it has aircraft and is not older than the aggregate ttl
pub fn is_aggregate_ok (entry: &CacheEntry<AggregateResult>, now: EpochMillis, aggregate_ttl: Duration)->bool {
    entry.payload.total > 0 && entry.age_ms( now) <= duration_millis( &aggregate_ttl)
}

#[derive(Serialize,Deserialize,Debug,Clone,Default)]
struct RoundRobinState {
    next_index: usize,
}

pub struct FeedCache {
    dir: Option<PathBuf>,
    aggregate: RwLock<Option<Arc<CacheEntry<AggregateResult>>>>,
    centers: DashMap<String,CacheEntry<CenterPayload>>,
    status: DashMap<String,CenterStatus>,
}

impl FeedCache {

    /// a cache that is not backed by files
    pub fn in_memory ()->Self {
        FeedCache { dir: None, aggregate: RwLock::new(None), centers: DashMap::new(), status: DashMap::new() }
    }

    pub fn new (dir: Option<PathBuf>)->Result<Self> {
        if let Some(dir) = &dir {
            ensure_writable_dir( dir)?;
        }
        Ok( FeedCache { dir, aggregate: RwLock::new(None), centers: DashMap::new(), status: DashMap::new() } )
    }

    pub fn dir (&self)->Option<&Path> { self.dir.as_deref() }

    fn center_path (dir: &Path, name: &str)->PathBuf {
        dir.join( format!("{}{}.json", CENTER_FILE_PREFIX, file_slug(name)))
    }

    //--- aggregate

    pub async fn read_aggregate (&self)->Option<Arc<CacheEntry<AggregateResult>>> {
        self.aggregate.read().await.clone()
    }

    /// replace the current aggregate. The in-memory entry is always replaced before we try to persist it
    pub async fn write_aggregate (&self, entry: Arc<CacheEntry<AggregateResult>>)->Result<()> {
        {
            let mut agg = self.aggregate.write().await;
            *agg = Some( entry.clone());
        }

        if let Some(dir) = &self.dir {
            write_json_atomic( dir.join(AGGREGATE_FILE), entry.as_ref())?;
        }
        Ok(())
    }

    //--- centers

    pub fn read_center (&self, name: &str)->Option<(CacheEntry<CenterPayload>, Option<CenterStatus>)> {
        let entry = self.centers.get( name).map( |e| e.value().clone())?;
        let status = self.center_status( name);
        Some( (entry, status) )
    }

    pub fn write_center (&self, name: &str, payload: CenterPayload, now: EpochMillis)->Result<()> {
        let entry = CacheEntry::new( payload, now, Some(name.to_string()));
        if let Some(dir) = &self.dir {
            self.centers.insert( name.to_string(), entry.clone());
            write_json_atomic( Self::center_path( dir, name), &entry)?;
        } else {
            self.centers.insert( name.to_string(), entry);
        }
        Ok(())
    }

    pub fn center_status (&self, name: &str)->Option<CenterStatus> {
        self.status.get( name).map( |s| s.value().clone())
    }

    pub fn center_statuses (&self)->Vec<CenterStatus> {
        self.status.iter().map( |s| s.value().clone()).collect()
    }

    /// update the status of a center. The status file is rewritten on every update
    pub fn update_center_status (&self, status: CenterStatus)->Result<()> {
        self.status.insert( status.name.clone(), status);
        if let Some(dir) = &self.dir {
            let mut list = self.center_statuses();
            list.sort_by( |a,b| a.name.cmp( &b.name));
            write_json_atomic( dir.join(STATUS_FILE), &list)?;
        }
        Ok(())
    }

    //--- round robin cursor

    pub fn read_rr_cursor (&self)->usize {
        if let Some(dir) = &self.dir {
            match read_json_if_exists::<RoundRobinState>( dir.join(RR_STATE_FILE)) {
                Ok(Some(state)) => return state.next_index,
                Ok(None) => {}
                Err(e) => warn!("ignoring corrupted round robin state: {e}")
            }
        }
        0
    }

    pub fn write_rr_cursor (&self, next_index: usize)->Result<()> {
        if let Some(dir) = &self.dir {
            write_json_atomic( dir.join(RR_STATE_FILE), &RoundRobinState{ next_index })?;
        }
        Ok(())
    }

    //--- warm start

    /// load persisted entries for the given center names. Corrupted files are logged and skipped.
    /// Returns the number of loaded entries
    pub async fn load (&self, center_names: &[String])->usize {
        let dir = match &self.dir {
            Some(dir) => dir.clone(),
            None => return 0
        };
        let mut n = 0;

        match read_json_if_exists::<CacheEntry<AggregateResult>>( dir.join(AGGREGATE_FILE)) {
            Ok(Some(entry)) => {
                *self.aggregate.write().await = Some( Arc::new(entry));
                n += 1;
            }
            Ok(None) => {}
            Err(e) => warn!("ignoring corrupted aggregate cache: {e}")
        }

        match read_json_if_exists::<Vec<CenterStatus>>( dir.join(STATUS_FILE)) {
            Ok(Some(list)) => {
                for mut status in list {
                    status.reset_cycle();
                    self.status.insert( status.name.clone(), status);
                }
            }
            Ok(None) => {}
            Err(e) => warn!("ignoring corrupted status cache: {e}")
        }

        for name in center_names {
            match read_json_if_exists::<CacheEntry<CenterPayload>>( Self::center_path( &dir, name)) {
                Ok(Some(entry)) => {
                    self.centers.insert( name.clone(), entry);
                    n += 1;
                }
                Ok(None) => {}
                Err(e) => warn!("ignoring corrupted cache for center {name}: {e}")
            }
        }

        debug!("loaded {} cache entries from {:?}", n, dir);
        n
    }

    /// number of cache entries (files if persisted, in-memory entries otherwise)
    pub async fn entry_count (&self)->usize {
        match &self.dir {
            Some(dir) => count_files_with_extension( dir, "json"),
            None => self.centers.len() + if self.aggregate.read().await.is_some() { 1 } else { 0 }
        }
    }
}
