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

//! the multi-center aggregation cycle.
//!
//! Each cycle selects the centers to query (all of them, or the next round-robin slice), refreshes the
//! selected ones through the [UpstreamConnector] and serves the others from their per-center cache. The
//! union of all usable center payloads is deduplicated, reaped, radius filtered and merged with the
//! retained [AircraftStore] before it is written as the new aggregate.
//!
//! Cycles are serialized by a single async mutex. This makes every upstream call single-flight: concurrent
//! callers wait for the running cycle and then find a fresh aggregate in the cache

use std::{cmp::Ordering, sync::Arc};
use tokio::{sync::Mutex, time::{Instant,timeout}};
use tracing::{debug,info,warn};
use atc_common::{datetime::EpochMillis, geo::LatLon, round_to, some_or_return};

use crate::cache::{AggregateResult, CacheEntry, CenterPayload, CenterStatus, FeedCache, Freshness, classify, is_expired, is_fresh};
use crate::config::{CenterConfig, FeedConfig};
use crate::dedup::dedupe;
use crate::errors::{Result, UpstreamError};
use crate::normalize::ReplacePolicy;
use crate::reaper::cleanup_stale_records;
use crate::record::{AircraftRecord, DiscardReason, log_record_discard, parse_records};
use crate::store::AircraftStore;
use crate::upstream::{FetchOutcome, RequestSpacer, UpstreamConnector};

pub const NO_FEED_DATA: &str = "No feed data available";
pub const BACKOFF_ACTIVE: &str = "backoff_active";
pub const RATE_LIMITED: &str = "rate_limited";
pub const DEADLINE_EXCEEDED: &str = "deadline_exceeded";

/// select the center indices to refresh in this cycle, returning them together with the next cursor
pub fn select_centers (total: usize, per_cycle: usize, cursor: usize, round_robin: bool)->(Vec<usize>,usize) {
    if total == 0 { return (Vec::new(), 0) }

    if round_robin {
        let n = per_cycle.clamp( 1, total);
        let start = cursor % total;
        let selected = (0..n).map( |i| (start + i) % total).collect();
        (selected, (start + n) % total)
    } else {
        ((0..total).collect(), cursor % total)
    }
}

struct CycleState {
    cursor: usize,
    store: AircraftStore,
}

/// what a center contributes to a cycle
struct CenterContribution {
    status: CenterStatus,
    entry: Option<CacheEntry<CenterPayload>>,
    failed: bool,
}

pub struct FeedAggregator<C: UpstreamConnector> {
    config: Arc<FeedConfig>,
    connector: Arc<C>,
    cache: Arc<FeedCache>,
    spacer: RequestSpacer,
    policy: ReplacePolicy,
    cycle: Mutex<CycleState>,
}

impl<C> FeedAggregator<C> where C: UpstreamConnector {

    pub fn new (config: Arc<FeedConfig>, connector: Arc<C>, cache: Arc<FeedCache>)->Self {
        let n_centers = config.feed_centers.len().max(1);
        let cursor = cache.read_rr_cursor() % n_centers;
        let spacer = RequestSpacer::new( config.center_request_spacing());
        let policy = ReplacePolicy::from_config( &config);

        FeedAggregator {
            config, connector, cache, spacer, policy,
            cycle: Mutex::new( CycleState { cursor, store: AircraftStore::new() }),
        }
    }

    pub fn config (&self)->&Arc<FeedConfig> { &self.config }

    pub fn cache (&self)->&Arc<FeedCache> { &self.cache }

    pub async fn rr_cursor (&self)->usize { self.cycle.lock().await.cursor }

    /// run an aggregation cycle unless the cached aggregate is still fresh. Only upstream independent
    /// errors are returned, failing centers are reported in the aggregate
    pub async fn refresh (&self, now: EpochMillis)->Result<Arc<CacheEntry<AggregateResult>>> {
        let mut state = self.cycle.lock().await;

        if let Some(agg) = self.cache.read_aggregate().await {
            if is_fresh( agg.age_ms( now), self.config.feed_aggregate_cache_ttl) {
                debug!("aggregate cache hit (age {} ms)", agg.age_ms( now));
                return Ok(agg)
            }
        }

        let centers = &self.config.feed_centers;
        let (selected, next_cursor) = select_centers( centers.len(), self.config.centers_per_cycle(), state.cursor, self.config.feed_round_robin_enabled);
        state.cursor = next_cursor;
        if let Err(e) = self.cache.write_rr_cursor( next_cursor) {
            warn!("failed to persist round robin state: {e}");
        }

        let started = Instant::now();
        let deadline = started + self.config.feed_cycle_deadline;
        let mut contributions: Vec<CenterContribution> = Vec::with_capacity( centers.len());

        for (idx,center) in centers.iter().enumerate() {
            let contribution = self.process_center( center, selected.contains( &idx), now, started, deadline).await;
            if let Err(e) = self.cache.update_center_status( contribution.status.clone()) {
                warn!("failed to persist status of center {}: {e}", center.name);
            }
            contributions.push( contribution);
        }

        let result = self.build_aggregate( &mut state.store, &contributions, now);
        let entry = Arc::new( CacheEntry::new( result, now, None));

        if let Err(e) = self.cache.write_aggregate( entry.clone()).await {
            warn!("failed to persist aggregate: {e}");
        }
        Ok(entry)
    }

    /// `now` is the cycle time, `started` the monotonic instant that corresponds to it
    async fn process_center (&self, center: &CenterConfig, selected: bool, now: EpochMillis, started: Instant, deadline: Instant)->CenterContribution {
        let mut status = self.cache.center_status( &center.name).unwrap_or_else( || CenterStatus::new( &center.name));
        status.reset_cycle();
        status.error = None;

        let mut entry = self.cache.read_center( &center.name).map( |(e,_)| e);
        let cache_fresh = entry.as_ref().map( |e| is_fresh( e.age_ms( now), self.config.feed_center_cache_ttl)).unwrap_or(false);
        let mut failed = false;

        if selected && !cache_fresh {
            if status.is_backoff_active( now) {
                status.error = Some( BACKOFF_ACTIVE.to_string());

            } else if let Some((attempt_at, outcome)) = self.fetch_within( center, now, started, deadline, &mut status).await {
                status.center_last_attempt_at = Some(attempt_at);
                status.upstream_http = outcome.http_status();

                match outcome {
                    FetchOutcome::Failed { http_status, error } => {
                        warn!("center {} failed: HTTP {:?}: {}", center.name, http_status, error);
                        failed = true;
                        status.error = Some( error.to_string());
                        if http_status == Some(429) {
                            status.backoff_until_ms = Some( now.plus( self.config.feed_rate_limit_backoff).millis());
                        }
                    }
                    outcome => {
                        let payload = CenterPayload { ac: parse_records( outcome.records()), upstream_http: outcome.http_status() };
                        info!("center {} updated: {} aircraft", center.name, payload.ac.len());

                        if let Err(e) = self.cache.write_center( &center.name, payload.clone(), now) {
                            warn!("failed to persist cache of center {}: {e}", center.name);
                        }
                        entry = Some( CacheEntry::new( payload, now, Some(center.name.clone())));
                        status.center_last_ok_at = Some(now);
                        status.backoff_until_ms = None;
                        status.updated = true;
                    }
                }
            }
        }

        let entry = entry.and_then( |e| {
            let age = e.age_ms( now);
            status.cache_age_ms = Some(age);
            match classify( age, self.config.feed_center_cache_ttl, self.config.feed_cache_max_stale) {
                Freshness::Fresh => {
                    status.cache_hit = !status.updated;
                    Some(e)
                }
                Freshness::Stale => {
                    status.used_stale = true;
                    Some(e)
                }
                Freshness::Expired => None
            }
        });

        CenterContribution { status, entry, failed }
    }

    /// wait for a request slot and fetch within the remaining cycle time. Returns the time the request was sent
    /// together with its outcome, or `None` if we did not get to send a request, in which case the reason is
    /// set as status error
    async fn fetch_within (&self, center: &CenterConfig, now: EpochMillis, started: Instant, deadline: Instant, status: &mut CenterStatus)->Option<(EpochMillis,FetchOutcome)> {
        let remaining = deadline.saturating_duration_since( Instant::now());
        if remaining.is_zero() {
            status.error = Some( DEADLINE_EXCEEDED.to_string());
            return None
        }

        if !self.spacer.acquire( remaining).await {
            debug!("center {} not fetched: request spacing", center.name);
            status.error = Some( RATE_LIMITED.to_string());
            return None
        }

        let remaining = deadline.saturating_duration_since( Instant::now());
        let attempt_at = now.plus( started.elapsed()); // includes the spacing wait
        let outcome = match timeout( remaining, self.connector.fetch_center( center)).await {
            Ok(outcome) => outcome,
            Err(_) => FetchOutcome::Failed { http_status: None, error: UpstreamError::Transport("request timed out".to_string()) }
        };
        Some( (attempt_at, outcome) )
    }

    fn build_aggregate (&self, store: &mut AircraftStore, contributions: &[CenterContribution], now: EpochMillis)->AggregateResult {
        let statuses: Vec<CenterStatus> = contributions.iter().map( |c| c.status.clone()).collect();
        let upstream_http = latest_upstream_http( &statuses);
        let first_error = contributions.iter()
            .filter( |c| c.failed)
            .find_map( |c| c.status.error.clone());
        let cache_hit = !statuses.iter().any( |s| s.updated);

        let usable: Vec<&CacheEntry<CenterPayload>> = contributions.iter().filter_map( |c| c.entry.as_ref()).collect();
        if usable.is_empty() {
            warn!("no usable feed data from {} centers", contributions.len());
            return AggregateResult {
                ok: false,
                ac: Vec::new(),
                total: 0,
                generated_at_ms: now,
                data_ms: None,
                upstream_http,
                cache_stale: true,
                cache_hit,
                degraded: true,
                error: Some( first_error.unwrap_or_else( || NO_FEED_DATA.to_string())),
                centers: statuses,
            }
        }

        let data_ms = usable.iter().map( |e| e.stored_ms).max();
        let union: Vec<AircraftRecord> = usable.iter().flat_map( |e| e.payload.ac.iter().cloned()).collect();

        let mut ac = dedupe( union, &self.policy);
        let n_reaped = cleanup_stale_records( &mut ac, self.config.cache_cleanup_threshold);
        if n_reaped > 0 { debug!("reaped {} stale aircraft", n_reaped) }

        if self.config.feed_radius_filter_enabled {
            ac.retain( |rec| self.is_within_center_radius( rec));
        }

        let mut ac = store.merge( ac, now, self.config.aggregate_ttl());
        if !store.dropped_list().is_empty() {
            debug!("dropped {} aircraft not seen within {:?}: {:?}", store.dropped_list().len(), self.config.aggregate_ttl(), store.dropped_list());
        }
        if let Some(ui_center) = &self.config.ui_center {
            set_distances( &mut ac, ui_center);
        }

        let data_age = data_ms.map( |t| t.age_at( now)).unwrap_or(0);
        let degraded = contributions.iter().any( |c| c.failed || c.entry.is_none() || c.status.used_stale);

        AggregateResult {
            ok: true,
            total: ac.len(),
            ac,
            generated_at_ms: now,
            data_ms,
            upstream_http,
            cache_stale: is_expired( data_age, self.config.feed_cache_max_stale),
            cache_hit,
            degraded,
            error: first_error,
            centers: statuses,
        }
    }

    /// aircraft are only kept if they are within the radius of the center they are closest to
    fn is_within_center_radius (&self, rec: &AircraftRecord)->bool {
        let pos = LatLon::new( rec.lat, rec.lon);
        let (center,dist) = some_or_return!( closest_center( &self.config.feed_centers, &pos), true);

        if center.radius_nm > 0.0 && dist > center.radius_nm {
            log_record_discard( DiscardReason::OutsideRadius, rec);
            false
        } else {
            true
        }
    }
}

pub fn closest_center<'a> (centers: &'a [CenterConfig], pos: &LatLon)->Option<(&'a CenterConfig,f64)> {
    centers.iter()
        .map( |c| (c, c.position().distance_nm( pos)))
        .min_by( |a,b| a.1.partial_cmp( &b.1).unwrap_or( Ordering::Equal))
}

/// set `distance_nm` (rounded to 0.1nm) relative to the display center and sort by it
pub fn set_distances (ac: &mut [AircraftRecord], ui_center: &LatLon) {
    for rec in ac.iter_mut() {
        rec.distance_nm = Some( round_to( ui_center.distance_nm( &LatLon::new( rec.lat, rec.lon)), 1));
    }
    ac.sort_by( |a,b| a.distance_nm.partial_cmp( &b.distance_nm).unwrap_or( Ordering::Equal));
}

/// the HTTP status of the most recent upstream attempt
fn latest_upstream_http (statuses: &[CenterStatus])->Option<u16> {
    statuses.iter()
        .filter( |s| s.upstream_http.is_some())
        .max_by_key( |s| s.center_last_attempt_at.map( |t| t.millis()).unwrap_or(0))
        .and_then( |s| s.upstream_http)
}
