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

use std::{collections::HashSet, path::PathBuf, time::Duration};
use serde::{Serialize,Deserialize};
use atc_common::{
    datetime::{deserialize_duration, deserialize_optional_duration, millis, secs},
    geo::LatLon
};
use atc_server::auth::AuthConfig;

use crate::errors::{AtcAdsbError, Result, config_error};

pub const MIN_QUERY_RADIUS_NM: u32 = 1;
pub const MAX_QUERY_RADIUS_NM: u32 = 250;

/// a named point-radius query against the upstream provider
#[derive(Deserialize,Serialize,Debug,Clone,PartialEq)]
pub struct CenterConfig {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub radius_nm: f64,
}

impl CenterConfig {
    pub fn new (name: impl ToString, lat: f64, lon: f64, radius_nm: f64)->Self {
        CenterConfig { name: name.to_string(), lat, lon, radius_nm }
    }

    pub fn position (&self)->LatLon { LatLon::new( self.lat, self.lon) }

    /// the radius we send upstream, which only accepts integral values in [1,250]
    pub fn query_radius_nm (&self)->u32 {
        if self.radius_nm.is_finite() {
            (self.radius_nm.round().max(0.0) as u32).clamp( MIN_QUERY_RADIUS_NM, MAX_QUERY_RADIUS_NM)
        } else {
            MAX_QUERY_RADIUS_NM
        }
    }
}

/// the immutable feed configuration. This is loaded once at startup (from `feed.ron`) and then
/// shared as `Arc<FeedConfig>` between aggregator, poller and services
#[derive(Deserialize,Debug,Clone)]
pub struct FeedConfig {
    pub feed_centers: Vec<CenterConfig>,

    #[serde(default="default_feed_url")]
    pub adsb_feed_url: String,
    #[serde(default)]
    pub adsb_api_key: Option<String>,
    #[serde(default="default_api_header")]
    pub adsb_api_header: String,

    /// minimum time between two consecutive upstream requests
    #[serde(default="default_spacing", deserialize_with="deserialize_duration")]
    pub feed_center_request_spacing: Duration,
    /// per-center cache entries younger than this are not refetched
    #[serde(default="default_center_cache_ttl", deserialize_with="deserialize_duration")]
    pub feed_center_cache_ttl: Duration,
    /// aggregates younger than this are not recomputed
    #[serde(default="default_aggregate_cache_ttl", deserialize_with="deserialize_duration")]
    pub feed_aggregate_cache_ttl: Duration,
    /// grace window in which cached data is still served while upstream is failing
    #[serde(default="default_max_stale", deserialize_with="deserialize_duration")]
    pub feed_cache_max_stale: Duration,
    /// aircraft retention and aggregate health window
    #[serde(default="default_aggregate_ttl", deserialize_with="deserialize_duration")]
    pub feed_aggregate_ttl: Duration,

    #[serde(default="default_max_centers")]
    pub feed_max_centers_per_request: usize,
    #[serde(default="default_true")]
    pub feed_round_robin_enabled: bool,

    /// max `seen_pos` (in seconds) of aircraft we keep. Values <= 0 disable reaping
    #[serde(default="default_cleanup_threshold")]
    pub cache_cleanup_threshold: f64,
    #[serde(default="default_round_decimals")]
    pub coordinate_round_decimals: u32,
    #[serde(default="default_alt_threshold")]
    pub altitude_change_threshold_ft: i64,

    #[serde(default="default_request_timeout", deserialize_with="deserialize_duration")]
    pub feed_request_timeout: Duration,
    #[serde(default="default_cycle_deadline", deserialize_with="deserialize_duration")]
    pub feed_cycle_deadline: Duration,
    #[serde(default="default_rate_limit_backoff", deserialize_with="deserialize_duration")]
    pub feed_rate_limit_backoff: Duration,
    #[serde(default, deserialize_with="deserialize_optional_duration")]
    pub feed_poll_interval: Option<Duration>,

    #[serde(default)]
    pub feed_cache_dir: Option<PathBuf>,

    #[serde(default)]
    pub ui_center: Option<LatLon>,
    #[serde(default="default_true")]
    pub feed_radius_filter_enabled: bool,

    #[serde(default)]
    pub static_dir: Option<PathBuf>,
    #[serde(default)]
    pub auth: Option<AuthConfig>,
}

fn default_feed_url()->String { "https://api.airplanes.live/v2/point".to_string() }
fn default_api_header()->String { "X-API-Key".to_string() }
fn default_spacing()->Duration { millis(1100) }
fn default_center_cache_ttl()->Duration { millis(8000) }
fn default_aggregate_cache_ttl()->Duration { millis(2500) }
fn default_max_stale()->Duration { millis(8000) }
fn default_aggregate_ttl()->Duration { secs(90) }
fn default_max_centers()->usize { 1 }
fn default_true()->bool { true }
fn default_cleanup_threshold()->f64 { 300.0 }
fn default_round_decimals()->u32 { 3 }
fn default_alt_threshold()->i64 { 100 }
fn default_request_timeout()->Duration { secs(5) }
fn default_cycle_deadline()->Duration { secs(4) }
fn default_rate_limit_backoff()->Duration { secs(25) }

impl FeedConfig {

    /// a config with default settings for the given centers
    pub fn with_centers (feed_centers: Vec<CenterConfig>)->Self {
        FeedConfig {
            feed_centers,
            adsb_feed_url: default_feed_url(),
            adsb_api_key: None,
            adsb_api_header: default_api_header(),
            feed_center_request_spacing: default_spacing(),
            feed_center_cache_ttl: default_center_cache_ttl(),
            feed_aggregate_cache_ttl: default_aggregate_cache_ttl(),
            feed_cache_max_stale: default_max_stale(),
            feed_aggregate_ttl: default_aggregate_ttl(),
            feed_max_centers_per_request: default_max_centers(),
            feed_round_robin_enabled: true,
            cache_cleanup_threshold: default_cleanup_threshold(),
            coordinate_round_decimals: default_round_decimals(),
            altitude_change_threshold_ft: default_alt_threshold(),
            feed_request_timeout: default_request_timeout(),
            feed_cycle_deadline: default_cycle_deadline(),
            feed_rate_limit_backoff: default_rate_limit_backoff(),
            feed_poll_interval: None,
            feed_cache_dir: None,
            ui_center: None,
            feed_radius_filter_enabled: true,
            static_dir: None,
            auth: None,
        }
    }

    pub fn check (&self)->Result<()> {
        if self.feed_centers.is_empty() {
            return Err( config_error!("no feed_centers configured"))
        }

        let mut names: HashSet<&str> = HashSet::new();
        for c in &self.feed_centers {
            if c.name.trim().is_empty() {
                return Err( config_error!("feed center without name"))
            }
            if !names.insert( c.name.as_str()) {
                return Err( config_error!("duplicated feed center name '{}'", c.name))
            }
            if !(-90.0..=90.0).contains( &c.lat) || !(-180.0..=180.0).contains( &c.lon) {
                return Err( config_error!("feed center '{}' has invalid position {},{}", c.name, c.lat, c.lon))
            }
        }

        if self.adsb_feed_url.trim().is_empty() {
            return Err( config_error!("no adsb_feed_url configured"))
        }
        Ok(())
    }

    pub fn center_request_spacing (&self)->Duration { self.feed_center_request_spacing.max( millis(1)) }

    pub fn aggregate_ttl (&self)->Duration { self.feed_aggregate_ttl.max( secs(1)) }

    pub fn poll_interval (&self)->Duration { self.feed_poll_interval.unwrap_or( self.center_request_spacing()) }

    /// number of centers we query per aggregation cycle
    pub fn centers_per_cycle (&self)->usize {
        let n = self.feed_centers.len();
        if self.feed_round_robin_enabled {
            self.feed_max_centers_per_request.clamp( 1, n.max(1))
        } else {
            n
        }
    }

    pub fn center (&self, name: &str)->Option<&CenterConfig> {
        self.feed_centers.iter().find( |c| c.name == name)
    }
}
