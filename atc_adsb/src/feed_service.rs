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

//! the browser facing routes. Handlers only read the [FeedCache] (which is written by the poller),
//! hence a request never waits for upstream

use std::sync::Arc;
use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::Response,
    routing::get,
    Router
};
use serde::{Serialize,Deserialize};
use tower_http::services::ServeDir;
use atc_common::datetime::{EpochMillis, duration_millis};
use atc_server::{auth::authenticate, json_response};

use crate::SCHEMA_VERSION;
use crate::aggregator::NO_FEED_DATA;
use crate::cache::{FeedCache, CenterStatus, is_expired};
use crate::config::{CenterConfig, FeedConfig};
use crate::health::health_report;
use crate::record::AircraftRecord;

/// the shared state of our routes
#[derive(Clone)]
pub struct FeedState {
    pub config: Arc<FeedConfig>,
    pub cache: Arc<FeedCache>,
}

impl FeedState {
    pub fn new (config: Arc<FeedConfig>, cache: Arc<FeedCache>)->Self { FeedState { config, cache } }
}

/// the JSON contract of the feed endpoint
#[derive(Serialize,Deserialize,Debug,Clone,PartialEq)]
pub struct FeedResponse {
    pub ok: bool,
    pub ac: Vec<AircraftRecord>,
    pub total: usize,
    pub count: usize,
    pub generated_at_ms: Option<EpochMillis>,
    pub generated_at: Option<String>,
    /// age of the newest center data in the aggregate
    pub age_ms: Option<i64>,
    pub aggregate_age_ms: Option<i64>,
    pub cache_stale: bool,
    pub cache_hit: bool,
    pub cache_max_stale_ms: i64,
    pub upstream_http: Option<u16>,
    pub error: Option<String>,
    pub upstream_status_per_center: Vec<CenterStatus>,
    pub feed_centers: Vec<CenterConfig>,
    pub schema_version: u32,
}

impl FeedResponse {
    fn failed (config: &FeedConfig, error: &str, upstream_http: Option<u16>)->Self {
        FeedResponse {
            ok: false,
            ac: Vec::new(),
            total: 0,
            count: 0,
            generated_at_ms: None,
            generated_at: None,
            age_ms: None,
            aggregate_age_ms: None,
            cache_stale: true,
            cache_hit: false,
            cache_max_stale_ms: duration_millis( &config.feed_cache_max_stale),
            upstream_http,
            error: Some( error.to_string()),
            upstream_status_per_center: Vec::new(),
            feed_centers: config.feed_centers.clone(),
            schema_version: SCHEMA_VERSION,
        }
    }
}

/// compute the feed response from the current aggregate
pub async fn feed_response (state: &FeedState, now: EpochMillis)->(StatusCode,FeedResponse) {
    let config = state.config.as_ref();

    let entry = match state.cache.read_aggregate().await {
        Some(entry) => entry,
        None => return (StatusCode::SERVICE_UNAVAILABLE, FeedResponse::failed( config, NO_FEED_DATA, None))
    };
    let agg = &entry.payload;

    if !agg.ok {
        let mut response = FeedResponse::failed( config, agg.error.as_deref().unwrap_or( NO_FEED_DATA), agg.upstream_http);
        response.generated_at_ms = Some( agg.generated_at_ms);
        response.generated_at = Some( agg.generated_at_ms.to_rfc3339());
        response.upstream_status_per_center = agg.centers.clone();
        return (StatusCode::BAD_GATEWAY, response)
    }

    let age_ms = agg.data_age_ms( now);
    let cache_stale = agg.cache_stale || is_expired( age_ms, config.feed_cache_max_stale);

    let response = FeedResponse {
        ok: !(cache_stale && agg.ac.is_empty()),
        ac: agg.ac.clone(),
        total: agg.total,
        count: agg.ac.len(),
        generated_at_ms: Some( agg.generated_at_ms),
        generated_at: Some( agg.generated_at_ms.to_rfc3339()),
        age_ms: Some( age_ms),
        aggregate_age_ms: Some( entry.age_ms( now)),
        cache_stale,
        cache_hit: agg.cache_hit,
        cache_max_stale_ms: duration_millis( &config.feed_cache_max_stale),
        upstream_http: agg.upstream_http,
        error: agg.error.clone(),
        upstream_status_per_center: agg.centers.clone(),
        feed_centers: config.feed_centers.clone(),
        schema_version: SCHEMA_VERSION,
    };
    (StatusCode::OK, response)
}

async fn feed_handler (State(state): State<FeedState>)->Response {
    let (status, response) = feed_response( &state, EpochMillis::now()).await;
    json_response( status, &response)
}

async fn health_handler (State(state): State<FeedState>)->Response {
    let report = health_report( &state.config, &state.cache, EpochMillis::now()).await;
    json_response( StatusCode::OK, &report)
}

/// `GET /feed`, `GET /health` and (if configured) the static layer files under `/data`, all behind
/// the optional auth layer
pub fn build_router (state: FeedState)->Router {
    let config = state.config.clone();

    let mut router = Router::new()
        .route( "/feed", get( feed_handler))
        .route( "/health", get( health_handler))
        .with_state( state);

    if let Some(static_dir) = &config.static_dir {
        router = router.nest_service( "/data", ServeDir::new( static_dir));
    }

    if let Some(auth) = &config.auth {
        router = router.layer( middleware::from_fn_with_state( Arc::new( auth.clone()), authenticate));
    }

    router
}
