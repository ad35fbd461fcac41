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
#![allow(unused)]

//! ADS-B feed ingestion for air traffic displays.
//!
//! We poll a point-radius ADS-B provider for a number of configured centers, normalize and deduplicate
//! the reported aircraft, and keep the merged result in a cache that is served to browser clients.
//! Upstream failures degrade the served data (stale or partial) but do not take the feed down as long
//! as there is any usable cached data

pub mod errors;
pub mod config;
pub mod record;
pub mod normalize;
pub mod dedup;
pub mod reaper;
pub mod upstream;
pub mod cache;
pub mod store;
pub mod aggregator;
pub mod poller;
pub mod health;
pub mod feed_service;

pub use errors::{AtcAdsbError, Result, UpstreamError};
pub use config::{CenterConfig, FeedConfig};
pub use record::{AircraftRecord, RawRecord};
pub use cache::{AggregateResult, CacheEntry, CenterStatus, FeedCache};
pub use aggregator::FeedAggregator;
pub use poller::FeedPoller;
pub use upstream::{FetchOutcome, LiveUpstreamConnector, UpstreamConnector};
pub use feed_service::{FeedState, build_router};

atc_common::define_load_config!{}

/// version of the feed response contract
pub const SCHEMA_VERSION: u32 = 3;
