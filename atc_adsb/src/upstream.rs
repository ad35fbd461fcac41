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

use std::{sync::Arc, time::Duration};
use async_trait::async_trait;
use reqwest::{Client, header::ACCEPT};
use serde::Deserialize;
use serde_json::Value;
use tokio::{sync::Mutex, time::{Instant,sleep}};
use tracing::debug;

use crate::config::{CenterConfig, FeedConfig};
use crate::errors::{Result, UpstreamError};
use crate::record::{RawRecord, log_malformed_discard};

pub const USER_AGENT: &str = "ADSB-ATC-Display";

/// the tri-state result of a single upstream request
#[derive(Debug,Clone,PartialEq)]
pub enum FetchOutcome {
    Data { ac: Vec<RawRecord>, http_status: u16 },
    Empty { http_status: u16 },
    Failed { http_status: Option<u16>, error: UpstreamError },
}

impl FetchOutcome {
    pub fn http_status (&self)->Option<u16> {
        match self {
            FetchOutcome::Data { http_status, .. } => Some(*http_status),
            FetchOutcome::Empty { http_status } => Some(*http_status),
            FetchOutcome::Failed { http_status, .. } => *http_status,
        }
    }

    pub fn is_ok (&self)->bool { !matches!( self, FetchOutcome::Failed{..}) }

    pub fn error (&self)->Option<&UpstreamError> {
        match self {
            FetchOutcome::Failed { error, .. } => Some(error),
            _ => None
        }
    }

    pub fn records (&self)->&[RawRecord] {
        match self {
            FetchOutcome::Data { ac, .. } => ac.as_slice(),
            _ => &[]
        }
    }
}

/// abstraction of the upstream ADS-B provider. `UpstreamConnector` instances are injected into the
/// [crate::aggregator::FeedAggregator], which allows us to test aggregation without network access.
/// Implementations never return errors, all failures are reported as [FetchOutcome::Failed]
#[async_trait]
pub trait UpstreamConnector: Send + Sync + 'static {
    async fn fetch_center (&self, center: &CenterConfig)->FetchOutcome;
}

/// `<base>/<lat>/<lon>/<radius>` with the radius clamped to what upstream accepts
pub fn center_url (base_url: &str, center: &CenterConfig)->String {
    format!("{}/{}/{}/{}", base_url.trim_end_matches('/'), center.lat, center.lon, center.query_radius_nm())
}

#[derive(Deserialize)]
struct UpstreamResponse {
    ac: Option<Vec<Value>>,
}

/// parse a successful (status < 400) response body. Individual aircraft entries that do not parse as
/// records are skipped and reported as `malformed` discards
pub fn parse_upstream_body (bytes: &[u8], http_status: u16)->FetchOutcome {
    match serde_json::from_slice::<UpstreamResponse>( bytes) {
        Ok(UpstreamResponse{ ac: Some(entries) }) => {
            let ac: Vec<RawRecord> = entries.into_iter()
                .filter_map( |v| {
                    let hex = v.get("hex").and_then( |h| h.as_str()).map( |s| s.to_string());
                    match serde_json::from_value::<RawRecord>(v) {
                        Ok(raw) => Some(raw),
                        Err(_) => {
                            log_malformed_discard( hex.as_deref());
                            None
                        }
                    }
                })
                .collect();
            if ac.is_empty() {
                FetchOutcome::Empty { http_status }
            } else {
                FetchOutcome::Data { ac, http_status }
            }
        }
        Ok(_) => FetchOutcome::Failed { http_status: Some(http_status), error: UpstreamError::Protocol("missing 'ac' array".to_string()) },
        Err(e) => FetchOutcome::Failed { http_status: Some(http_status), error: UpstreamError::Protocol(e.to_string()) },
    }
}

/// the reqwest based connector that queries the provider's point-radius endpoint
pub struct LiveUpstreamConnector {
    config: Arc<FeedConfig>,
    client: Client,
}

impl LiveUpstreamConnector {
    pub fn new (config: Arc<FeedConfig>)->Result<Self> {
        let client = Client::builder()
            .user_agent( USER_AGENT)
            .timeout( config.feed_request_timeout)
            .build()?;
        Ok( LiveUpstreamConnector { config, client } )
    }
}

#[async_trait]
impl UpstreamConnector for LiveUpstreamConnector {

    async fn fetch_center (&self, center: &CenterConfig)->FetchOutcome {
        let url = center_url( &self.config.adsb_feed_url, center);
        debug!("GET {}", url);

        let mut req = self.client.get( &url).header( ACCEPT, "application/json");
        if let Some(key) = &self.config.adsb_api_key && !key.is_empty() {
            req = req.header( self.config.adsb_api_header.as_str(), key.as_str());
        }

        let response = match req.send().await {
            Ok(response) => response,
            Err(e) => return FetchOutcome::Failed { http_status: None, error: UpstreamError::Transport(e.to_string()) }
        };

        let http_status = response.status().as_u16();
        if http_status >= 400 {
            return FetchOutcome::Failed { http_status: Some(http_status), error: UpstreamError::Http(http_status) }
        }

        match response.bytes().await {
            Ok(bytes) => parse_upstream_body( &bytes, http_status),
            Err(e) => FetchOutcome::Failed { http_status: Some(http_status), error: UpstreamError::Transport(e.to_string()) }
        }
    }
}

/// soft rate limiter that enforces a minimum spacing between consecutive upstream requests.
/// Callers that would have to wait longer than they can afford are turned away (and serve cache instead)
pub struct RequestSpacer {
    spacing: Duration,
    last: Mutex<Option<Instant>>,
}

impl RequestSpacer {
    pub fn new (spacing: Duration)->Self {
        RequestSpacer { spacing, last: Mutex::new(None) }
    }

    pub fn spacing (&self)->Duration { self.spacing }

    /// wait for the next request slot if it becomes available within `max_wait`. Returns false if not.
    /// The lock is held while waiting so that concurrent callers are strictly serialized
    pub async fn acquire (&self, max_wait: Duration)->bool {
        let mut last = self.last.lock().await;

        if let Some(t_last) = *last {
            let next = t_last + self.spacing;
            let now = Instant::now();
            if next > now {
                let wait = next - now;
                if wait > max_wait { return false }
                sleep( wait).await;
            }
        }

        *last = Some( Instant::now());
        true
    }
}
