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

use std::sync::Arc;
use tokio::{task::{self,AbortHandle}, time::sleep};
use tracing::{debug,error,info};
use atc_common::datetime::EpochMillis;

use crate::aggregator::FeedAggregator;
use crate::upstream::UpstreamConnector;

/// the background task that drives aggregation cycles. This is the only writer of the feed cache,
/// request handlers just read what the last cycle produced
pub struct FeedPoller<C: UpstreamConnector> {
    aggregator: Arc<FeedAggregator<C>>,
    task: Option<AbortHandle>
}

impl<C> FeedPoller<C> where C: UpstreamConnector {
    pub fn new (aggregator: Arc<FeedAggregator<C>>)->Self {
        FeedPoller { aggregator, task: None }
    }

    pub fn aggregator (&self)->&Arc<FeedAggregator<C>> { &self.aggregator }

    pub fn is_running (&self)->bool {
        self.task.as_ref().map( |ah| !ah.is_finished()).unwrap_or(false)
    }

    /// start the poll loop. This is a no-op if the poller is already running
    pub fn start (&mut self) {
        if self.task.is_none() {
            let aggregator = self.aggregator.clone();
            let interval = aggregator.config().poll_interval();
            info!("starting feed poller for {} centers with interval {:?}", aggregator.config().feed_centers.len(), interval);

            let jh = task::spawn( async move {
                loop {
                    match aggregator.refresh( EpochMillis::now()).await {
                        Ok(agg) => {
                            let res = &agg.payload;
                            debug!("aggregate ok={} total={} degraded={} cache_hit={}", res.ok, res.total, res.degraded, res.cache_hit);
                        }
                        Err(e) => error!("aggregation cycle failed: {e}")
                    }
                    sleep( interval).await;
                }
            });
            self.task = Some( jh.abort_handle());
        }
    }

    pub fn terminate (&mut self) {
        if let Some(ah) = &self.task {
            ah.abort();
            self.task = None;
        }
    }
}

impl<C> Drop for FeedPoller<C> where C: UpstreamConnector {
    fn drop (&mut self) {
        self.terminate();
    }
}
