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

use std::{path::PathBuf, sync::Arc};
use anyhow::Result;
use clap::Parser;
use tracing::info;
use atc_common::configs::load_config_file;
use atc_server::{ServerConfig, init_tracing, spawn_server_task};
use atc_adsb::{FeedAggregator, FeedCache, FeedConfig, FeedPoller, FeedState, LiveUpstreamConnector, build_router};

#[derive(Parser, Debug)]
#[command(version, about, long_about = "poll ADS-B centers and serve the merged feed")]
pub struct Args {
    /// path of the feed config (default is configs/atc_adsb/feed.ron)
    #[arg(long)]
    pub feed_config: Option<PathBuf>,

    /// path of the server config (default is configs/atc_server/server.ron)
    #[arg(long)]
    pub server_config: Option<PathBuf>,
}

#[tokio::main]
async fn main()->Result<()> {
    init_tracing();
    let args = Args::parse();

    let feed_config: FeedConfig = match &args.feed_config {
        Some(path) => load_config_file( path)?,
        None => atc_adsb::load_config( "feed.ron")?
    };
    feed_config.check()?;
    let feed_config = Arc::new( feed_config);

    let server_config: ServerConfig = match &args.server_config {
        Some(path) => load_config_file( path)?,
        None => atc_server::load_config( "server.ron")?
    };

    let cache = Arc::new( FeedCache::new( feed_config.feed_cache_dir.clone())?);
    let center_names: Vec<String> = feed_config.feed_centers.iter().map( |c| c.name.clone()).collect();
    let n_loaded = cache.load( &center_names).await;
    info!("warm start with {} cached entries", n_loaded);

    let connector = Arc::new( LiveUpstreamConnector::new( feed_config.clone())?);
    let aggregator = Arc::new( FeedAggregator::new( feed_config.clone(), connector, cache.clone()));
    let mut poller = FeedPoller::new( aggregator);
    poller.start();

    let router = build_router( FeedState::new( feed_config, cache));
    let server_task = spawn_server_task( &server_config, router).await?;

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    poller.terminate();
    server_task.abort();

    Ok(())
}
