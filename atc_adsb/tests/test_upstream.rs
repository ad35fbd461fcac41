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

use std::{sync::Arc, time::Duration};
use httpmock::prelude::*;
use tokio::time::Instant;
use atc_adsb::{
    config::{CenterConfig, FeedConfig},
    upstream::{FetchOutcome, LiveUpstreamConnector, RequestSpacer, UpstreamConnector, USER_AGENT},
    UpstreamError,
};

const BODY: &str = r#"{"ac":[{"hex":"a1b2c3","flight":"AMX123","lat":19.43,"lon":-99.13,"alt_baro":35000,"seen_pos":1.5}],"total":1}"#;

fn center ()->CenterConfig { CenterConfig::new( "Ciudad de Mexico", 19.43, -99.13, 250.0) }

fn config_for (server: &MockServer, api_key: Option<&str>)->Arc<FeedConfig> {
    let mut config = FeedConfig::with_centers( vec![ center() ]);
    config.adsb_feed_url = server.url( "/v2/point/");
    config.adsb_api_key = api_key.map( |k| k.to_string());
    config.feed_request_timeout = Duration::from_millis(500);
    Arc::new( config)
}

// run with "cargo test -p atc_adsb --test test_upstream -- --nocapture"

#[tokio::test]
async fn test_fetch_center () {
    let server = MockServer::start_async().await;
    let m = server.mock_async( |when, then| {
        when.method(GET)
            .path( "/v2/point/19.43/-99.13/250")
            .header( "user-agent", USER_AGENT)
            .header( "accept", "application/json")
            .header( "x-api-key", "k123");
        then.status(200)
            .header( "content-type", "application/json")
            .body( BODY);
    }).await;

    let connector = LiveUpstreamConnector::new( config_for( &server, Some("k123"))).unwrap();
    let outcome = connector.fetch_center( &center()).await;
    println!("{outcome:?}");

    m.assert_async().await;
    match outcome {
        FetchOutcome::Data { ac, http_status } => {
            assert_eq!( http_status, 200);
            assert_eq!( ac.len(), 1);
            assert_eq!( ac[0].hex.as_deref(), Some("a1b2c3"));
        }
        other => panic!("unexpected outcome {other:?}")
    }
}

#[tokio::test]
async fn test_fetch_errors () {
    let server = MockServer::start_async().await;
    server.mock_async( |when, then| {
        when.method(GET).path( "/v2/point/19.43/-99.13/250");
        then.status(503).body( "service unavailable");
    }).await;

    let connector = LiveUpstreamConnector::new( config_for( &server, None)).unwrap();
    let outcome = connector.fetch_center( &center()).await;
    assert_eq!( outcome, FetchOutcome::Failed { http_status: Some(503), error: UpstreamError::Http(503) });
    assert_eq!( outcome.error().unwrap().to_string(), "Upstream HTTP 503");

    let center = CenterConfig::new( "Monterrey", 25.69, -100.32, 250.0);
    server.mock_async( |when, then| {
        when.method(GET).path( "/v2/point/25.69/-100.32/250");
        then.status(200).body( "{\"msg\": \"no ac here\"");
    }).await;
    let outcome = connector.fetch_center( &center).await;
    println!("{outcome:?}");
    assert!( matches!( outcome, FetchOutcome::Failed { http_status: Some(200), error: UpstreamError::Protocol(_) }));
}

#[tokio::test]
async fn test_fetch_empty () {
    let server = MockServer::start_async().await;
    server.mock_async( |when, then| {
        when.method(GET).path( "/v2/point/19.43/-99.13/250");
        then.status(200).header( "content-type", "application/json").body( r#"{"ac":[],"total":0}"#);
    }).await;

    let connector = LiveUpstreamConnector::new( config_for( &server, None)).unwrap();
    assert_eq!( connector.fetch_center( &center()).await, FetchOutcome::Empty { http_status: 200 });
}

#[tokio::test]
async fn test_fetch_timeout () {
    let server = MockServer::start_async().await;
    server.mock_async( |when, then| {
        when.method(GET).path( "/v2/point/19.43/-99.13/250");
        then.status(200).delay( Duration::from_secs(3)).body( BODY);
    }).await;

    let connector = LiveUpstreamConnector::new( config_for( &server, None)).unwrap();
    let outcome = connector.fetch_center( &center()).await;
    println!("{outcome:?}");
    assert!( matches!( outcome, FetchOutcome::Failed { http_status: None, error: UpstreamError::Transport(_) }));
}

#[tokio::test]
async fn test_fetch_unreachable () {
    let mut config = FeedConfig::with_centers( vec![ center() ]);
    config.adsb_feed_url = "http://127.0.0.1:1/v2/point".to_string();
    let connector = LiveUpstreamConnector::new( Arc::new( config)).unwrap();

    let outcome = connector.fetch_center( &center()).await;
    assert!( !outcome.is_ok());
    assert_eq!( outcome.http_status(), None);
    assert!( outcome.error().unwrap().to_string().starts_with( "Upstream request failed"));
}

#[tokio::test]
async fn test_request_spacer () {
    let spacer = RequestSpacer::new( Duration::from_millis(200));

    let t0 = Instant::now();
    assert!( spacer.acquire( Duration::from_secs(1)).await);
    assert!( t0.elapsed() < Duration::from_millis(100));

    assert!( spacer.acquire( Duration::from_secs(1)).await);
    let dt = t0.elapsed();
    println!("second slot after {dt:?}");
    assert!( dt >= Duration::from_millis(190));

    // can't wait long enough
    assert!( !spacer.acquire( Duration::from_millis(10)).await);
}
