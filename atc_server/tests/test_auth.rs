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

use std::{net::SocketAddr, sync::Arc};
use axum::{Router, routing::get, body::Body, extract::ConnectInfo, middleware::from_fn_with_state, http::{Request, StatusCode, header}};
use tower::ServiceExt;
use atc_server::{ServerConfig, auth::{AuthConfig, AuthMethod, authenticate, ct_eq, is_loopback}};

fn token_config ()->AuthConfig {
    AuthConfig { method: AuthMethod::Token { token: "s3cret".to_string() }, exempt_loopback: true }
}

fn basic_config ()->AuthConfig {
    AuthConfig { method: AuthMethod::Basic { user: "ops".to_string(), password: "secret".to_string() }, exempt_loopback: true }
}

fn router (auth: AuthConfig)->Router {
    Router::new()
        .route("/feed", get( || async { "ok" }))
        .layer( from_fn_with_state( Arc::new(auth), authenticate))
}

async fn status_of (auth: AuthConfig, req: Request<Body>)->StatusCode {
    router(auth).oneshot(req).await.unwrap().status()
}

// run with "cargo test -p atc_server -- --nocapture"

#[tokio::test]
async fn test_token_auth () {
    let req = Request::get("/feed").body(Body::empty()).unwrap();
    let response = router( token_config()).oneshot(req).await.unwrap();
    assert_eq!( response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!( response.headers().get(header::WWW_AUTHENTICATE).unwrap(), "Basic realm=\"ADSB\"");

    let req = Request::get("/feed").header( header::AUTHORIZATION, "Bearer s3cret").body(Body::empty()).unwrap();
    assert_eq!( status_of( token_config(), req).await, StatusCode::OK);

    let req = Request::get("/feed").header( "X-Auth-Token", "s3cret").body(Body::empty()).unwrap();
    assert_eq!( status_of( token_config(), req).await, StatusCode::OK);

    let req = Request::get("/feed?foo=1&token=s3cret").body(Body::empty()).unwrap();
    assert_eq!( status_of( token_config(), req).await, StatusCode::OK);

    let req = Request::get("/feed?token=wrong").body(Body::empty()).unwrap();
    assert_eq!( status_of( token_config(), req).await, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_encoded_query_token () {
    let auth = AuthConfig { method: AuthMethod::Token { token: "a+b&c".to_string() }, exempt_loopback: false };
    let no_headers = axum::http::HeaderMap::new();

    assert!( auth.is_authorized( None, &no_headers, Some("token=a%2Bb%26c")));
    assert!( auth.is_authorized( None, &no_headers, Some("x=1&token=a%2Bb%26c&y=2")));
    assert!( !auth.is_authorized( None, &no_headers, Some("token=a+b&c"))); // '+' is a space, '&' splits
    assert!( !auth.is_authorized( None, &no_headers, Some("token=")));

    let req = Request::get("/feed?token=a%2Bb%26c").body(Body::empty()).unwrap();
    assert_eq!( status_of( auth.clone(), req).await, StatusCode::OK);

    let req = Request::get("/feed?token=a%2Bb").body(Body::empty()).unwrap();
    assert_eq!( status_of( auth, req).await, StatusCode::UNAUTHORIZED);

    // plain tokens still work
    let auth = AuthConfig { method: AuthMethod::Token { token: "two words".to_string() }, exempt_loopback: false };
    assert!( auth.is_authorized( None, &no_headers, Some("token=two+words")));
    assert!( auth.is_authorized( None, &no_headers, Some("token=two%20words")));
}

#[tokio::test]
async fn test_basic_auth () {
    let req = Request::get("/feed").header( header::AUTHORIZATION, "Basic b3BzOnNlY3JldA==").body(Body::empty()).unwrap();
    assert_eq!( status_of( basic_config(), req).await, StatusCode::OK);

    let req = Request::get("/feed").header( header::AUTHORIZATION, "Basic b3BzOndyb25n").body(Body::empty()).unwrap();
    assert_eq!( status_of( basic_config(), req).await, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_loopback_exemption () {
    let local: SocketAddr = "127.0.0.1:50000".parse().unwrap();
    let remote: SocketAddr = "192.0.2.10:50000".parse().unwrap();

    let mut req = Request::get("/feed").body(Body::empty()).unwrap();
    req.extensions_mut().insert( ConnectInfo(local));
    assert_eq!( status_of( token_config(), req).await, StatusCode::OK);

    let mut req = Request::get("/feed").body(Body::empty()).unwrap();
    req.extensions_mut().insert( ConnectInfo(remote));
    assert_eq!( status_of( token_config(), req).await, StatusCode::UNAUTHORIZED);

    let mut conf = token_config();
    conf.exempt_loopback = false;
    let mut req = Request::get("/feed").body(Body::empty()).unwrap();
    req.extensions_mut().insert( ConnectInfo(local));
    assert_eq!( status_of( conf, req).await, StatusCode::UNAUTHORIZED);
}

#[test]
fn test_helpers () {
    assert!( ct_eq( b"abc", b"abc"));
    assert!( !ct_eq( b"abc", b"abd"));
    assert!( !ct_eq( b"abc", b"abcd"));

    assert!( is_loopback( &"::1".parse().unwrap()));
    assert!( is_loopback( &"::ffff:127.0.0.1".parse().unwrap()));
    assert!( !is_loopback( &"10.0.0.1".parse().unwrap()));
}

#[test]
fn test_config () {
    let conf: AuthConfig = ron::from_str( r#"( method: Token( token: "abc" ) )"#).unwrap();
    println!("{conf:?}");
    assert!( conf.exempt_loopback);

    let conf: ServerConfig = ron::from_str( r#"( sock_addr: "127.0.0.1:8080" )"#).unwrap();
    assert_eq!( conf.url(), "http://127.0.0.1:8080");
}
