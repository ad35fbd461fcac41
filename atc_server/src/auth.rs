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

//! optional request authentication for feed endpoints. We support either a shared token (bearer
//! header, `X-Auth-Token` header or `token` query parameter) or HTTP basic credentials. Requests
//! from loopback addresses are exempt unless configured otherwise

use std::{net::{IpAddr,SocketAddr}, sync::Arc};
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header::{AUTHORIZATION,WWW_AUTHENTICATE}, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json
};
use headers::{Header, Authorization, authorization::{Basic,Bearer}};
use serde::{Serialize,Deserialize};
use serde_json::json;
use subtle::ConstantTimeEq;
use tracing::debug;

pub const AUTH_TOKEN_HEADER: &str = "x-auth-token";
pub const AUTH_REALM: &str = "Basic realm=\"ADSB\"";

#[derive(Deserialize,Serialize,Debug,Clone)]
pub enum AuthMethod {
    Token { token: String },
    Basic { user: String, password: String },
}

#[derive(Deserialize,Serialize,Debug,Clone)]
pub struct AuthConfig {
    pub method: AuthMethod,

    #[serde(default="default_exempt_loopback")]
    pub exempt_loopback: bool,
}

fn default_exempt_loopback()->bool { true }

impl AuthConfig {
    pub fn is_authorized (&self, remote: Option<&SocketAddr>, headers: &HeaderMap, query: Option<&str>)->bool {
        if self.exempt_loopback && remote.map( |addr| is_loopback( &addr.ip())).unwrap_or(false) {
            return true
        }

        match &self.method {
            AuthMethod::Token { token } => {
                request_token( headers, query).map( |t| ct_eq( t.as_bytes(), token.as_bytes())).unwrap_or(false)
            }
            AuthMethod::Basic { user, password } => {
                match Authorization::<Basic>::decode( &mut headers.get_all(AUTHORIZATION).iter()) {
                    // don't short circuit so that both comparisons are always performed
                    Ok(auth) => ct_eq( auth.username().as_bytes(), user.as_bytes()) & ct_eq( auth.password().as_bytes(), password.as_bytes()),
                    Err(_) => false
                }
            }
        }
    }
}

fn request_token (headers: &HeaderMap, query: Option<&str>)->Option<String> {
    if let Ok(bearer) = Authorization::<Bearer>::decode( &mut headers.get_all(AUTHORIZATION).iter()) {
        return Some( bearer.token().to_string())
    }

    if let Some(token) = headers.get(AUTH_TOKEN_HEADER).and_then( |v| v.to_str().ok()) {
        let token = token.trim();
        if !token.is_empty() { return Some(token.to_string()) }
    }

    // query values are percent/form encoded
    query.and_then( |q| {
        form_urlencoded::parse( q.as_bytes())
            .find( |(k,_)| k == "token")
            .map( |(_,v)| v.into_owned())
            .filter( |v| !v.is_empty())
    })
}

/// IPv4-mapped IPv6 loopback addresses (::ffff:127.0.0.1) count as loopback
pub fn is_loopback (ip: &IpAddr)->bool {
    match ip {
        IpAddr::V4(v4) => v4.is_loopback(),
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map( |v4| v4.is_loopback()).unwrap_or( v6.is_loopback())
    }
}

/// constant time comparison. Inputs of different length never match
pub fn ct_eq (a: &[u8], b: &[u8])->bool {
    a.ct_eq( b).into()
}

pub fn unauthorized_response ()->Response {
    let mut response = (StatusCode::UNAUTHORIZED, Json( json!({"error": "Unauthorized"}))).into_response();
    response.headers_mut().insert( WWW_AUTHENTICATE, HeaderValue::from_static(AUTH_REALM));
    response
}

/// axum middleware function, to be used with `axum::middleware::from_fn_with_state( Arc<AuthConfig>, authenticate)`
pub async fn authenticate (State(auth): State<Arc<AuthConfig>>, req: Request, next: Next)->Response {
    let remote = req.extensions().get::<ConnectInfo<SocketAddr>>().map( |ci| ci.0);

    if auth.is_authorized( remote.as_ref(), req.headers(), req.uri().query()) {
        next.run(req).await
    } else {
        debug!("rejected unauthorized request for {} from {:?}", req.uri().path(), remote);
        unauthorized_response()
    }
}
