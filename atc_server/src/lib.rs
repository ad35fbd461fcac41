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

use std::net::SocketAddr;

use axum::{body::Body, response::{Response,IntoResponse}, Router, http::{header,StatusCode,HeaderValue}};
use serde::{Deserialize,Serialize};
use tokio::task::JoinHandle;
use tracing::{info,error};
use tracing_subscriber::EnvFilter;

pub mod errors;
use errors::{AtcServerResult,op_failed};

pub mod auth;

atc_common::define_load_config!{}

type Result<T> = AtcServerResult<T>;

#[derive(Deserialize,Serialize,Debug,Clone)]
pub struct ServerConfig {
    pub sock_addr: SocketAddr,
}

impl ServerConfig {
    pub fn url(&self) -> String {
        format!("http://{}", self.sock_addr)
    }
}

/// initialize a global fmt subscriber that is controlled by RUST_LOG.
/// Note this only succeeds if there is no global subscriber set yet
pub fn init_tracing () {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())  // use RUST_LOG to set max level
        .try_init();
}

/// bind to the configured socket address and serve the router in a spawned task. The router gets
/// `ConnectInfo<SocketAddr>` so that handlers and middleware can see the remote address
pub async fn spawn_server_task (config: &ServerConfig, router: Router) -> Result<JoinHandle<()>> {
    let sock_addr = config.sock_addr;
    let router_svc = router.into_make_service_with_connect_info::<SocketAddr>();
    let listener = tokio::net::TcpListener::bind(sock_addr).await
        .map_err( |e| op_failed( format!("cannot bind {sock_addr}: {e}")))?;
    info!("serving {}", config.url());

    Ok( tokio::spawn( async move {
        if let Err(e) = axum::serve( listener, router_svc).await {
            error!("server on {} terminated: {}", sock_addr, e);
        }
    }))
}

//--- handler utility functions

/// JSON response that must not be cached by browsers or proxies
pub fn json_response<T: Serialize> (status: StatusCode, data: &T) -> Response {
    match serde_json::to_vec( data) {
        Ok(bytes) => {
            (status, [
                (header::CONTENT_TYPE, HeaderValue::from_static("application/json")),
                (header::CACHE_CONTROL, HeaderValue::from_static("no-store"))
            ], Body::from(bytes)).into_response()
        }
        Err(e) => server_error( &e.to_string()).into_response()
    }
}

pub fn server_error (msg: &str) -> impl IntoResponse {
    (StatusCode::INTERNAL_SERVER_ERROR, msg.to_string())
}
