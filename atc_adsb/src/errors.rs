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

use thiserror::Error;

pub type Result<T> = std::result::Result<T,AtcAdsbError>;

#[derive(Error,Debug)]
pub enum AtcAdsbError {

    #[error("IO error {0}")]
    IOError( #[from] std::io::Error),

    #[error("JSON error {0}")]
    JsonError( #[from] serde_json::Error),

    #[error("http client error {0}")]
    HttpError( #[from] reqwest::Error),

    #[error("common error {0}")]
    AtcCommonError( #[from] atc_common::AtcCommonError),

    #[error("config error {0}")]
    ConfigError(String),
}

/// the reasons why an upstream request did not produce data. These are reported as part of
/// the per-center status and never propagated past the upstream client
#[derive(Error,Debug,Clone,PartialEq)]
pub enum UpstreamError {

    #[error("Upstream request failed: {0}")]
    Transport(String),

    #[error("Upstream HTTP {0}")]
    Http(u16),

    #[error("Invalid upstream JSON")]
    Protocol(String),
}

macro_rules! config_error {
    ($fmt:literal $(, $arg:expr )* ) => {
        AtcAdsbError::ConfigError( format!( $fmt $(, $arg)* ))
    };
}
pub (crate) use config_error;
