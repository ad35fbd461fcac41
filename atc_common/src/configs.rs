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

//! RON config file lookup and loading.
//!
//! Config files are looked up in the following order:
//!   1. `$ATC_HOME/configs/<crate>/<filename>`
//!   2. `./configs/<crate>/<filename>` (relative to the current working dir)
//!   3. `~/.atc/configs/<crate>/<filename>`
//!
//! Binaries can bypass the lookup by passing an explicit path to [load_config_file].

use std::{env, path::{Path,PathBuf}};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::errors::{config_error, Result};
use crate::fs::filepath_contents;

pub const CONFIG_DIR: &str = "configs";

pub fn find_config_file (resource_crate: &str, filename: &str)->Option<PathBuf> {
    let mut candidates: Vec<PathBuf> = Vec::with_capacity(3);

    if let Ok(atc_home) = env::var("ATC_HOME") {
        candidates.push( Path::new( atc_home.as_str()).join(CONFIG_DIR).join(resource_crate).join(filename));
    }
    if let Ok(cwd) = env::current_dir() {
        candidates.push( cwd.join(CONFIG_DIR).join(resource_crate).join(filename));
    }
    if let Ok(usr_home) = env::var("HOME") {
        candidates.push( Path::new( usr_home.as_str()).join(".atc").join(CONFIG_DIR).join(resource_crate).join(filename));
    }

    candidates.into_iter().find( |p| p.is_file())
}

pub fn load_config_file<C> (path: impl AsRef<Path>) -> Result<C> where C: DeserializeOwned {
    let path = path.as_ref();
    debug!("loading config {:?}", path);
    let data = filepath_contents( &path)?;
    Ok( ron::de::from_bytes( data.as_slice())? )
}

/// load config using the lookup mechanism described above
pub fn load_config<C> (resource_crate: &str, filename: &str) -> Result<C> where C: DeserializeOwned {
    match find_config_file( resource_crate, filename) {
        Some(path) => load_config_file( path),
        None => Err( config_error( format!("config file {filename} for {resource_crate} not found")))
    }
}

/// syntactic sugar to define a crate local `load_config(filename)` function that uses the crate name for lookup
#[macro_export]
macro_rules! define_load_config {
    () => {
        pub fn load_config<C> (filename: &str) -> $crate::Result<C> where C: serde::de::DeserializeOwned {
            $crate::configs::load_config( env!("CARGO_PKG_NAME"), filename)
        }
    }
}
