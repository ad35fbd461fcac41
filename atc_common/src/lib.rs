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

pub mod macros;
pub mod errors;
pub mod datetime;
pub mod fs;
pub mod geo;
pub mod configs;

pub use errors::{AtcCommonError,Result};

/// round `value` to `decimals` fractional digits (half away from zero)
#[inline]
pub fn round_to (value: f64, decimals: u32)->f64 {
    let factor = 10f64.powi( decimals as i32);
    (value * factor).round() / factor
}
