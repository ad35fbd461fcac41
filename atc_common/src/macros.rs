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

/// create a `std::io::Error` from a kind and a format string:
/// ```ignore
/// let e = io_error!( ErrorKind::NotFound, "no config file {}", filename);
/// ```
#[macro_export]
macro_rules! io_error {
    ( $kind:expr, $fmt:literal $(, $($arg:expr),* )? ) =>
    {
        std::io::Error::new( $kind, format!($fmt, $( $($arg),* )?).as_str())
    }
}
pub use io_error;

/// return the value of an `Option` or early return the provided expression:
/// ```ignore
/// let entry = some_or_return!( cache.get(name), None);
/// ```
#[macro_export]
macro_rules! some_or_return {
    ( $opt:expr, $ret:expr ) => {
        match $opt {
            Some(v) => v,
            None => return $ret
        }
    }
}
pub use some_or_return;
