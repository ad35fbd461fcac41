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

use std::{collections::HashMap, time::Duration};
use serde::{Serialize,Deserialize};
use atc_common::{
    round_to,
    datetime::{EpochMillis, deserialize_duration, millis, secs},
    fs::{write_json_atomic, read_json_if_exists, file_slug, ensure_writable_dir, count_files_with_extension},
    geo::{LatLon, haversine_distance_nm},
    configs::load_config_file
};

// run with "cargo test -p atc_common -- --nocapture"

#[test]
fn test_round_to () {
    assert_eq!( round_to( 32.12345, 3), 32.123);
    assert_eq!( round_to( -116.12351, 3), -116.124);
    let x = round_to( 19.0004999, 3);
    assert_eq!( round_to( x, 3), x);
}

#[test]
fn test_epoch_millis () {
    let t0 = EpochMillis::new( 1_700_000_000_000);
    let t1 = t0.plus( millis(1500));
    println!("t0 = {t0}, t1 = {t1}");

    assert_eq!( t0.age_at(t1), 1500);
    assert_eq!( t1.age_at(t0), 0); // never negative
    assert_eq!( t1.minus( millis(1500)), t0);
    assert_eq!( t0.to_rfc3339(), "2023-11-14T22:13:20Z");
    assert!( t0 < t1);
}

#[derive(Deserialize,Debug)]
struct DurConfig {
    #[serde(deserialize_with="deserialize_duration")]
    spacing: Duration,
    #[serde(deserialize_with="deserialize_duration")]
    ttl: Duration,
}

#[test]
fn test_duration_config () {
    let conf: DurConfig = ron::from_str( r#"( spacing: "1100ms", ttl: "90s" )"#).unwrap();
    println!("{conf:?}");
    assert_eq!( conf.spacing, millis(1100));
    assert_eq!( conf.ttl, secs(90));
}

#[derive(Serialize,Deserialize,Debug,PartialEq)]
struct Entry { name: String, values: Vec<i64> }

#[test]
fn test_atomic_json () {
    let dir = std::env::temp_dir().join( format!("atc_common_test_{}", std::process::id()));
    ensure_writable_dir( &dir).unwrap();
    let path = dir.join("entry.json");

    let missing: Option<Entry> = read_json_if_exists( dir.join("missing.json")).unwrap();
    assert!( missing.is_none());

    let e = Entry { name: "north".to_string(), values: vec![1,2,3] };
    write_json_atomic( &path, &e).unwrap();
    let e1: Option<Entry> = read_json_if_exists( &path).unwrap();
    assert_eq!( e1, Some(e));
    assert_eq!( count_files_with_extension( &dir, "json"), 1);

    // overwrite in place
    let e = Entry { name: "south".to_string(), values: vec![] };
    write_json_atomic( &path, &e).unwrap();
    let e2: Option<Entry> = read_json_if_exists( &path).unwrap();
    assert_eq!( e2, Some(e));
    assert_eq!( std::fs::read_dir( &dir).unwrap().count(), 1); // no temp files left behind

    // missing target dir is an error, not a panic
    assert!( write_json_atomic( dir.join("nodir").join("x.json"), &e2).is_err());

    std::fs::remove_dir_all( &dir).unwrap();
}

#[test]
fn test_file_slug () {
    assert_eq!( file_slug("Mexico City"), "mexico_city");
    assert_eq!( file_slug(" MMTJ/North "), "mmtj_north");
    assert_eq!( file_slug(""), "default");
}

#[test]
fn test_distance () {
    // one minute of arc along a meridian is (about) one nautical mile
    let d = haversine_distance_nm( 32.0, -117.0, 32.0 + 1.0/60.0, -117.0);
    println!("1' of latitude = {d} nm");
    assert!( (d - 1.0).abs() < 0.01);

    let mex = LatLon::new( 19.4361, -99.0719);
    let tij = LatLon::new( 32.5411, -116.9700);
    let d = mex.distance_nm( &tij);
    println!("MMMX - MMTJ = {d} nm");
    assert!( d > 1230.0 && d < 1250.0);
    assert!( (d - haversine_distance_nm( 19.4361, -99.0719, 32.5411, -116.9700)).abs() < 1e-9);
    assert!( (d - tij.distance_nm( &mex)).abs() < 1e-9);
    assert_eq!( mex.distance_nm( &mex), 0.0);
}

#[derive(Deserialize,Debug)]
struct TestConfig { name: String, center: LatLon }

#[test]
fn test_load_config_file () {
    let dir = std::env::temp_dir().join( format!("atc_common_cfg_{}", std::process::id()));
    ensure_writable_dir( &dir).unwrap();
    let path = dir.join("test.ron");
    std::fs::write( &path, r#"( name: "tij", center: ( lat: 32.5, lon: -117.0 ) )"#).unwrap();

    let conf: TestConfig = load_config_file( &path).unwrap();
    println!("{conf:?}");
    assert_eq!( conf.name, "tij");
    assert_eq!( conf.center, LatLon::new( 32.5, -117.0));

    std::fs::remove_dir_all( &dir).unwrap();
}
