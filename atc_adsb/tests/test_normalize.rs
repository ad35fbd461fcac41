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
use atc_adsb::{
    cache::{classify, is_expired, is_fresh, Freshness},
    dedup::{dedupe, dedupe_raw},
    normalize::{has_significant_geo_change, normalize_coordinate, should_replace_entry, ReplaceDecision, ReplacePolicy},
    reaper::{cleanup_stale_entries, cleanup_stale_records, is_stale},
    record::{AircraftRecord, PositionReport, RawRecord},
    upstream::{FetchOutcome, parse_upstream_body},
};

fn raw (hex: &str, lat: f64, lon: f64, alt: Option<f64>, seen_pos: Option<f64>)->RawRecord {
    RawRecord {
        hex: Some(hex.to_string()),
        lat: Some(lat),
        lon: Some(lon),
        alt_baro: alt,
        seen_pos,
        ..Default::default()
    }
}

fn rec (hex: &str, lat: f64, lon: f64, alt: Option<f64>, seen_pos: Option<f64>)->AircraftRecord {
    AircraftRecord::from_raw( &raw( hex, lat, lon, alt, seen_pos)).unwrap()
}

// run with "cargo test -p atc_adsb --test test_normalize -- --nocapture"

#[test]
fn test_normalize_coordinate () {
    assert_eq!( normalize_coordinate( 32.1234, 3), 32.123);
    assert_eq!( normalize_coordinate( 32.12346, 3), 32.123);
    assert_eq!( normalize_coordinate( -99.0001, 3), -99.0);
    assert_eq!( normalize_coordinate( 19.4326, 2), 19.43);

    for x in [0.0, 19.0001, -99.1332, 32.54, 123.456789, -0.0005, 89.99951] {
        for d in 0..6 {
            let n = normalize_coordinate( x, d);
            assert_eq!( normalize_coordinate( n, d), n, "rounding not idempotent for {x} at {d} decimals");
        }
    }
}

#[test]
fn test_replace_policy () {
    let existing = raw( "ABC123", 32.1234, -116.1234, Some(10000.0), Some(5.0));

    // older incoming report is never preferred
    let incoming = raw( "ABC123", 32.5678, -116.1234, Some(10000.0), Some(6.0));
    assert!( !should_replace_entry( &existing, &incoming, 100, 3));

    // fresher but within rounding and altitude threshold
    let incoming = raw( "ABC123", 32.12346, -116.1234, Some(10020.0), Some(2.0));
    assert!( !has_significant_geo_change( &existing, &incoming, 100, 3));
    assert!( !should_replace_entry( &existing, &incoming, 100, 3));

    // fresher and moved
    let incoming = raw( "ABC123", 32.5678, -116.1234, Some(10250.0), Some(2.0));
    assert!( should_replace_entry( &existing, &incoming, 100, 3));

    // equal seen_pos is not fresher
    let incoming = raw( "ABC123", 32.5678, -116.1234, Some(10250.0), Some(5.0));
    assert!( !should_replace_entry( &existing, &incoming, 100, 3));

    // altitude delta exactly at threshold counts
    let incoming = raw( "ABC123", 32.1234, -116.1234, Some(10100.0), Some(1.0));
    assert_eq!( ReplacePolicy::default().decide( &existing, &incoming), ReplaceDecision::Replace);
}

#[test]
fn test_missing_fields () {
    let existing = raw( "ABC123", 32.1234, -116.1234, None, Some(5.0));
    let incoming = raw( "ABC123", 32.1234, -116.1234, Some(20000.0), Some(1.0));
    assert!( !has_significant_geo_change( &existing, &incoming, 100, 3), "missing altitude must not count as change");

    // missing seen_pos on incoming is infinitely old
    let incoming = raw( "ABC123", 40.0, -100.0, Some(20000.0), None);
    assert!( !should_replace_entry( &existing, &incoming, 100, 3));

    // any numeric seen_pos beats a missing one
    let existing = raw( "ABC123", 32.1234, -116.1234, Some(10000.0), None);
    let incoming = raw( "ABC123", 40.0, -100.0, Some(10000.0), Some(250.0));
    assert!( should_replace_entry( &existing, &incoming, 100, 3));
}

#[test]
fn test_replace_monotonicity () {
    let reports = vec![
        raw( "ABC123", 19.0, -99.0, Some(1000.0), Some(5.0)),
        raw( "ABC123", 19.0001, -99.0001, Some(1000.0), Some(2.0)),
        raw( "ABC123", 19.0, -99.0, Some(1150.0), Some(2.0)),
        raw( "ABC123", 19.1, -99.2, Some(3000.0), Some(0.5)),
        raw( "ABC123", 19.1, -99.2, None, None),
        raw( "ABC123", 18.9, -98.9, Some(900.0), Some(7.5)),
    ];

    for a in &reports {
        for b in &reports {
            if should_replace_entry( a, b, 100, 3) {
                assert!( b.seen_pos.unwrap() < a.seen_pos.unwrap_or( f64::INFINITY));
            }
        }
    }
}

#[test]
fn test_dedupe_scenarios () {
    let policy = ReplacePolicy::default();

    // noise level change is ignored despite fresher report
    let list = dedupe_raw( &[
        raw( "ABC123", 19.000, -99.000, Some(1000.0), Some(5.0)),
        raw( "ABC123", 19.0001, -99.0001, Some(1000.0), Some(2.0)),
    ], &policy);
    assert_eq!( list.len(), 1);
    assert_eq!( list[0].seen_pos, Some(5.0));

    // altitude change of 150ft replaces
    let list = dedupe_raw( &[
        raw( "ABC123", 19.000, -99.000, Some(1000.0), Some(5.0)),
        raw( "ABC123", 19.0001, -99.0001, Some(1150.0), Some(2.0)),
    ], &policy);
    assert_eq!( list.len(), 1);
    assert_eq!( list[0].alt, Some(1150));
    assert_eq!( list[0].seen_pos, Some(2.0));

    // empty hex is dropped
    let list = dedupe_raw( &[
        raw( "", 19.0, -99.0, Some(1000.0), Some(1.0)),
        raw( "  ", 19.0, -99.0, Some(1000.0), Some(1.0)),
        raw( "A1B2C3", 19.0, -99.0, Some(1000.0), Some(1.0)),
    ], &policy);
    assert_eq!( list.len(), 1);
    assert_eq!( list[0].hex, "A1B2C3");
}

#[test]
fn test_extreme_altitudes () {
    let policy = ReplacePolicy::default();
    let body = br#"{"ac":[
        {"hex":"ABC123","lat":19.0,"lon":-99.0,"alt_baro":-1e19,"seen_pos":5},
        {"hex":"ABC123","lat":19.0,"lon":-99.0,"alt_baro":1e19,"seen_pos":2}
    ]}"#;
    let raw = match parse_upstream_body( body, 200) {
        FetchOutcome::Data { ac, .. } => ac,
        other => panic!("unexpected outcome {other:?}")
    };
    assert_eq!( raw.len(), 2);
    assert_eq!( raw[0].alt_ft(), None);
    assert_eq!( raw[1].alt_ft(), None);

    let list = dedupe_raw( &raw, &policy);
    assert_eq!( list.len(), 1);
    assert_eq!( list[0].alt, None);
    assert_eq!( list[0].seen_pos, Some(5.0)); // nothing changed, keep the first

    // implausible baro altitude falls back to geometric altitude
    let r = RawRecord { alt_baro: Some(250_000.0), alt_geom: Some(35_000.0), ..raw[0].clone() };
    assert_eq!( r.alt_ft(), Some(35_000));
    let r = RawRecord { alt_baro: Some(-1_200.0), ..raw[0].clone() };
    assert_eq!( r.alt_ft(), Some(-1_200));

    // full i64 range does not overflow the altitude delta
    let mut low = rec( "ABC123", 19.0, -99.0, None, Some(5.0));
    low.alt = Some(i64::MIN);
    let mut high = rec( "ABC123", 19.0, -99.0, None, Some(2.0));
    high.alt = Some(i64::MAX);
    assert!( has_significant_geo_change( &low, &high, 100, 3));
    assert!( should_replace_entry( &low, &high, 100, 3));
    assert!( !has_significant_geo_change( &high, &high, 100, 3));
}

#[test]
fn test_dedupe_order_and_idempotence () {
    let policy = ReplacePolicy::default();
    let input = vec![
        rec( "ccc333", 20.0, -100.0, Some(5000.0), Some(3.0)),
        rec( "AAA111", 19.0, -99.0, Some(1000.0), Some(5.0)),
        rec( "CCC333", 20.5, -100.5, Some(9000.0), Some(1.0)),
        rec( "BBB222", 21.0, -101.0, None, None),
        rec( " aaa111 ", 19.0, -99.0, Some(1000.0), Some(9.0)),
    ];

    let once = dedupe( input.clone(), &policy);
    let hexes: Vec<&str> = once.iter().map( |r| r.hex.as_str()).collect();
    println!("deduped: {hexes:?}");
    assert_eq!( hexes, vec!["CCC333", "AAA111", "BBB222"]);
    assert_eq!( once[0].lat, 20.5); // fresher and moved

    let twice = dedupe( once.clone(), &policy);
    assert_eq!( once, twice);
}

#[test]
fn test_reaper () {
    let mut by_hex: HashMap<String,AircraftRecord> = HashMap::new();
    by_hex.insert( "A".to_string(), rec( "A", 19.0, -99.0, None, Some(100.0)));
    by_hex.insert( "B".to_string(), rec( "B", 19.0, -99.0, None, Some(400.0)));
    by_hex.insert( "C".to_string(), rec( "C", 19.0, -99.0, None, None));

    let mut copy = by_hex.clone();
    assert_eq!( cleanup_stale_entries( &mut copy, 0.0), 0);
    assert_eq!( cleanup_stale_entries( &mut copy, -1.0), 0);
    assert_eq!( copy.len(), 3);

    assert_eq!( cleanup_stale_entries( &mut by_hex, 300.0), 2);
    assert!( by_hex.contains_key("A"));

    // boundary
    assert!( !is_stale( Some(300.0), 300.0));
    assert!( is_stale( Some(300.001), 300.0));
    assert!( is_stale( None, 300.0));

    let mut list = vec![ rec( "A", 19.0, -99.0, None, Some(300.0)), rec( "B", 19.0, -99.0, None, Some(301.0)) ];
    assert_eq!( cleanup_stale_records( &mut list, 300.0), 1);
    assert_eq!( list[0].hex, "A");
}

#[test]
fn test_staleness_boundary () {
    let max_stale = Duration::from_millis(8000);
    assert!( !is_expired( 8000, max_stale));
    assert!( is_expired( 8001, max_stale));

    let ttl = Duration::from_millis(2500);
    assert!( is_fresh( 2500, ttl));
    assert!( !is_fresh( 0, Duration::ZERO));

    assert_eq!( classify( 1000, ttl, max_stale), Freshness::Fresh);
    assert_eq!( classify( 4000, ttl, max_stale), Freshness::Stale);
    assert_eq!( classify( 9000, ttl, max_stale), Freshness::Expired);
}
