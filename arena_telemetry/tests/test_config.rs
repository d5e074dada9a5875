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

use std::{net::Ipv4Addr, time::Duration};
use arena_telemetry::{config::{self, parse_config}, load_config, TelemetryConfig, errors::ArenaTelemetryError};

#[test]
fn test_load_default_config () {
    let config = load_config( "configs/telemetry.ron").unwrap();
    println!("{config:?}");
    assert_eq!( config, TelemetryConfig::default());
    assert_eq!( config.group, Ipv4Addr::new( 225, 0, 0, 37));
    assert_eq!( config.port, 1500);
    assert_eq!( config.interface.as_deref(), Some("wlan0"));
}

#[test]
fn test_partial_config () {
    let config = parse_config( r#"( port: 1501, interface: None, poll_interval: (secs: 0, nanos: 0) )"#).unwrap();
    assert_eq!( config.port, 1501);
    assert_eq!( config.interface, None);
    assert_eq!( config.group, config::DEFAULT_GROUP);
    assert_eq!( config.recv_buffer_size, config::DEFAULT_RECV_BUFFER_SIZE);
    assert_eq!( config.effective_poll_interval(), config::DEFAULT_POLL_INTERVAL);

    let config = parse_config( r#"( interface: Some("127.0.0.1"), poll_interval: (secs: 1, nanos: 0) )"#).unwrap();
    assert_eq!( config.effective_poll_interval(), Duration::from_secs(1));
}

#[test]
fn test_bad_config () {
    assert!( matches!( parse_config( "( port: \"x\" )"), Err(ArenaTelemetryError::ConfigError(_))));
    assert!( matches!( load_config( "configs/no_such_file.ron"), Err(ArenaTelemetryError::IOError(_))));
}
