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

use std::{fs, net::Ipv4Addr, path::Path, time::Duration};
use serde::{Serialize,Deserialize};
use crate::errors::Result;

pub const DEFAULT_GROUP: Ipv4Addr = Ipv4Addr::new( 225, 0, 0, 37);
pub const DEFAULT_PORT: u16 = 1500;
pub const DEFAULT_INTERFACE: &str = "wlan0";
pub const DEFAULT_RECV_BUFFER_SIZE: usize = 1024;
pub const DEFAULT_NOTIFY_QUEUE_BOUND: usize = 64;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// network parameters of the telemetry channel. Defaults are the values robots use
#[derive(Deserialize,Serialize,Debug,Clone,PartialEq)]
#[serde(default)]
pub struct TelemetryConfig {
    pub group: Ipv4Addr,              // multicast group to join
    pub port: u16,                    // UDP port of the group
    pub interface: Option<String>,    // interface name (e.g. "wlan0") or IPv4 address. None: let the OS pick
    pub recv_buffer_size: usize,      // max datagram size we read (longer ones get cut)
    pub notify_queue_bound: usize,    // pending observer notifications before we drop the oldest
    pub poll_interval: Duration,      // receive timeout used to check if we got closed
}

impl Default for TelemetryConfig {
    fn default()->Self {
        TelemetryConfig {
            group: DEFAULT_GROUP,
            port: DEFAULT_PORT,
            interface: Some( DEFAULT_INTERFACE.to_string()),
            recv_buffer_size: DEFAULT_RECV_BUFFER_SIZE,
            notify_queue_bound: DEFAULT_NOTIFY_QUEUE_BOUND,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl TelemetryConfig {
    pub fn with_interface (mut self, interface: Option<String>)->Self {
        self.interface = interface;
        self
    }

    pub fn with_port (mut self, port: u16)->Self {
        self.port = port;
        self
    }

    /// zero durations are not valid socket timeouts
    pub fn effective_poll_interval (&self)->Duration {
        if self.poll_interval.is_zero() { DEFAULT_POLL_INTERVAL } else { self.poll_interval }
    }
}

/// load a RON serialized [`TelemetryConfig`]. Fields missing in the file keep their defaults
pub fn load_config<P: AsRef<Path>> (path: P)->Result<TelemetryConfig> {
    let data = fs::read( path.as_ref())?;
    Ok( ron::de::from_bytes( data.as_slice())? )
}

pub fn parse_config (s: &str)->Result<TelemetryConfig> {
    Ok( ron::from_str( s)? )
}
