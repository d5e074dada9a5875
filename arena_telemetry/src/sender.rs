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

use std::net::{Ipv4Addr,Ipv6Addr,SocketAddr,SocketAddrV4,UdpSocket};
use tracing::{debug,trace};
use crate::{
    AgentStatus, TelemetryMsg,
    config::TelemetryConfig,
    errors::Result,
    net,
    wire
};

/// emits telemetry datagrams in the format robots use. This is what simulators and tests
/// use to feed a [`crate::MulticastReceiver`]
pub struct TelemetrySender {
    socket: UdpSocket,
    target: SocketAddr,
}

impl TelemetrySender {
    /// send to the configured multicast group and port (TTL 1)
    pub fn new (config: &TelemetryConfig)->Result<Self> {
        let socket = net::open_sender_socket( config)?;
        let target = SocketAddr::V4( SocketAddrV4::new( config.group, config.port));
        debug!("sending telemetry to {}", target);
        Ok( TelemetrySender { socket, target } )
    }

    /// send to a unicast address (e.g. a receiver bound to loopback)
    pub fn with_target (target: SocketAddr)->Result<Self> {
        let local: SocketAddr = if target.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind( local)?;
        Ok( TelemetrySender { socket, target } )
    }

    pub fn target (&self)->SocketAddr { self.target }

    pub fn send (&self, msg: &TelemetryMsg)->Result<usize> {
        let buf = wire::encode( msg)?;
        self.send_raw( &buf)
    }

    pub fn send_status (&self, status: &AgentStatus)->Result<usize> {
        let buf = wire::encode_status( status)?;
        self.send_raw( &buf)
    }

    pub fn send_termination (&self, id: &str)->Result<usize> {
        let buf = wire::encode_id_msg( wire::MSG_TYPE_TERMINATION, id)?;
        self.send_raw( &buf)
    }

    pub fn send_detection (&self, id: &str)->Result<usize> {
        let buf = wire::encode_id_msg( wire::MSG_TYPE_DETECTION, id)?;
        self.send_raw( &buf)
    }

    /// send bytes as they are, without any validation
    pub fn send_raw (&self, data: &[u8])->Result<usize> {
        let len = self.socket.send_to( data, self.target)?;
        trace!("sent {} bytes to {}", len, self.target);
        Ok(len)
    }
}
