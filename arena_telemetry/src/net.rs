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

//! socket setup for the multicast telemetry channel

use std::{ffi::CString, io, net::{Ipv4Addr,SocketAddrV4,UdpSocket}};
use socket2::{Domain, InterfaceIndexOrAddress, Protocol, SockRef, Socket, Type};
use tracing::debug;
use crate::{config::TelemetryConfig, errors::{ArenaTelemetryError,Result}};

/// what we need to remember to leave the group again
#[derive(Debug)]
pub struct MulticastMembership {
    pub group: Ipv4Addr,
    pub interface: InterfaceIndexOrAddress,
}

/// map an interface argument to what the multicast socket options need. Accepts either
/// an IPv4 address literal or an interface name such as "wlan0"
pub fn resolve_interface (iface: &str)->Result<InterfaceIndexOrAddress> {
    if let Ok(addr) = iface.parse::<Ipv4Addr>() {
        return Ok( InterfaceIndexOrAddress::Address(addr))
    }

    let name = CString::new( iface).map_err( |_| ArenaTelemetryError::InterfaceError( iface.to_string()))?;
    let index = unsafe { libc::if_nametoindex( name.as_ptr()) };
    if index == 0 {
        Err( ArenaTelemetryError::InterfaceError( iface.to_string()))
    } else {
        Ok( InterfaceIndexOrAddress::Index(index))
    }
}

fn configured_interface (config: &TelemetryConfig)->Result<InterfaceIndexOrAddress> {
    match &config.interface {
        Some(iface) => resolve_interface( iface),
        None => Ok( InterfaceIndexOrAddress::Address( Ipv4Addr::UNSPECIFIED))
    }
}

/// bind to the configured port on all addresses and join the configured group.
/// The returned socket has the configured poll interval as read timeout
pub fn open_multicast_socket (config: &TelemetryConfig)->Result<(UdpSocket,MulticastMembership)> {
    let interface = configured_interface( config)?;

    let socket = Socket::new( Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address( true)?; // more than one monitor on the same host

    #[cfg(all(unix, not(any(target_os = "solaris", target_os = "illumos"))))]
    socket.set_reuse_port( true)?;

    let addr = SocketAddrV4::new( Ipv4Addr::UNSPECIFIED, config.port);
    socket.bind( &addr.into())?;
    socket.join_multicast_v4_n( &config.group, &interface)?;
    socket.set_read_timeout( Some( config.effective_poll_interval()))?;

    debug!("joined multicast group {}:{} on {:?}", config.group, config.port, interface);
    Ok( (socket.into(), MulticastMembership{ group: config.group, interface }) )
}

pub fn leave_multicast_group (socket: &UdpSocket, membership: &MulticastMembership)->io::Result<()> {
    SockRef::from( socket).leave_multicast_v4_n( &membership.group, &membership.interface)
}

/// unblock a pending `recv_from` on another thread. Unconnected UDP sockets report ENOTCONN
/// on Linux even though the shutdown takes effect, so we only log errors
pub fn shutdown_socket (socket: &UdpSocket) {
    if let Err(e) = SockRef::from( socket).shutdown( std::net::Shutdown::Both) {
        debug!("socket shutdown: {}", e);
    }
}

/// an unbound-port sender socket for multicast output. TTL is 1 (local network only)
pub fn open_sender_socket (config: &TelemetryConfig)->Result<UdpSocket> {
    let socket = Socket::new( Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_multicast_ttl_v4( 1)?;
    socket.set_multicast_loop_v4( true)?;

    if let Some(iface) = &config.interface {
        match resolve_interface( iface)? {
            InterfaceIndexOrAddress::Address(addr) => socket.set_multicast_if_v4( &addr)?,
            InterfaceIndexOrAddress::Index(idx) => set_multicast_if_index( &socket, idx)?,
        }
        debug!("multicast output on interface {}", iface);
    }

    socket.bind( &SocketAddrV4::new( Ipv4Addr::UNSPECIFIED, 0).into())?;
    Ok( socket.into())
}

/// select the outgoing multicast interface by index (IP_MULTICAST_IF with `ip_mreqn`)
#[cfg(any(target_os = "linux", target_os = "android"))]
fn set_multicast_if_index (socket: &Socket, index: u32)->io::Result<()> {
    use std::os::fd::AsRawFd;

    let mreqn = libc::ip_mreqn {
        imr_multiaddr: libc::in_addr { s_addr: 0 },
        imr_address: libc::in_addr { s_addr: 0 },
        imr_ifindex: index as libc::c_int,
    };
    let res = unsafe {
        libc::setsockopt( socket.as_raw_fd(), libc::IPPROTO_IP, libc::IP_MULTICAST_IF,
                          &mreqn as *const libc::ip_mreqn as *const libc::c_void,
                          std::mem::size_of::<libc::ip_mreqn>() as libc::socklen_t)
    };
    if res == 0 { Ok(()) } else { Err( io::Error::last_os_error()) }
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
fn set_multicast_if_index (socket: &Socket, index: u32)->io::Result<()> {
    Err( io::Error::new( io::ErrorKind::Unsupported, "interface names not supported for multicast output, use an IPv4 address"))
}
