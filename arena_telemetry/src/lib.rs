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

//! ingestion of arena agent telemetry that is broadcast by robots over UDP multicast.
//! Datagrams are decoded by [`wire`], the latest status per agent is kept in a [`registry::TelemetryRegistry`]
//! and a [`receiver::MulticastReceiver`] ties socket input, registry updates and [`observer::UpdateObserver`]
//! notifications together.

use std::fmt;
use serde::{Serialize,Deserialize};

pub mod errors;
use errors::{ArenaTelemetryError,Result};

pub mod wire;
pub mod config;
pub use config::{TelemetryConfig,load_config};

pub mod registry;
pub use registry::{TelemetryRegistry,RegistryWriter};

pub mod observer;
pub use observer::UpdateObserver;

pub mod net;
pub mod receiver;
pub use receiver::{MulticastReceiver,ReceiverState};

pub mod sender;
pub use sender::TelemetrySender;

/// agent roles as reported by robots. The numeric codes are fixed by the wire protocol
#[derive(Debug,Clone,Copy,PartialEq,Eq,Hash,Serialize,Deserialize)]
#[repr(i32)]
pub enum AgentCategory {
    Unknown = 0,
    SurveillanceBomber = 1,
    Surveillance = 2,
    Bomber = 3,
    Jammer = 4,
    FighterFriendly = 5,
    FighterEnemy = 6,
}

impl AgentCategory {
    /// codes outside of the defined range map to `Unknown`
    pub fn from_code (code: i32)->Self {
        match code {
            1 => AgentCategory::SurveillanceBomber,
            2 => AgentCategory::Surveillance,
            3 => AgentCategory::Bomber,
            4 => AgentCategory::Jammer,
            5 => AgentCategory::FighterFriendly,
            6 => AgentCategory::FighterEnemy,
            _ => AgentCategory::Unknown
        }
    }

    pub fn code (self)->i32 { self as i32 }

    /// the text consumers (e.g. displays) show for this category
    pub fn label (self)->&'static str {
        match self {
            AgentCategory::Unknown => "UNKNOWN",
            AgentCategory::SurveillanceBomber => "SURVEILLANCE BOMBER",
            AgentCategory::Surveillance => "SURVEILLANCE",
            AgentCategory::Bomber => "BOMBER",
            AgentCategory::Jammer => "JAMMER",
            AgentCategory::FighterFriendly => "FIGHTER",
            AgentCategory::FighterEnemy => "ENEMY FIGHTER",
        }
    }
}

impl fmt::Display for AgentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str( self.label())
    }
}

/// the latest known state of a tracked agent.
/// Positions are in millimeters. The category code is kept verbatim as received, use
/// [`AgentStatus::category`] to get the typed value
#[derive(Debug,Clone,PartialEq,Eq,Serialize,Deserialize)]
pub struct AgentStatus {
    pub id: String,
    pub position_x: i32,
    pub position_y: i32,
    pub heading: i32,
    pub velocity: i32,
    pub category_code: i32,
}

impl AgentStatus {
    pub fn new (id: impl ToString, position_x: i32, position_y: i32, heading: i32, velocity: i32, category: AgentCategory)->Self {
        AgentStatus { id: id.to_string(), position_x, position_y, heading, velocity, category_code: category.code() }
    }

    pub fn category (&self)->AgentCategory { AgentCategory::from_code( self.category_code) }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!( f, "AgentStatus( id: \"{}\", pos: [{},{}], hdg: {}, vel: {}, category: {} )",
                self.id, self.position_x, self.position_y, self.heading, self.velocity, self.category())
    }
}

/// reported when an agent was taken out. Observational only, it does not change the registry
#[derive(Debug,Clone,PartialEq,Eq,Serialize,Deserialize)]
pub struct TerminationEvent {
    pub id: String
}

/// reported when an agent entered a radar zone. Observational only
#[derive(Debug,Clone,PartialEq,Eq,Serialize,Deserialize)]
pub struct DetectionEvent {
    pub id: String
}

/// the decoded payload of a telemetry datagram
#[derive(Debug,Clone,PartialEq,Eq)]
pub enum TelemetryMsg {
    Status(AgentStatus),
    Termination(TerminationEvent),
    Detection(DetectionEvent),
}

impl TelemetryMsg {
    pub fn id (&self)->&str {
        match self {
            TelemetryMsg::Status(status) => status.id.as_str(),
            TelemetryMsg::Termination(event) => event.id.as_str(),
            TelemetryMsg::Detection(event) => event.id.as_str(),
        }
    }

    /// the wire tag for this message kind
    pub fn tag (&self)->u8 {
        match self {
            TelemetryMsg::Status(_) => wire::MSG_TYPE_STATUS,
            TelemetryMsg::Termination(_) => wire::MSG_TYPE_TERMINATION,
            TelemetryMsg::Detection(_) => wire::MSG_TYPE_DETECTION,
        }
    }
}

impl fmt::Display for TelemetryMsg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryMsg::Status(status) => write!( f, "{status}"),
            TelemetryMsg::Termination(event) => write!( f, "Termination( id: \"{}\" )", event.id),
            TelemetryMsg::Detection(event) => write!( f, "Detection( id: \"{}\" )", event.id),
        }
    }
}
