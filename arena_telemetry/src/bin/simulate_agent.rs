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

use std::{f64::consts::PI, net::SocketAddr, path::PathBuf, time::Duration};
use tokio::{self, time::interval};
use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use arena_telemetry::{load_config, AgentCategory, AgentStatus, TelemetryConfig, TelemetrySender};

#[derive(Parser, Debug)]
#[command(version, about, long_about = "publish telemetry for a simulated agent moving on a circle")]
pub struct Args {
    /// RON file with telemetry channel config (defaults are used if not set)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// send unicast to this address instead of the multicast group
    #[arg(long)]
    pub target: Option<SocketAddr>,

    /// numeric category code (0: unknown .. 6: enemy fighter)
    #[arg(short,long, default_value_t = 5)]
    pub category: i32,

    #[arg(short,long, default_value_t = 200)]
    pub interval_ms: u64,

    /// number of status messages to send (unlimited if not set)
    #[arg(short='n',long)]
    pub count: Option<u64>,

    /// send a termination message after the last status
    #[arg(short,long)]
    pub terminate: bool,

    /// radius of the circle in mm
    #[arg(short,long, default_value_t = 1000)]
    pub radius: i32,

    /// agent id (up to 32 bytes)
    pub id: String,
}

const CENTER: (i32,i32) = (2000, 2000);
const STEPS_PER_ROUND: u64 = 72;

/// position, heading (deg) and velocity (mm/s) at step `i`
fn circle_pos (i: u64, radius: i32, dt: Duration)->(i32,i32,i32,i32) {
    let a = 2.0 * PI * (i % STEPS_PER_ROUND) as f64 / STEPS_PER_ROUND as f64;
    let r = radius as f64;
    let x = CENTER.0 + (r * a.cos()).round() as i32;
    let y = CENTER.1 + (r * a.sin()).round() as i32;
    let hdg = ((a.to_degrees() + 90.0) % 360.0).round() as i32; // tangent, counter-clockwise
    let vel = (2.0 * PI * r / (STEPS_PER_ROUND as f64 * dt.as_secs_f64().max(0.001))).round() as i32;
    (x, y, hdg, vel)
}

#[tokio::main]
async fn main()->Result<()> {
    tracing_subscriber::fmt().with_env_filter( EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let sender = match args.target {
        Some(addr) => TelemetrySender::with_target( addr)?,
        None => {
            let config: TelemetryConfig = match &args.config {
                Some(path) => load_config( path)?,
                None => TelemetryConfig::default()
            };
            TelemetrySender::new( &config)?
        }
    };
    info!("simulating {} -> {}", args.id, sender.target());

    let dt = Duration::from_millis( args.interval_ms.max(1));
    let mut ticker = interval( dt);
    let mut i = 0;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        if let Some(n) = args.count { if i >= n { break } }
        tokio::select! {
            _ = &mut ctrl_c => break,
            _ = ticker.tick() => {}
        }

        let (x,y,hdg,vel) = circle_pos( i, args.radius, dt);
        let mut status = AgentStatus::new( &args.id, x, y, hdg, vel, AgentCategory::Unknown);
        status.category_code = args.category; // send as given, even if out of range
        sender.send_status( &status)?;
        println!("{status}");
        i += 1;
    }

    if args.terminate {
        sender.send_termination( &args.id)?;
        println!("{} terminated.", args.id);
    }
    Ok(())
}
