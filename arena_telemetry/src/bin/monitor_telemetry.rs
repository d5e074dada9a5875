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

use std::path::PathBuf;
use tokio;
use anyhow::Result;
use clap::Parser;
use lazy_static::lazy_static;
use tracing_subscriber::EnvFilter;
use arena_telemetry::{
    load_config, AgentStatus, DetectionEvent, MulticastReceiver, TelemetryConfig, TelemetryRegistry, TerminationEvent, UpdateObserver
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = "monitor arena agent telemetry received over UDP multicast")]
pub struct Args {
    /// RON file with telemetry channel config (defaults are used if not set)
    #[arg(short,long)]
    pub config: Option<PathBuf>,

    /// network interface name or IPv4 address to join the multicast group on
    #[arg(short,long)]
    pub interface: Option<String>,

    /// UDP port of the multicast group
    #[arg(short,long)]
    pub port: Option<u16>,

    /// only print the final snapshot
    #[arg(short,long)]
    pub quiet: bool,
}

lazy_static! {
    static ref ARGS: Args = Args::parse();
}

struct PrintObserver;

impl UpdateObserver for PrintObserver {
    fn on_update (&self, status: &AgentStatus) {
        println!("{status}");
    }

    fn on_termination (&self, event: &TerminationEvent) {
        println!("{} terminated.", event.id);
    }

    fn on_detection (&self, event: &DetectionEvent) {
        println!("{} detected by radar.", event.id);
    }
}

#[tokio::main]
async fn main()->Result<()> {
    tracing_subscriber::fmt().with_env_filter( EnvFilter::from_default_env()).init();

    let mut config: TelemetryConfig = match &ARGS.config {
        Some(path) => load_config( path)?,
        None => TelemetryConfig::default()
    };
    if let Some(interface) = &ARGS.interface { config = config.with_interface( Some(interface.clone())) }
    if let Some(port) = ARGS.port { config = config.with_port( port) }

    let registry = TelemetryRegistry::new();
    let mut receiver = MulticastReceiver::new( config, &registry)?;
    if !ARGS.quiet {
        receiver.add_observer( PrintObserver)?;
    }
    receiver.initialize()?;

    println!("monitoring {}:{} - terminate with ctrl-c", receiver.config().group, receiver.config().port);
    tokio::signal::ctrl_c().await?;
    receiver.close()?;

    println!("------------------ last update: {:?}", registry.last_update());
    let mut agents = registry.list_all();
    agents.sort_by( |a,b| a.id.cmp( &b.id));
    for status in &agents {
        println!("{status}");
    }
    println!("{}", receiver.stats());

    Ok(())
}
