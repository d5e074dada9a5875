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

use std::time::Duration;
use anyhow::Result;
use tracing_subscriber::EnvFilter;
use arena_telemetry::{load_config, MulticastReceiver, TelemetryRegistry};

/// periodically print what the registry knows, without registering any observer
#[tokio::main]
async fn main()->Result<()> {
    tracing_subscriber::fmt().with_env_filter( EnvFilter::from_default_env()).init();

    let registry = TelemetryRegistry::new();
    let mut receiver = MulticastReceiver::new( load_config("configs/telemetry.ron")?, &registry)?;
    receiver.initialize()?;

    let mut ticker = tokio::time::interval( Duration::from_secs(1));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            _ = ticker.tick() => {
                println!("------------------ {:?} ({} updates)", registry.last_update(), registry.update_count());
                for status in registry.list_all() {
                    println!("{status}");
                }
            }
        }
    }

    receiver.close()?;
    Ok(())
}
