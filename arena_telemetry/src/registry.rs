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

use std::sync::{Arc, atomic::{AtomicBool,AtomicI64,AtomicU64,Ordering}};
use chrono::{DateTime,Utc};
use dashmap::DashMap;
use crate::{AgentStatus, errors::{ArenaTelemetryError,Result}};

/// the latest status of each agent we have heard of.
///
/// This is a cheap to clone read handle - all clones share the same map. Entries are only written
/// through the single [`RegistryWriter`] of a registry (normally owned by the receive loop). Entries are
/// never removed.
/// Values are replaced as a whole under a shard lock, i.e. readers never see partially written status
#[derive(Clone)]
pub struct TelemetryRegistry {
    agents: Arc<DashMap<String,AgentStatus>>,
    last_update: Arc<AtomicI64>, // epoch millis of last upsert, 0 if none
    update_count: Arc<AtomicU64>,
    writer_taken: Arc<AtomicBool>,
}

impl TelemetryRegistry {
    pub fn new ()->Self {
        TelemetryRegistry {
            agents: Arc::new( DashMap::new()),
            last_update: Arc::new( AtomicI64::new(0)),
            update_count: Arc::new( AtomicU64::new(0)),
            writer_taken: Arc::new( AtomicBool::new(false)),
        }
    }

    /// hand out the only writer for this registry. Subsequent calls fail
    pub fn writer (&self)->Result<RegistryWriter> {
        if self.writer_taken.swap( true, Ordering::AcqRel) {
            Err( ArenaTelemetryError::WriterTakenError)
        } else {
            Ok( RegistryWriter{ registry: self.clone() } )
        }
    }

    pub fn get (&self, id: &str)->Option<AgentStatus> {
        self.agents.get( id).map( |e| e.value().clone())
    }

    /// snapshot of all entries (in no particular order). Updates that happen while we
    /// iterate may or may not be included
    pub fn list_all (&self)->Vec<AgentStatus> {
        self.agents.iter().map( |e| e.value().clone()).collect()
    }

    pub fn contains (&self, id: &str)->bool { self.agents.contains_key( id) }

    pub fn len (&self)->usize { self.agents.len() }

    pub fn is_empty (&self)->bool { self.agents.is_empty() }

    pub fn last_update (&self)->Option<DateTime<Utc>> {
        match self.last_update.load( Ordering::Relaxed) {
            0 => None,
            millis => DateTime::from_timestamp_millis( millis)
        }
    }

    pub fn update_count (&self)->u64 { self.update_count.load( Ordering::Relaxed) }
}

impl Default for TelemetryRegistry {
    fn default()->Self { Self::new() }
}

/// the write side of a [`TelemetryRegistry`]. Not clonable
pub struct RegistryWriter {
    registry: TelemetryRegistry
}

impl RegistryWriter {
    /// replace whatever we have for `status.id`. Returns the previous value
    pub fn upsert (&mut self, status: AgentStatus)->Option<AgentStatus> {
        let prev = self.registry.agents.insert( status.id.clone(), status);

        self.registry.last_update.store( Utc::now().timestamp_millis(), Ordering::Relaxed);
        self.registry.update_count.fetch_add( 1, Ordering::Relaxed);
        prev
    }

    pub fn registry (&self)->&TelemetryRegistry { &self.registry }
}
