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

use std::{
    panic::{self,AssertUnwindSafe},
    sync::{Arc, RwLock, atomic::{AtomicU64,Ordering}},
    thread::{self,JoinHandle}
};
use kanal::{Sender,Receiver};
use tracing::{debug,error};
use crate::{AgentStatus, TerminationEvent, DetectionEvent, errors::Result};

/// the capability external consumers (renderers, loggers, ..) implement to get told about agent updates.
/// Callbacks are executed on the dispatcher thread of a receiver, not on the receive loop, and they
/// should return quickly since pending notifications get dropped once the queue is full
pub trait UpdateObserver: Send + Sync {
    fn on_update (&self, status: &AgentStatus);

    fn on_termination (&self, event: &TerminationEvent) {}

    fn on_detection (&self, event: &DetectionEvent) {}
}

impl<F> UpdateObserver for F where F: Fn(&AgentStatus) + Send + Sync {
    fn on_update (&self, status: &AgentStatus) { self(status) }
}

#[derive(Debug,Clone,PartialEq,Eq)]
pub enum Notification {
    Update(AgentStatus),
    Termination(TerminationEvent),
    Detection(DetectionEvent),
}

/// observers in registration order
#[derive(Clone,Default)]
pub struct ObserverList {
    observers: Arc<RwLock<Vec<Arc<dyn UpdateObserver>>>>
}

impl ObserverList {
    pub fn new ()->Self { Self::default() }

    pub fn add (&self, observer: Arc<dyn UpdateObserver>) {
        let mut list = self.observers.write().unwrap_or_else( |e| e.into_inner());
        list.push( observer);
    }

    pub fn len (&self)->usize {
        self.observers.read().unwrap_or_else( |e| e.into_inner()).len()
    }

    pub fn is_empty (&self)->bool { self.len() == 0 }

    /// call all observers in the order they were added. A panicking observer does not keep
    /// the others from being notified
    pub fn notify (&self, notification: &Notification) {
        let list = self.observers.read().unwrap_or_else( |e| e.into_inner()).clone(); // don't hold the lock during callbacks

        for (i,observer) in list.iter().enumerate() {
            let res = panic::catch_unwind( AssertUnwindSafe( || {
                match notification {
                    Notification::Update(status) => observer.on_update( status),
                    Notification::Termination(event) => observer.on_termination( event),
                    Notification::Detection(event) => observer.on_detection( event),
                }
            }));
            if res.is_err() {
                error!("observer {} panicked processing {:?}", i, notification);
            }
        }
    }
}

#[derive(Debug,Clone)]
enum QueueItem {
    Notify(Notification),
    Stop
}

/// create a bounded notification queue that drops the oldest pending entry if it is full.
/// The producer side is used by the receive loop, the consumer side by the dispatcher
pub fn notification_queue (bound: usize)->(NotificationQueue,NotificationStream) {
    let (tx,rx) = kanal::bounded::<QueueItem>( bound.max(1));
    let dropped = Arc::new( AtomicU64::new(0));
    ( NotificationQueue{ tx, evict: rx.clone(), dropped }, NotificationStream{ rx } )
}

pub struct NotificationQueue {
    tx: Sender<QueueItem>,
    evict: Receiver<QueueItem>, // to make room if we are full
    dropped: Arc<AtomicU64>,
}

impl NotificationQueue {
    /// never blocks. If the queue is full we discard the oldest pending notification
    pub fn push (&self, notification: Notification) {
        let item = QueueItem::Notify( notification);

        for _ in 0..2 {
            match self.tx.try_send( item.clone()) {
                Ok(true) => return,
                Ok(false) => { // full
                    if let Ok(Some(_)) = self.evict.try_recv() {
                        self.dropped.fetch_add( 1, Ordering::Relaxed);
                    }
                }
                Err(_) => return // consumer is gone
            }
        }

        // consumer drained concurrently and the queue filled again - drop what we have
        self.dropped.fetch_add( 1, Ordering::Relaxed);
    }

    /// number of notifications that were discarded because the queue was full
    pub fn dropped (&self)->u64 { self.dropped.load( Ordering::Relaxed) }

    pub fn dropped_counter (&self)->Arc<AtomicU64> { self.dropped.clone() }

    /// tell the consumer to terminate once it has processed all pending notifications.
    /// This waits for a free slot
    pub fn stop (&self) {
        if self.tx.send( QueueItem::Stop).is_err() {
            debug!("notification consumer already terminated");
        }
    }
}

pub struct NotificationStream {
    rx: Receiver<QueueItem>
}

impl NotificationStream {
    /// blocks until the next notification. None if the queue was stopped or the producer is gone
    pub fn recv (&self)->Option<Notification> {
        match self.rx.recv() {
            Ok(QueueItem::Notify(n)) => Some(n),
            Ok(QueueItem::Stop) | Err(_) => None
        }
    }

    /// None if there is nothing pending right now (or the queue was stopped)
    pub fn try_recv (&self)->Option<Notification> {
        match self.rx.try_recv() {
            Ok(Some(QueueItem::Notify(n))) => Some(n),
            _ => None
        }
    }
}

/// run the observer callbacks on their own thread so that slow observers cannot stall the receive loop
pub fn spawn_dispatcher (stream: NotificationStream, observers: ObserverList)->Result<JoinHandle<()>> {
    let handle = thread::Builder::new()
        .name( "telemetry-dispatch".into())
        .spawn( move || {
            while let Some(notification) = stream.recv() {
                observers.notify( &notification);
            }
            debug!("notification dispatcher terminated");
        })?;
    Ok(handle)
}
