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
    fmt, io,
    net::{SocketAddr,UdpSocket},
    sync::{Arc, Mutex, atomic::{AtomicBool,AtomicU64,Ordering}},
    thread::{self,JoinHandle},
    time::Duration
};
use tracing::{debug,info,warn,error};
use crate::{
    TelemetryMsg,
    config::TelemetryConfig,
    errors::{ArenaTelemetryError,Result,invalid_state},
    net::{self,MulticastMembership},
    observer::{self,Notification,NotificationQueue,ObserverList,UpdateObserver},
    registry::{RegistryWriter,TelemetryRegistry},
    wire
};

#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum ReceiverState {
    Uninitialized,
    Listening,
    Closed,
}

/// counters maintained by the receive loop
#[derive(Debug,Default)]
pub struct ReceiverStats {
    datagrams: AtomicU64,
    statuses: AtomicU64,
    terminations: AtomicU64,
    detections: AtomicU64,
    decode_errors: AtomicU64,
    io_errors: AtomicU64,
}

impl ReceiverStats {
    fn inc (counter: &AtomicU64) { counter.fetch_add( 1, Ordering::Relaxed); }
}

#[derive(Debug,Clone,Copy,Default,PartialEq,Eq)]
pub struct ReceiverStatsSnapshot {
    pub datagrams: u64,
    pub statuses: u64,
    pub terminations: u64,
    pub detections: u64,
    pub decode_errors: u64,
    pub io_errors: u64,
    pub dropped_notifications: u64,
}

impl fmt::Display for ReceiverStatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!( f, "datagrams: {}, statuses: {}, terminations: {}, detections: {}, decode errors: {}, io errors: {}, dropped notifications: {}",
                self.datagrams, self.statuses, self.terminations, self.detections, self.decode_errors, self.io_errors, self.dropped_notifications)
    }
}

/// owns the telemetry socket and the threads that read from it.
///
/// The receive thread is the only writer of the registry. Each status is upserted before
/// the corresponding notification is queued for the dispatcher thread, which calls the observers in
/// registration order.
///
/// State transitions: `Uninitialized -> Listening -> Closed`. Closing (or dropping a listening receiver)
/// leaves the multicast group, shuts down the socket to wake up a blocked receive and joins both threads.
pub struct MulticastReceiver {
    config: Arc<TelemetryConfig>,
    state: ReceiverState,

    registry: TelemetryRegistry,
    writer: Arc<Mutex<Option<RegistryWriter>>>, // taken by the receive thread once it runs
    observers: ObserverList,

    stats: Arc<ReceiverStats>,
    dropped: Arc<AtomicU64>,          // shared with the notification queue once we run

    socket: Option<Arc<UdpSocket>>,
    membership: Option<MulticastMembership>,
    keep_alive: Arc<AtomicBool>,      // used to signal the receive thread to terminate
    rx_task: Option<JoinHandle<()>>,
    dispatch_task: Option<JoinHandle<()>>,
}

impl MulticastReceiver {
    /// this takes the writer of `registry`, i.e. there can only be one receiver per registry
    pub fn new (config: TelemetryConfig, registry: &TelemetryRegistry)->Result<Self> {
        let writer = registry.writer()?;

        Ok( MulticastReceiver {
            config: Arc::new(config),
            state: ReceiverState::Uninitialized,
            registry: registry.clone(),
            writer: Arc::new( Mutex::new( Some(writer))),
            observers: ObserverList::new(),
            stats: Arc::new( ReceiverStats::default()),
            dropped: Arc::new( AtomicU64::new(0)),
            socket: None,
            membership: None,
            keep_alive: Arc::new( AtomicBool::new(false)),
            rx_task: None,
            dispatch_task: None,
        })
    }

    pub fn state (&self)->ReceiverState { self.state }

    pub fn config (&self)->&TelemetryConfig { &self.config }

    pub fn registry (&self)->&TelemetryRegistry { &self.registry }

    /// the local address of our socket while we are listening
    pub fn local_addr (&self)->Option<SocketAddr> {
        self.socket.as_ref().and_then( |s| s.local_addr().ok())
    }

    pub fn stats (&self)->ReceiverStatsSnapshot {
        let s = &self.stats;
        ReceiverStatsSnapshot {
            datagrams: s.datagrams.load( Ordering::Relaxed),
            statuses: s.statuses.load( Ordering::Relaxed),
            terminations: s.terminations.load( Ordering::Relaxed),
            detections: s.detections.load( Ordering::Relaxed),
            decode_errors: s.decode_errors.load( Ordering::Relaxed),
            io_errors: s.io_errors.load( Ordering::Relaxed),
            dropped_notifications: self.dropped.load( Ordering::Relaxed),
        }
    }

    /// observers are notified in the order in which they were added. They can be added while listening
    pub fn add_observer<O> (&self, observer: O)->Result<()> where O: UpdateObserver + 'static {
        self.add_shared_observer( Arc::new(observer))
    }

    pub fn add_shared_observer (&self, observer: Arc<dyn UpdateObserver>)->Result<()> {
        if self.state == ReceiverState::Closed {
            return Err( invalid_state!("{:?}: cannot add observer", self.state))
        }
        self.observers.add( observer);
        Ok(())
    }

    pub fn n_observers (&self)->usize { self.observers.len() }

    /// bind, join the configured multicast group and start receiving. Failures leave us `Uninitialized`
    pub fn initialize (&mut self)->Result<()> {
        self.check_state( ReceiverState::Uninitialized, "initialize")?;

        let (socket, membership) = net::open_multicast_socket( &self.config)?;
        info!("listening for telemetry on {}:{}", membership.group, self.config.port);
        self.start( socket, Some(membership))
    }

    /// start receiving on an already bound socket (e.g. a unicast or loopback socket). There is
    /// no group membership to drop on close
    pub fn initialize_with_socket (&mut self, socket: UdpSocket)->Result<()> {
        self.check_state( ReceiverState::Uninitialized, "initialize")?;

        socket.set_read_timeout( Some( self.config.effective_poll_interval()))?;
        info!("listening for telemetry on {:?}", socket.local_addr());
        self.start( socket, None)
    }

    fn start (&mut self, socket: UdpSocket, membership: Option<MulticastMembership>)->Result<()> {
        if lock_writer( &self.writer).is_none() {
            return Err( invalid_state!("{:?}: no registry writer", self.state))
        }

        let (queue, stream) = observer::notification_queue( self.config.notify_queue_bound);
        self.dropped = queue.dropped_counter();
        let dispatch_task = observer::spawn_dispatcher( stream, self.observers.clone())?;

        let socket = Arc::new( socket);
        let rx_socket = socket.clone();
        let stats = self.stats.clone();
        let writer = self.writer.clone();
        let keep_alive = self.keep_alive.clone();
        let buf_len = self.config.recv_buffer_size.max( wire::STATUS_DATAGRAM_LEN);
        let poll_interval = self.config.effective_poll_interval();

        keep_alive.store( true, Ordering::Release);
        let spawned = thread::Builder::new()
            .name( "telemetry-rx".into())
            .spawn( move || {
                if let Some(mut writer) = lock_writer( &writer).take() {
                    receive_loop( &rx_socket, &mut writer, &queue, &stats, &keep_alive, buf_len, poll_interval);
                }
                queue.stop(); // let the dispatcher drain what is left
            });

        match spawned {
            Ok(rx_task) => {
                self.socket = Some(socket);
                self.membership = membership;
                self.rx_task = Some(rx_task);
                self.dispatch_task = Some(dispatch_task);
                self.state = ReceiverState::Listening;
                Ok(())
            }
            Err(e) => { // the queue got dropped with the closure, which terminates the dispatcher. We still own the writer
                self.keep_alive.store( false, Ordering::Release);
                join_task( dispatch_task, "dispatcher");
                Err( e.into())
            }
        }
    }

    /// stop receiving. Failing to leave the multicast group is not fatal. If one of our threads
    /// panicked we still clean up but report it
    pub fn close (&mut self)->Result<()> {
        self.check_state( ReceiverState::Listening, "close")?;
        self.state = ReceiverState::Closed;
        self.keep_alive.store( false, Ordering::Release);

        if let Some(socket) = &self.socket {
            if let Some(membership) = &self.membership {
                if let Err(e) = net::leave_multicast_group( socket, membership) {
                    warn!("failed to leave multicast group {}: {}", membership.group, e);
                }
            }
            net::shutdown_socket( socket);
        }

        let mut panicked = Vec::new();
        if let Some(task) = self.rx_task.take() {
            if !join_task( task, "receiver") { panicked.push("receiver") }
        }
        if let Some(task) = self.dispatch_task.take() {
            if !join_task( task, "dispatcher") { panicked.push("dispatcher") }
        }

        self.socket = None; // this closes it
        self.membership = None;
        info!("telemetry receiver closed ({})", self.stats());

        if panicked.is_empty() {
            Ok(())
        } else {
            Err( ArenaTelemetryError::ThreadPanicError( panicked.join(",")))
        }
    }

    fn check_state (&self, expected: ReceiverState, op: &str)->Result<()> {
        if self.state != expected {
            Err( invalid_state!("{:?}: cannot {}", self.state, op))
        } else {
            Ok(())
        }
    }
}

impl Drop for MulticastReceiver {
    fn drop (&mut self) {
        if self.state == ReceiverState::Listening {
            if let Err(e) = self.close() {
                error!("failed to close receiver: {}", e);
            }
        }
    }
}

/// false if the thread panicked
fn join_task (task: JoinHandle<()>, what: &str)->bool {
    if task.join().is_err() {
        error!("telemetry {} thread panicked", what);
        false
    } else {
        true
    }
}

fn lock_writer (slot: &Mutex<Option<RegistryWriter>>)->std::sync::MutexGuard<'_,Option<RegistryWriter>> {
    slot.lock().unwrap_or_else( |e| e.into_inner())
}

fn receive_loop (socket: &UdpSocket, writer: &mut RegistryWriter, queue: &NotificationQueue, stats: &ReceiverStats,
                 keep_alive: &AtomicBool, buf_len: usize, poll_interval: Duration) {
    let mut buf = vec![0u8; buf_len];

    while keep_alive.load( Ordering::Acquire) {
        // no recv_from: after shutdown it would have to report a peer address we don't get
        match socket.recv( &mut buf) {
            Ok(len) => {
                if !keep_alive.load( Ordering::Acquire) { break } // woken up by shutdown

                ReceiverStats::inc( &stats.datagrams);
                process_datagram( &buf[..len], writer, queue, stats);
            }
            Err(e) if matches!( e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted) => {
                // nothing received within poll interval - check if we are still alive
            }
            Err(e) => {
                if !keep_alive.load( Ordering::Acquire) { break }

                ReceiverStats::inc( &stats.io_errors);
                error!("telemetry receive failed: {}", e);
                thread::sleep( poll_interval); // don't spin on persistent socket errors
            }
        }
    }
    debug!("telemetry receive loop terminated");
}

fn process_datagram (data: &[u8], writer: &mut RegistryWriter, queue: &NotificationQueue, stats: &ReceiverStats) {
    match wire::decode( data) {
        Ok(TelemetryMsg::Status(status)) => {
            ReceiverStats::inc( &stats.statuses);
            debug!("{} ({} bytes)", status, data.len());

            writer.upsert( status.clone());
            queue.push( Notification::Update(status));
        }
        Ok(TelemetryMsg::Termination(event)) => {
            ReceiverStats::inc( &stats.terminations);
            info!("{} terminated.", event.id);
            queue.push( Notification::Termination(event));
        }
        Ok(TelemetryMsg::Detection(event)) => {
            ReceiverStats::inc( &stats.detections);
            info!("{} detected by radar.", event.id);
            queue.push( Notification::Detection(event));
        }
        Err(e) => {
            ReceiverStats::inc( &stats.decode_errors);
            warn!("dropping datagram ({} bytes): {}", data.len(), e);
        }
    }
}
