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

use std::{
    net::UdpSocket,
    sync::{Arc, Mutex, atomic::{AtomicUsize,Ordering}},
    thread,
    time::{Duration,Instant}
};
use arena_telemetry::{
    AgentCategory, AgentStatus, DetectionEvent, MulticastReceiver, ReceiverState, TelemetryConfig, TelemetryRegistry,
    TelemetrySender, TerminationEvent, UpdateObserver,
    errors::ArenaTelemetryError,
    observer::{self, Notification}
};

// run with "cargo test --test test_receiver -- --nocapture"
// these tests use unicast on loopback, joining multicast groups is not available everywhere

fn test_config ()->TelemetryConfig {
    TelemetryConfig {
        interface: None,
        poll_interval: Duration::from_millis(50),
        ..TelemetryConfig::default()
    }
}

fn loopback_socket ()->UdpSocket {
    UdpSocket::bind( "127.0.0.1:0").unwrap()
}

/// poll `cond` until it holds or we run out of time
fn wait_for (timeout: Duration, cond: impl Fn()->bool)->bool {
    let t0 = Instant::now();
    while t0.elapsed() < timeout {
        if cond() { return true }
        thread::sleep( Duration::from_millis(10));
    }
    cond()
}

struct Recorder {
    name: &'static str,
    log: Arc<Mutex<Vec<String>>>
}

impl UpdateObserver for Recorder {
    fn on_update (&self, status: &AgentStatus) {
        self.log.lock().unwrap().push( format!("{}:update:{}:{}", self.name, status.id, status.position_x));
    }

    fn on_termination (&self, event: &TerminationEvent) {
        self.log.lock().unwrap().push( format!("{}:terminated:{}", self.name, event.id));
    }

    fn on_detection (&self, event: &DetectionEvent) {
        self.log.lock().unwrap().push( format!("{}:detected:{}", self.name, event.id));
    }
}

#[test]
fn test_unknown_interface () {
    let registry = TelemetryRegistry::new();
    let config = test_config().with_interface( Some("no-such-if0".to_string()));
    let mut receiver = MulticastReceiver::new( config, &registry).unwrap();

    match receiver.initialize() {
        Err(ArenaTelemetryError::InterfaceError(name)) => println!("rejected interface {name}"),
        other => panic!("unknown interface accepted: {other:?}")
    }
    assert_eq!( receiver.state(), ReceiverState::Uninitialized);

    // we can still start on another socket
    receiver.initialize_with_socket( loopback_socket()).unwrap();
    assert_eq!( receiver.state(), ReceiverState::Listening);
    receiver.close().unwrap();
}

#[test]
fn test_invalid_transitions () {
    let registry = TelemetryRegistry::new();
    let mut receiver = MulticastReceiver::new( test_config(), &registry).unwrap();

    assert!( matches!( receiver.close(), Err(ArenaTelemetryError::InvalidStateError(_))));
    assert!( matches!( MulticastReceiver::new( test_config(), &registry), Err(ArenaTelemetryError::WriterTakenError)));

    receiver.initialize_with_socket( loopback_socket()).unwrap();
    assert!( receiver.local_addr().is_some());
    assert!( matches!( receiver.initialize_with_socket( loopback_socket()), Err(ArenaTelemetryError::InvalidStateError(_))));

    receiver.close().unwrap();
    assert_eq!( receiver.state(), ReceiverState::Closed);
    assert!( receiver.local_addr().is_none());
    assert!( matches!( receiver.close(), Err(ArenaTelemetryError::InvalidStateError(_))));
    assert!( matches!( receiver.initialize(), Err(ArenaTelemetryError::InvalidStateError(_))));
    assert!( matches!( receiver.add_observer( |_: &AgentStatus| {}), Err(ArenaTelemetryError::InvalidStateError(_))));
}

#[test]
fn test_receive_and_notify () {
    let registry = TelemetryRegistry::new();
    let mut receiver = MulticastReceiver::new( test_config(), &registry).unwrap();

    let log = Arc::new( Mutex::new( Vec::<String>::new()));
    receiver.add_observer( Recorder{ name: "A", log: log.clone() }).unwrap();
    receiver.add_observer( Recorder{ name: "B", log: log.clone() }).unwrap();
    assert_eq!( receiver.n_observers(), 2);

    receiver.initialize_with_socket( loopback_socket()).unwrap();
    let sender = TelemetrySender::with_target( receiver.local_addr().unwrap()).unwrap();

    sender.send_raw( &[99, 1, 2, 3]).unwrap();   // unknown type
    sender.send_raw( &[1, 2, 3]).unwrap();       // truncated status
    sender.send_status( &AgentStatus::new( "Robot1", 100, 200, 90, 5, AgentCategory::Bomber)).unwrap();
    sender.send_status( &AgentStatus::new( "Robot1", 110, 210, 95, 5, AgentCategory::Bomber)).unwrap();
    sender.send_detection( "Robot1").unwrap();
    sender.send_termination( "Robot1").unwrap();

    assert!( wait_for( Duration::from_secs(5), || log.lock().unwrap().len() >= 8), "notifications missing: {:?}", log.lock().unwrap());

    let entries = log.lock().unwrap().clone();
    for e in &entries { println!("{e}") }
    assert_eq!( entries, vec![
        "A:update:Robot1:100", "B:update:Robot1:100",
        "A:update:Robot1:110", "B:update:Robot1:110",
        "A:detected:Robot1", "B:detected:Robot1",
        "A:terminated:Robot1", "B:terminated:Robot1",
    ]);

    // termination does not remove the agent
    let status = registry.get( "Robot1").unwrap();
    assert_eq!( (status.position_x, status.position_y, status.heading), (110, 210, 95));
    assert_eq!( registry.len(), 1);

    receiver.close().unwrap();

    let stats = receiver.stats();
    println!("{stats}");
    assert_eq!( stats.datagrams, 6);
    assert_eq!( stats.decode_errors, 2);
    assert_eq!( stats.statuses, 2);
    assert_eq!( stats.detections, 1);
    assert_eq!( stats.terminations, 1);
    assert_eq!( stats.dropped_notifications, 0);

    // the registry survives the receiver
    drop( receiver);
    assert!( registry.contains( "Robot1"));
}

#[test]
fn test_panicking_observer () {
    let registry = TelemetryRegistry::new();
    let mut receiver = MulticastReceiver::new( test_config(), &registry).unwrap();

    let n_updates = Arc::new( AtomicUsize::new(0));
    receiver.add_observer( |_: &AgentStatus| -> () { panic!("observer failure") }).unwrap();
    let n = n_updates.clone();
    receiver.add_observer( move |_: &AgentStatus| { n.fetch_add( 1, Ordering::SeqCst); }).unwrap();

    receiver.initialize_with_socket( loopback_socket()).unwrap();
    let sender = TelemetrySender::with_target( receiver.local_addr().unwrap()).unwrap();
    for i in 0..3 {
        sender.send_status( &AgentStatus::new( "R1", i, i, 0, 0, AgentCategory::Jammer)).unwrap();
    }

    assert!( wait_for( Duration::from_secs(5), || n_updates.load( Ordering::SeqCst) == 3));
    assert_eq!( registry.get( "R1").unwrap().position_x, 2);

    receiver.close().unwrap(); // observer panics don't take down our threads
}

#[test]
fn test_slow_observer () {
    let registry = TelemetryRegistry::new();
    let config = TelemetryConfig { notify_queue_bound: 2, ..test_config() };
    let mut receiver = MulticastReceiver::new( config, &registry).unwrap();
    receiver.add_observer( |_: &AgentStatus| thread::sleep( Duration::from_millis(200))).unwrap();

    receiver.initialize_with_socket( loopback_socket()).unwrap();
    let sender = TelemetrySender::with_target( receiver.local_addr().unwrap()).unwrap();

    let n = 20;
    let t0 = Instant::now();
    for i in 0..n {
        sender.send_status( &AgentStatus::new( "R1", i, i, 0, 0, AgentCategory::Surveillance)).unwrap();
    }

    // the registry keeps up even if the observer does not
    assert!( wait_for( Duration::from_secs(3), || registry.update_count() == n as u64));
    println!("registry updated after {:?}", t0.elapsed());
    assert_eq!( registry.get( "R1").unwrap().position_x, n-1);

    receiver.close().unwrap();
    println!("{}", receiver.stats());
}

#[test]
fn test_drop_oldest () {
    let (queue, stream) = observer::notification_queue( 2);

    for i in 0..5 {
        queue.push( Notification::Update( AgentStatus::new( "R1", i, 0, 0, 0, AgentCategory::Unknown)));
    }
    assert_eq!( queue.dropped(), 3);

    let pending: Vec<i32> = std::iter::from_fn( || stream.try_recv()).map( |n| match n {
        Notification::Update(s) => s.position_x,
        other => panic!("unexpected notification {other:?}")
    }).collect();
    assert_eq!( pending, vec![3, 4]);

    queue.stop();
    assert!( stream.recv().is_none());
}

#[test]
fn test_close_unblocks_receive () {
    let registry = TelemetryRegistry::new();
    let config = TelemetryConfig { poll_interval: Duration::from_secs(30), ..test_config() };
    let mut receiver = MulticastReceiver::new( config, &registry).unwrap();

    receiver.initialize_with_socket( loopback_socket()).unwrap();
    let sender = TelemetrySender::with_target( receiver.local_addr().unwrap()).unwrap();
    sender.send_status( &AgentStatus::new( "R1", 1, 1, 0, 0, AgentCategory::Bomber)).unwrap();
    assert!( wait_for( Duration::from_secs(5), || registry.contains( "R1")));

    // the receive thread is blocked now, close has to wake it up without waiting for the timeout
    let t0 = Instant::now();
    let res = receiver.close();
    let elapsed = t0.elapsed();
    println!("close took {elapsed:?}");

    assert!( res.is_ok(), "receiver threads did not terminate cleanly: {res:?}");
    assert!( elapsed < Duration::from_secs(5));
    assert_eq!( receiver.stats().io_errors, 0);
}

fn multicast_config (interface: &str, port: u16)->TelemetryConfig {
    TelemetryConfig {
        interface: Some( interface.to_string()),
        port,
        poll_interval: Duration::from_secs(30),
        ..TelemetryConfig::default()
    }
}

/// join the group on `interface`, send one status to it and close again
fn check_multicast_roundtrip (config: TelemetryConfig) {
    let registry = TelemetryRegistry::new();
    let mut receiver = MulticastReceiver::new( config.clone(), &registry).unwrap();

    if let Err(e) = receiver.initialize() {
        println!("skipping, cannot join {}:{} on {:?}: {e}", config.group, config.port, config.interface);
        return
    }
    assert_eq!( receiver.state(), ReceiverState::Listening);

    let sender = TelemetrySender::new( &config).unwrap();
    sender.send_status( &AgentStatus::new( "M1", 42, 43, 0, 0, AgentCategory::Surveillance)).unwrap();
    assert!( wait_for( Duration::from_secs(5), || registry.contains( "M1")), "no multicast status received");
    println!("{}", registry.get( "M1").unwrap());

    let t0 = Instant::now();
    receiver.close().unwrap();
    assert!( t0.elapsed() < Duration::from_secs(5));
    assert_eq!( receiver.state(), ReceiverState::Closed);
}

#[test]
fn test_multicast_by_address () {
    check_multicast_roundtrip( multicast_config( "127.0.0.1", 15017));
}

#[cfg(target_os = "linux")]
#[test]
fn test_multicast_by_name () {
    // the sender has to select the named interface for output
    let config = multicast_config( "lo", 15018);
    assert!( TelemetrySender::new( &config).is_ok());
    check_multicast_roundtrip( config);
}

#[test]
fn test_sender_unknown_interface () {
    let config = multicast_config( "no-such-if0", 15019);
    assert!( matches!( TelemetrySender::new( &config), Err(ArenaTelemetryError::InterfaceError(_))));
}
