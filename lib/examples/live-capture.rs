use std::{env, sync::mpsc, thread, time::Duration};

use r_wirelib::{
    capture::wire,
    session::{CaptureSession, SessionEvent},
};

fn is_root() -> bool {
    match env::var("USER") {
        Ok(val) => val == "root",
        Err(_e) => false,
    }
}

fn main() {
    if !is_root() {
        panic!("permission denied: must run with root privileges");
    }

    let devices = wire::devices();

    if devices.is_empty() {
        panic!("no capture devices found");
    }

    for (i, device) in devices.iter().enumerate() {
        println!("[{}] {}", i, device.name());
    }

    let (tx, rx) = mpsc::channel::<SessionEvent>();

    let mut session = CaptureSession::builder()
        .devices(devices)
        .notifier(tx)
        .build()
        .expect("failed to build session");

    session.start(0, None).expect("failed to start capture");

    let msg = rx.recv().expect("failed to poll for events");
    assert_eq!(msg, SessionEvent::CaptureStarted);

    println!("capturing for 10 seconds");
    thread::sleep(Duration::from_secs(10));

    session.stop().expect("failed to stop capture");

    let store = session.store();
    let store = store.lock().expect("failed to lock store");

    for packet in store.packets() {
        println!(
            "{:>5} {:>10.6} {:>8} {:<21} {:<21} {}",
            packet.sequence,
            packet.arrival_offset,
            packet.protocol,
            packet.source,
            packet.destination,
            packet.info
        );
    }

    println!(
        "captured {} packets, dropped {}",
        store.len(),
        session.dropped_frames()
    );
}
