// SPDX-FileCopyrightText: 2025 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use gpioblink::uapi::{self, Client, SET_PERIOD};
use gpioblink::{Config, Device, Error, ShutdownHandle};
use std::io::{self, Read, Write};
use std::net::Shutdown;
use std::os::unix::net::UnixStream;
use std::thread::{self, sleep};
use std::time::Duration;

mod common;
use common::{config, mock_device, MockPin, Probe};

fn spawn_device(cfg: &Config) -> (thread::JoinHandle<()>, ShutdownHandle, Probe) {
    let (mut dev, probe) = mock_device(cfg);
    let handle = dev.shutdown_handle();
    let t = thread::spawn(move || {
        dev.serve().unwrap();
        dev.close().unwrap();
    });
    (t, handle, probe)
}

#[test]
fn starts_running() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(dir.path(), 20);
    let (dev, probe) = mock_device(&cfg);
    assert!(dev.engine().is_running());
    assert_eq!(dev.engine().period(), 20);
    assert_eq!(dev.path(), cfg.path);
    sleep(Duration::from_millis(70));
    assert!(probe.count() >= 2);
    assert_eq!(probe.levels()[..2], [true, false]);
    dev.close().unwrap();
}

#[test]
fn serves_commands() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(dir.path(), 500);
    let (t, handle, probe) = spawn_device(&cfg);

    let client = Client::connect(&cfg.path)
        .unwrap()
        .with_timeout(Duration::from_secs(1))
        .unwrap();
    client.set_period(10).unwrap();
    sleep(Duration::from_millis(60));
    assert!(probe.count() >= 3);

    client.stop().unwrap();
    let count = probe.count();
    sleep(Duration::from_millis(40));
    assert_eq!(probe.count(), count);

    // rejected without restarting
    match client.set_period(-5) {
        Err(e) => assert_eq!(e.errno(), libc::EINVAL),
        Ok(()) => panic!("negative period accepted"),
    }
    // ignored
    client.request(0xEF04, None).unwrap();
    sleep(Duration::from_millis(40));
    assert_eq!(probe.count(), count);

    client.start().unwrap();
    sleep(Duration::from_millis(60));
    assert!(probe.count() > count);

    handle.shutdown().unwrap();
    t.join().unwrap();
    assert_eq!(probe.last(), Some(false));
    assert!(probe.is_released());
    assert!(!cfg.path.exists());
}

#[test]
fn serves_multiple_clients() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(dir.path(), 500);
    let (t, handle, _probe) = spawn_device(&cfg);

    let c1 = Client::connect(&cfg.path).unwrap();
    let c2 = Client::connect(&cfg.path).unwrap();
    c1.stop().unwrap();
    c2.set_period(100).unwrap();
    c1.start().unwrap();
    drop(c2);
    c1.stop().unwrap();

    let clients: Vec<_> = (0..4)
        .map(|i| {
            let path = cfg.path.clone();
            thread::spawn(move || {
                let c = Client::connect(path).unwrap();
                for _ in 0..10 {
                    c.set_period(50 + i).unwrap();
                }
            })
        })
        .collect();
    for c in clients {
        c.join().unwrap();
    }

    handle.shutdown().unwrap();
    t.join().unwrap();
}

#[test]
fn truncated_request() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(dir.path(), 500);
    let (t, handle, _probe) = spawn_device(&cfg);

    let mut s = UnixStream::connect(&cfg.path).unwrap();
    s.set_read_timeout(Some(Duration::from_secs(1))).unwrap();
    let mut req = SET_PERIOD.to_ne_bytes().to_vec();
    req.extend_from_slice(&[0x10, 0x00]);
    s.write_all(&req).unwrap();
    s.shutdown(Shutdown::Write).unwrap();
    let status = uapi::read_status(&mut s).unwrap();
    assert_eq!(status.errno(), Some(libc::EIO));
    // and then the device hangs up
    let mut buf = [0; 4];
    assert_eq!(s.read(&mut buf).unwrap(), 0);

    // the device is still serving
    let client = Client::connect(&cfg.path).unwrap();
    client.stop().unwrap();

    handle.shutdown().unwrap();
    t.join().unwrap();
}

#[test]
fn pipelined_requests() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(dir.path(), 500);
    let (t, handle, _probe) = spawn_device(&cfg);

    let mut s = UnixStream::connect(&cfg.path).unwrap();
    s.set_read_timeout(Some(Duration::from_secs(1))).unwrap();
    let mut req = Vec::new();
    uapi::write_request(&mut req, uapi::STOP, None).unwrap();
    uapi::write_request(&mut req, SET_PERIOD, Some(-1)).unwrap();
    uapi::write_request(&mut req, uapi::START, None).unwrap();
    s.write_all(&req).unwrap();
    assert_eq!(uapi::read_status(&mut s).unwrap().errno(), None);
    assert_eq!(
        uapi::read_status(&mut s).unwrap().errno(),
        Some(libc::EINVAL)
    );
    assert_eq!(uapi::read_status(&mut s).unwrap().errno(), None);

    handle.shutdown().unwrap();
    t.join().unwrap();
}

#[test]
fn unread_replies_block_the_client() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(dir.path(), 500);
    let (t, handle, _probe) = spawn_device(&cfg);

    let mut s = UnixStream::connect(&cfg.path).unwrap();
    s.set_write_timeout(Some(Duration::from_millis(500))).unwrap();
    let mut chunk = Vec::new();
    for _ in 0..4096 {
        uapi::write_request(&mut chunk, uapi::STOP, None).unwrap();
    }
    // far more than the socket buffers hold
    let limit = 16 << 20;
    let mut written = 0;
    let err = loop {
        match s.write(&chunk) {
            Ok(n) => written += n,
            Err(e) => break e,
        }
        assert!(
            written < limit,
            "wrote {} bytes without the device pushing back",
            written
        );
    };
    assert!(matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    ));

    // the device is still serving
    let client = Client::connect(&cfg.path)
        .unwrap()
        .with_timeout(Duration::from_secs(1))
        .unwrap();
    client.start().unwrap();

    // and the replies are all there once read
    s.set_read_timeout(Some(Duration::from_secs(1))).unwrap();
    for _ in 0..1024 {
        assert_eq!(uapi::read_status(&mut s).unwrap().errno(), None);
    }

    handle.shutdown().unwrap();
    t.join().unwrap();
}

#[test]
fn busy() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(dir.path(), 500);
    let (dev, _probe) = mock_device(&cfg);

    let (pin, probe) = MockPin::new();
    match Device::with_pin(&cfg, |_| Ok(pin)) {
        Err(Error::Busy(p)) => assert_eq!(p, cfg.path),
        Err(e) => panic!("expected Busy, got {}", e),
        Ok(_) => panic!("registered twice"),
    }
    // the pin was never acquired
    assert_eq!(probe.count(), 0);
    assert!(cfg.path.exists());

    dev.close().unwrap();
    assert!(!cfg.path.exists());
}

#[test]
fn replaces_stale_registration() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(dir.path(), 500);
    // as if a device had died without cleaning up
    drop(std::os::unix::net::UnixListener::bind(&cfg.path).unwrap());
    assert!(cfg.path.exists());

    let (dev, _probe) = mock_device(&cfg);
    assert!(dev.engine().is_running());
    dev.close().unwrap();
}

#[test]
fn unwinds_on_pin_failure() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(dir.path(), 500);
    let res = Device::<MockPin>::with_pin(&cfg, |cfg| {
        // registered before the pin is requested
        assert!(cfg.path.exists());
        Err(Error::UnfoundLine(cfg.line.clone()))
    });
    assert!(matches!(res, Err(Error::UnfoundLine(l)) if l == "LED0"));
    assert!(!cfg.path.exists());

    // and the path is free for the next attempt
    let (dev, _probe) = mock_device(&cfg);
    dev.close().unwrap();
}

#[test]
fn close_turns_off() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(dir.path(), 5);
    let (dev, probe) = mock_device(&cfg);
    sleep(Duration::from_millis(30));
    dev.close().unwrap();
    assert_eq!(probe.last(), Some(false));
    assert!(probe.is_released());
    assert!(!cfg.path.exists());
}

#[test]
fn close_turns_off_once() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(dir.path(), 500);
    let (dev, probe) = mock_device(&cfg);
    dev.close().unwrap();
    assert_eq!(probe.levels(), [false]);
    assert!(probe.is_released());
}

#[test]
fn drop_turns_off() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(dir.path(), 5);
    let (dev, probe) = mock_device(&cfg);
    sleep(Duration::from_millis(30));
    drop(dev);
    assert_eq!(probe.last(), Some(false));
    assert!(probe.is_released());
    assert!(!cfg.path.exists());
}
