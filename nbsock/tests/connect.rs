//
// connect.rs - Integration Tests for Connection Establishment
//
// Purpose:
//   Exercises the non-blocking connect state machine against loopback peers:
//   successful establishment (inet and unix-domain), refused connections,
//   and deadline expiry. Every failure path must leave the handle closed.
//

use nbsock::{Address, Socket, SocketError};
use std::io::{Read as _, Write as _};
use std::os::unix::net::UnixListener;

#[test]
fn connect_to_live_peer_leaves_descriptor_open() {
    nettest::init_logger();
    let (addr, server) = nettest::spawn_tcp_echo().unwrap();

    let mut s = Socket::tcp();
    s.set_timeout(5.0);
    s.connect(&Address::inet(addr.ip().to_string(), addr.port()))
        .unwrap();
    assert!(s.fileno() >= 0);

    s.close().unwrap();
    server.join().unwrap();
}

#[test]
fn refused_connect_fails_and_closes_the_handle() {
    nettest::init_logger();
    let addr = nettest::refused_port().unwrap();

    let mut s = Socket::tcp();
    s.set_timeout(5.0);
    let err = s
        .connect(&Address::inet(addr.ip().to_string(), addr.port()))
        .unwrap_err();
    assert!(matches!(err, SocketError::ConnectFailed(_)));
    assert_eq!(s.fileno(), -1);
}

#[test]
fn connect_deadline_expiry_closes_the_handle() {
    nettest::init_logger();

    let mut s = Socket::tcp();
    s.set_timeout(0.1);
    let started = std::time::Instant::now();
    // Blackhole address: SYNs go unanswered on a plain network, which makes
    // this a deadline expiry. On hosts where the route is rejected outright
    // the kernel reports the failure immediately instead.
    let err = s
        .connect(&Address::inet("10.255.255.1", 65000))
        .unwrap_err();
    assert!(matches!(
        err,
        SocketError::Timeout | SocketError::ConnectFailed(_)
    ));
    assert!(started.elapsed() < std::time::Duration::from_secs(3));
    assert_eq!(s.fileno(), -1);
}

#[test]
fn unix_domain_roundtrip() {
    nettest::init_logger();
    let path = std::env::temp_dir().join(format!("nbsock-test-{}.sock", std::process::id()));
    let _ = std::fs::remove_file(&path);
    let listener = UnixListener::bind(&path).unwrap();

    let server = std::thread::spawn(move || {
        let (mut conn, _) = listener.accept().unwrap();
        let mut buf = [0u8; 16];
        let n = conn.read(&mut buf).unwrap();
        conn.write_all(&buf[..n]).unwrap();
    });

    let mut s = Socket::tcp();
    s.set_timeout(5.0);
    s.connect(&Address::unix(path.as_os_str().as_encoded_bytes()))
        .unwrap();
    assert_eq!(s.write_all(b"ping").unwrap(), 4);
    let mut got = Vec::new();
    while got.len() < 4 {
        got.extend_from_slice(&s.recv(16).unwrap());
    }
    assert_eq!(got, b"ping");

    server.join().unwrap();
    let _ = std::fs::remove_file(&path);
}

#[test]
fn double_close_after_connect_is_a_no_op() {
    nettest::init_logger();
    let (addr, server) = nettest::spawn_tcp_echo().unwrap();

    let mut s = Socket::tcp();
    s.set_timeout(5.0);
    s.connect(&Address::inet(addr.ip().to_string(), addr.port()))
        .unwrap();
    s.close().unwrap();
    s.close().unwrap();
    assert_eq!(s.fileno(), -1);
    server.join().unwrap();
}
