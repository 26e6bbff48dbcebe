//
// select.rs - Integration Tests for the Batch Readiness Wait
//
// Purpose:
//   Verifies the bulk wait primitive over real connected sockets: partial
//   readiness is success, full quiet is a timeout, and data arrival flips a
//   descriptor into the ready-read set.
//

use nbsock::{Address, Socket, SocketError, select_fds};

fn connected_pair() -> (Socket, Socket, Vec<std::thread::JoinHandle<()>>) {
    let (addr1, srv1) = nettest::spawn_tcp_echo().unwrap();
    let (addr2, srv2) = nettest::spawn_tcp_echo().unwrap();
    let mut a = Socket::tcp();
    a.set_timeout(5.0);
    a.connect(&Address::inet(addr1.ip().to_string(), addr1.port()))
        .unwrap();
    let mut b = Socket::tcp();
    b.set_timeout(5.0);
    b.connect(&Address::inet(addr2.ip().to_string(), addr2.port()))
        .unwrap();
    (a, b, vec![srv1, srv2])
}

#[test]
fn partial_readiness_is_success_not_timeout() {
    nettest::init_logger();
    let (writable, quiet, _servers) = connected_pair();

    // One socket writable at once, the other never becoming readable: the
    // writable one must be reported within the 50ms budget.
    let (ready_read, ready_write) =
        select_fds(&[quiet.fileno()], &[writable.fileno()], 0.05).unwrap();
    assert!(ready_read.is_empty());
    assert_eq!(ready_write, vec![writable.fileno()]);
}

#[test]
fn nothing_ready_is_a_timeout_error() {
    nettest::init_logger();
    let (_writable, quiet, _servers) = connected_pair();

    let started = std::time::Instant::now();
    assert!(matches!(
        select_fds(&[quiet.fileno()], &[], 0.05),
        Err(SocketError::Timeout)
    ));
    assert!(started.elapsed() >= std::time::Duration::from_millis(40));
}

#[test]
fn echoed_data_flips_the_read_set() {
    nettest::init_logger();
    let (mut talker, quiet, _servers) = connected_pair();

    assert_eq!(talker.write_all(b"marco").unwrap(), 5);
    let (ready_read, ready_write) =
        select_fds(&[talker.fileno(), quiet.fileno()], &[], 5.0).unwrap();
    assert_eq!(ready_read, vec![talker.fileno()]);
    assert!(ready_write.is_empty());

    assert_eq!(talker.recv(16).unwrap(), b"marco");
}
