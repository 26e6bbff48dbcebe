//
// nettest - loopback peers for socket integration tests
//
// Purpose:
//   Small std-based helpers spawning real peers on background threads: a TCP
//   echo server, a TCP sender that closes after a fixed payload, and a UDP
//   ponger. Tests drive the library under test against these peers over
//   loopback, no privileges or virtual interfaces required.
//

use anyhow::Context as _;
use std::io::{Read as _, Write as _};
use std::net::{SocketAddr, TcpListener, UdpSocket};
use std::thread::JoinHandle;

/// Initializes the test logger; safe to call from every test.
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Spawns a TCP server that accepts one connection and echoes everything
/// until the client closes. Returns the bound address and the thread handle.
pub fn spawn_tcp_echo() -> anyhow::Result<(SocketAddr, JoinHandle<()>)> {
    let listener = TcpListener::bind("127.0.0.1:0").context("bind echo listener")?;
    let addr = listener.local_addr()?;
    let handle = std::thread::spawn(move || {
        let (mut conn, peer) = match listener.accept() {
            Ok(c) => c,
            Err(e) => {
                log::error!("[echo] accept failed: {e}");
                return;
            }
        };
        log::debug!("[echo] serving {peer}");
        let mut buf = [0u8; 4096];
        loop {
            match conn.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    if let Err(e) = conn.write_all(&buf[..n]) {
                        log::error!("[echo] write failed: {e}");
                        break;
                    }
                }
                Err(e) => {
                    log::error!("[echo] read failed: {e}");
                    break;
                }
            }
        }
        log::debug!("[echo] done with {peer}");
    });
    Ok((addr, handle))
}

/// Spawns a TCP server that accepts one connection, sends `payload`, then
/// closes its end without reading anything.
pub fn spawn_tcp_sender(payload: Vec<u8>) -> anyhow::Result<(SocketAddr, JoinHandle<()>)> {
    let listener = TcpListener::bind("127.0.0.1:0").context("bind sender listener")?;
    let addr = listener.local_addr()?;
    let handle = std::thread::spawn(move || {
        let (mut conn, peer) = match listener.accept() {
            Ok(c) => c,
            Err(e) => {
                log::error!("[sender] accept failed: {e}");
                return;
            }
        };
        log::debug!("[sender] sending {} bytes to {peer}", payload.len());
        if let Err(e) = conn.write_all(&payload) {
            log::error!("[sender] write failed: {e}");
        }
        // Dropping conn here closes the connection right after the payload.
    });
    Ok((addr, handle))
}

/// Spawns a TCP server that accepts one connection and drops it immediately,
/// without reading or writing.
pub fn spawn_tcp_closer() -> anyhow::Result<(SocketAddr, JoinHandle<()>)> {
    let listener = TcpListener::bind("127.0.0.1:0").context("bind closer listener")?;
    let addr = listener.local_addr()?;
    let handle = std::thread::spawn(move || match listener.accept() {
        Ok((conn, peer)) => {
            log::debug!("[closer] dropping {peer}");
            drop(conn);
        }
        Err(e) => log::error!("[closer] accept failed: {e}"),
    });
    Ok((addr, handle))
}

/// Spawns a UDP peer that waits for one datagram and answers `PONG` to its
/// source address.
pub fn spawn_udp_pong() -> anyhow::Result<(SocketAddr, JoinHandle<()>)> {
    let socket = UdpSocket::bind("127.0.0.1:0").context("bind pong socket")?;
    let addr = socket.local_addr()?;
    let handle = std::thread::spawn(move || {
        let mut buf = [0u8; 1024];
        match socket.recv_from(&mut buf) {
            Ok((n, src)) => {
                log::debug!("[pong] got {n} bytes from {src}");
                if let Err(e) = socket.send_to(b"PONG", src) {
                    log::error!("[pong] reply failed: {e}");
                }
            }
            Err(e) => log::error!("[pong] recv failed: {e}"),
        }
    });
    Ok((addr, handle))
}

/// A TCP port on loopback that is bound to nothing: binds a listener, reads
/// the port, drops the listener. Connecting to it gets refused.
pub fn refused_port() -> anyhow::Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0").context("bind probe listener")?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(addr)
}
