//! TCP transport: request/response round-trips plus a background reader
//! thread that demultiplexes unsolicited push frames into [`crate::streams`].

use std::collections::HashMap;
use std::io::{BufReader, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs, UdpSocket};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Sender};
use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::protocol::codec::{endpoints_from_wire, read_server_connection_info_wire};
use crate::protocol::{read_frame, write_request, CommandId, RawFrame, ResponseFrame};
use crate::streams::StreamSink;
use crate::types::DeviceEndpoint;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// UDP port devices broadcast their `ServerConnectionInfo` reply on. Distinct
/// from [`crate::session::DEFAULT_PORT`], the TCP control-plane port.
const DISCOVERY_PORT: u16 = 7446;
const DISCOVERY_PROBE: &[u8] = b"AURORA-SDK-DISCOVER";
const DISCOVERY_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Passive network discovery: broadcasts a probe datagram and collects
/// `ServerConnectionInfo` replies until `timeout` elapses. Never fails on
/// zero discoveries — returns an empty vec instead.
pub fn discover(timeout: Duration) -> Result<Vec<DeviceEndpoint>> {
    let socket = UdpSocket::bind(("0.0.0.0", 0))?;
    socket.set_broadcast(true)?;
    socket.set_read_timeout(Some(DISCOVERY_POLL_INTERVAL))?;

    if let Err(e) = socket.send_to(DISCOVERY_PROBE, ("255.255.255.255", DISCOVERY_PORT)) {
        log::debug!("discovery broadcast send failed: {e}");
        return Ok(Vec::new());
    }

    let deadline = Instant::now() + timeout;
    let mut seen: HashMap<(String, u16), DeviceEndpoint> = HashMap::new();
    let mut buf = [0u8; 4096];

    while Instant::now() < deadline {
        match socket.recv_from(&mut buf) {
            Ok((len, _peer)) => match read_server_connection_info_wire(&buf[..len]) {
                Ok(wire) => {
                    for endpoint in endpoints_from_wire(&wire) {
                        if let Some(opt) = endpoint.options.first() {
                            seen.insert((opt.address.clone(), opt.port), endpoint);
                        }
                    }
                }
                Err(e) => log::debug!("malformed discovery reply, dropping: {e}"),
            },
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock || e.kind() == std::io::ErrorKind::TimedOut => {
                continue;
            }
            Err(e) => {
                log::debug!("discovery recv failed: {e}");
                break;
            }
        }
    }

    Ok(seen.into_values().collect())
}

/// A live connection to one device. Owned exclusively by a [`crate::Session`];
/// never cloned or shared except through the Session's lock.
pub struct Transport {
    write_half: Mutex<TcpStream>,
    peer_addr: SocketAddr,
    next_req_id: AtomicU32,
    pending: Arc<Mutex<HashMap<u32, Sender<ResponseFrame>>>>,
    alive: Arc<AtomicBool>,
    reader_stop: Arc<AtomicBool>,
    reader_thread: Option<JoinHandle<()>>,
}

impl Transport {
    /// Connects to `addr` and starts the background reader thread.
    pub fn connect(addr: impl ToSocketAddrs, sink: StreamSink) -> Result<Transport> {
        let addr = addr
            .to_socket_addrs()
            .map_err(Error::Io)?
            .next()
            .ok_or_else(|| Error::ConnectionString("no resolvable address".into()))?;

        let stream = TcpStream::connect_timeout(&addr, crate::config::connect_timeout())?;
        stream.set_nodelay(true).ok();
        let read_half = stream.try_clone()?;

        let pending: Arc<Mutex<HashMap<u32, Sender<ResponseFrame>>>> =
            Arc::new(Mutex::new(HashMap::new()));
        let alive = Arc::new(AtomicBool::new(true));
        let reader_stop = Arc::new(AtomicBool::new(false));

        let reader_thread = {
            let pending = pending.clone();
            let alive = alive.clone();
            let reader_stop = reader_stop.clone();
            std::thread::spawn(move || {
                reader_loop(BufReader::new(read_half), pending, alive, reader_stop, sink)
            })
        };

        log::info!("connected to {addr}");

        Ok(Transport {
            write_half: Mutex::new(stream),
            peer_addr: addr,
            next_req_id: AtomicU32::new(1),
            pending,
            alive,
            reader_stop,
            reader_thread: Some(reader_thread),
        })
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// True while the reader thread has not observed a disconnect. Reflects
    /// liveness, not local connect intent (that distinction belongs to
    /// `Controller::is_connected` vs `is_device_connection_alive`).
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Sends a request and blocks for the matching response, up to `timeout`
    /// (defaults to 5s when `None`).
    pub fn request(
        &self,
        cmd: CommandId,
        payload: &[u8],
        timeout: Option<Duration>,
    ) -> Result<ResponseFrame> {
        let req_id = self.next_req_id.fetch_add(1, Ordering::Relaxed).max(1);
        let (tx, rx) = bounded(1);
        self.pending.lock().insert(req_id, tx);

        let write_result = {
            let mut w = self.write_half.lock();
            write_request(&mut *w, req_id, cmd, payload)
        };
        if let Err(e) = write_result {
            self.pending.lock().remove(&req_id);
            return Err(Error::Io(e));
        }

        let timeout = timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT);
        match rx.recv_timeout(timeout) {
            Ok(resp) => {
                if let Some(err) = Error::from_code(resp.error_code) {
                    if !matches!(err, Error::NotReady) {
                        return Err(err);
                    }
                }
                Ok(resp)
            }
            Err(_) => {
                self.pending.lock().remove(&req_id);
                Err(Error::TimeoutError(-5))
            }
        }
    }

    fn shutdown(&mut self) {
        self.reader_stop.store(true, Ordering::Release);
        if let Ok(stream) = self.write_half.lock().try_clone() {
            stream.shutdown(std::net::Shutdown::Both).ok();
        }
        if let Some(handle) = self.reader_thread.take() {
            handle.join().ok();
        }
    }
}

impl Drop for Transport {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn reader_loop(
    mut reader: BufReader<TcpStream>,
    pending: Arc<Mutex<HashMap<u32, Sender<ResponseFrame>>>>,
    alive: Arc<AtomicBool>,
    reader_stop: Arc<AtomicBool>,
    sink: StreamSink,
) {
    while !reader_stop.load(Ordering::Acquire) {
        match read_frame(&mut reader) {
            Ok(frame) => dispatch_frame(frame, &pending, &sink),
            Err(e) => {
                if reader_stop.load(Ordering::Acquire) {
                    break;
                }
                log::warn!("transport read failed, marking connection dead: {e}");
                alive.store(false, Ordering::Release);
                break;
            }
        }
    }
    log::info!("transport reader thread exiting");
}

fn dispatch_frame(frame: RawFrame, pending: &Mutex<HashMap<u32, Sender<ResponseFrame>>>, sink: &StreamSink) {
    if frame.is_response() {
        let req_id = frame.req_id;
        match frame.into_response() {
            Ok(resp) => {
                if let Some(tx) = pending.lock().remove(&req_id) {
                    let _ = tx.send(resp);
                }
            }
            Err(e) => log::debug!("malformed response frame: {e}"),
        }
    } else if frame.is_push() {
        sink.dispatch(frame.tag, frame.body);
    } else {
        log::debug!("dropping frame with unrecognized req_id/tag combination");
    }
}
