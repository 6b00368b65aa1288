use crate::hand::classifier::{HandLandmarks, Landmark, LandmarkClassifier, LANDMARK_COUNT};
use crate::signal::{HandSignal, SharedHandSignal};
use serde::{Deserialize, Serialize};
use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

pub const POLL_TIMEOUT: Duration = Duration::from_millis(100);
/// Without a frame for this long the hand is treated as lost.
pub const LOST_AFTER: Duration = Duration::from_secs(1);

const MAX_DATAGRAM: usize = 16 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum LandmarkError {
    #[error("malformed landmark packet: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected 21 landmarks, got {0}")]
    Count(usize),
    #[error("landmark {0} has a non-finite coordinate")]
    NonFinite(usize),
}

/// One datagram: every detected hand as a list of `[x, y, z]` keypoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LandmarkPacket {
    #[serde(default)]
    pub hands: Vec<Vec<[f32; 3]>>,
}

impl LandmarkPacket {
    pub fn from_hand(hand: Option<&HandLandmarks>) -> Self {
        let hands = hand
            .map(|h| vec![h.iter().map(|l| [l.x, l.y, l.z]).collect()])
            .unwrap_or_default();
        Self { hands }
    }
}

/// Decodes a datagram. Only the first hand is considered.
pub fn parse_packet(bytes: &[u8]) -> Result<Option<HandLandmarks>, LandmarkError> {
    let packet: LandmarkPacket = serde_json::from_slice(bytes)?;
    let Some(points) = packet.hands.first() else {
        return Ok(None);
    };
    if points.len() != LANDMARK_COUNT {
        return Err(LandmarkError::Count(points.len()));
    }

    let mut hand = [Landmark::default(); LANDMARK_COUNT];
    for (i, (dst, p)) in hand.iter_mut().zip(points).enumerate() {
        if !p.iter().all(|v| v.is_finite()) {
            return Err(LandmarkError::NonFinite(i));
        }
        *dst = Landmark::new(p[0], p[1], p[2]);
    }
    Ok(Some(hand))
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// A camera frame was processed; `None` means no hand in view.
    Frame(Option<HandLandmarks>),
    /// Nothing arrived within the poll timeout.
    Idle,
}

/// Anything that delivers hand keypoint frames. Polled from the tracker thread.
pub trait LandmarkFeed: Send + 'static {
    fn poll(&mut self) -> io::Result<FeedEvent>;
}

pub struct UdpLandmarkFeed {
    socket: UdpSocket,
    buf: Vec<u8>,
}

impl UdpLandmarkFeed {
    pub fn bind(addr: &str) -> io::Result<Self> {
        let socket = UdpSocket::bind(addr)?;
        socket.set_read_timeout(Some(POLL_TIMEOUT))?;
        Ok(Self {
            socket,
            buf: vec![0u8; MAX_DATAGRAM],
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

impl LandmarkFeed for UdpLandmarkFeed {
    fn poll(&mut self) -> io::Result<FeedEvent> {
        match self.socket.recv_from(&mut self.buf) {
            Ok((n, _)) => match parse_packet(&self.buf[..n]) {
                Ok(hand) => Ok(FeedEvent::Frame(hand)),
                Err(err) => {
                    tracing::debug!("skipping landmark datagram: {err}");
                    Ok(FeedEvent::Idle)
                }
            },
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                ) =>
            {
                Ok(FeedEvent::Idle)
            }
            Err(err) => Err(err),
        }
    }
}

/// Runs a landmark feed on its own thread and publishes the latest `HandSignal`.
pub struct HandTracker {
    signal: Arc<SharedHandSignal>,
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl HandTracker {
    pub fn spawn<F: LandmarkFeed>(feed: F) -> Self {
        let signal = Arc::new(SharedHandSignal::new());
        let stop = Arc::new(AtomicBool::new(false));
        let signal_for_thread = Arc::clone(&signal);
        let stop_for_thread = Arc::clone(&stop);

        let handle = thread::Builder::new()
            .name("hand-tracker".into())
            .spawn(move || track_loop(feed, &stop_for_thread, &signal_for_thread));

        let handle = match handle {
            Ok(h) => Some(h),
            Err(err) => {
                tracing::error!("failed to start hand tracker thread: {err}");
                None
            }
        };

        Self {
            signal,
            stop,
            handle,
        }
    }

    /// A tracker that never reports a hand.
    pub fn disabled() -> Self {
        Self {
            signal: Arc::new(SharedHandSignal::new()),
            stop: Arc::new(AtomicBool::new(true)),
            handle: None,
        }
    }

    /// Listens for landmark datagrams on `addr`. Bind failures degrade to a disabled tracker.
    pub fn connect(addr: &str) -> Self {
        match UdpLandmarkFeed::bind(addr) {
            Ok(feed) => {
                tracing::info!("hand tracking: listening for landmarks on {addr}");
                Self::spawn(feed)
            }
            Err(err) => {
                tracing::warn!("hand tracking unavailable ({addr}): {err}");
                Self::disabled()
            }
        }
    }

    pub fn signal(&self) -> Arc<SharedHandSignal> {
        Arc::clone(&self.signal)
    }

    pub fn is_active(&self) -> bool {
        self.handle.is_some()
    }

    /// HUD label for the hand source, with the age of the last published signal.
    pub fn status(&self) -> String {
        if !self.is_active() {
            return "mouse".to_string();
        }
        let age_ms = self.signal.age_ms();
        if age_ms > 0.0 {
            format!("udp+mouse ({age_ms:.0}ms)")
        } else {
            "udp+mouse (waiting)".to_string()
        }
    }

    /// Joins the feed thread, then settles the shared signal to "no hand".
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(h) = self.handle.take() {
            if h.join().is_err() {
                tracing::error!("hand tracker thread panicked");
            }
            tracing::info!("hand tracking stopped");
        }
        self.signal.store(HandSignal::absent());
    }
}

impl Drop for HandTracker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn track_loop<F: LandmarkFeed>(mut feed: F, stop: &AtomicBool, signal: &SharedHandSignal) {
    let mut classifier = LandmarkClassifier::new();
    let mut last_frame: Option<Instant> = None;

    while !stop.load(Ordering::Relaxed) {
        match feed.poll() {
            Ok(FeedEvent::Frame(hand)) => {
                signal.store(classifier.classify(hand.as_ref()));
                last_frame = Some(Instant::now());
                continue;
            }
            Ok(FeedEvent::Idle) => {}
            Err(err) => {
                tracing::warn!("landmark feed error: {err}");
                thread::sleep(POLL_TIMEOUT);
            }
        }

        // Quiet and failing feeds both lose the hand.
        if last_frame.is_some_and(|t| t.elapsed() >= LOST_AFTER) {
            tracing::debug!("no landmark frame for {LOST_AFTER:?}; hand lost");
            signal.store(classifier.classify(None));
            last_frame = None;
        }
    }
}
