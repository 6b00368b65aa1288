//! Streams synthetic hand landmarks over UDP so `holo_tree --landmarks`
//! can be driven without a camera.

use std::f32::consts::PI;
use std::net::UdpSocket;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use holo_tree::hand::tracker::LandmarkPacket;
use holo_tree::hand::{HandLandmarks, Landmark, LANDMARK_COUNT};

#[derive(Parser, Debug, Clone)]
#[command(name = "landmark_sim")]
pub struct Cli {
    /// Address `holo_tree --landmarks` is listening on.
    #[arg(long, default_value = "127.0.0.1:7070")]
    pub target: String,

    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u32).range(1..=240))]
    pub fps: u32,

    #[arg(long, value_enum, default_value_t = Pattern::Cycle)]
    pub pattern: Pattern,

    /// Seconds each pose is held in `cycle`.
    #[arg(long, default_value_t = 3.0)]
    pub hold: f32,

    /// Stop after this many seconds.
    #[arg(long)]
    pub duration: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Pattern {
    Cycle,
    Open,
    Pinch,
    Hover,
    Fist,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pose {
    Open,
    Pinch,
    Hover,
    Fist,
}

const CYCLE: [Option<Pose>; 6] = [
    Some(Pose::Hover),
    Some(Pose::Pinch),
    Some(Pose::Hover),
    Some(Pose::Open),
    Some(Pose::Fist),
    None,
];

fn main() -> Result<()> {
    let cli = Cli::parse();
    let socket = UdpSocket::bind("0.0.0.0:0").context("bind local udp socket")?;
    socket
        .connect(&cli.target)
        .with_context(|| format!("connect to {}", cli.target))?;

    println!("streaming {:?} landmarks to {} @ {} fps", cli.pattern, cli.target, cli.fps);

    let frame = Duration::from_secs_f32(1.0 / cli.fps as f32);
    let start = Instant::now();
    loop {
        let now = Instant::now();
        let t = now.duration_since(start).as_secs_f32();
        if cli.duration.is_some_and(|d| t >= d) {
            break;
        }

        let pose = pose_at(cli.pattern, t, cli.hold);
        let (cx, cy) = wander(t);
        let hand = pose.map(|p| synthetic_hand(p, cx, cy));
        let bytes = serde_json::to_vec(&LandmarkPacket::from_hand(hand.as_ref()))?;
        if let Err(err) = socket.send(&bytes) {
            // Nobody listening yet; keep trying.
            eprintln!("send failed: {err}");
        }

        let spent = now.elapsed();
        if spent < frame {
            thread::sleep(frame - spent);
        }
    }
    Ok(())
}

pub fn pose_at(pattern: Pattern, t: f32, hold: f32) -> Option<Pose> {
    match pattern {
        Pattern::Cycle => {
            let step = (t / hold.max(0.1)) as usize % CYCLE.len();
            CYCLE[step]
        }
        Pattern::Open => Some(Pose::Open),
        Pattern::Pinch => Some(Pose::Pinch),
        Pattern::Hover => Some(Pose::Hover),
        Pattern::Fist => Some(Pose::Fist),
        Pattern::None => None,
    }
}

/// Slow Lissajous drift of the hand centre across the image.
pub fn wander(t: f32) -> (f32, f32) {
    (0.5 + 0.25 * (t * 0.5).cos(), 0.5 + 0.2 * (t * 0.7).sin())
}

/// Wrist below `(cx, cy)`, five fingers fanned upward with four joints each.
pub fn synthetic_hand(pose: Pose, cx: f32, cy: f32) -> HandLandmarks {
    let reach = match pose {
        Pose::Open => 0.34,
        Pose::Pinch => 0.30,
        Pose::Hover => 0.22,
        Pose::Fist => 0.09,
    };
    let wrist = (cx, cy + 0.2);

    let mut hand = [Landmark::default(); LANDMARK_COUNT];
    hand[0] = Landmark::new(wrist.0, wrist.1, 0.0);
    for finger in 0..5 {
        let angle = (-60.0 + 30.0 * finger as f32) * PI / 180.0;
        let (dx, dy) = (angle.sin(), -angle.cos());
        for joint in 1..=4 {
            let d = reach * joint as f32 / 4.0;
            hand[finger * 4 + joint] =
                Landmark::new(wrist.0 + dx * d, wrist.1 + dy * d, -0.01 * joint as f32);
        }
    }

    if pose == Pose::Pinch {
        let (thumb, index) = (hand[4], hand[8]);
        let mx = (thumb.x + index.x) / 2.0;
        let my = (thumb.y + index.y) / 2.0;
        hand[4] = Landmark::new(mx - 0.01, my, thumb.z);
        hand[8] = Landmark::new(mx + 0.01, my, index.z);
    }
    hand
}
