//! # Orthogonal Jukebox Demo
//!
//! One jukebox, two independent concerns sharing a single event loop:
//!
//! - **audio**: `idle` → `playing` → `idle`
//! - **lights**: `dim` ⇄ `bright`
//!
//! The two machines are composed into an orthogonal region: every event is
//! routed to whichever side recognizes it, so the audio track and the light
//! show advance independently without threads of their own.
//!
//! Run with: `RUST_LOG=info cargo run --example jukebox`

use std::sync::Arc;
use threaded_hsm::{Event, EventId, EventQueue, Hsm, Orthogonal, StateHandler, StateMachine, Transition};

#[derive(Debug, Clone, Copy)]
enum Signal {
    CoinIn = 1,
    TrackDone = 2,
    Dusk = 3,
    Dawn = 4,
}

impl From<Signal> for EventId {
    fn from(signal: Signal) -> EventId {
        EventId::new(signal as u32)
    }
}

struct Announce(&'static str);

impl StateHandler for Announce {
    fn on_entry(&mut self) {
        println!("  {}", self.0);
    }
}

fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp_millis()
        .init();

    let queue = Arc::new(EventQueue::new());

    let mut audio = StateMachine::new("audio", queue.clone());
    let idle = audio.add_state("idle", Announce("♪ audio idle"));
    let playing = audio.add_state("playing", Announce("♪ playing a track"));
    audio.add(Transition::new(idle, Signal::CoinIn, playing)).unwrap();
    audio.add(Transition::new(playing, Signal::TrackDone, idle)).unwrap();
    audio.set_start(idle).unwrap();

    let mut lights = StateMachine::new("lights", queue.clone());
    let dim = lights.add_state("dim", Announce("○ lights dim"));
    let bright = lights.add_state("bright", Announce("● lights bright"));
    lights.add(Transition::new(dim, Signal::Dusk, bright)).unwrap();
    lights.add(Transition::new(bright, Signal::Dawn, dim)).unwrap();
    lights.set_start(dim).unwrap();

    let jukebox = Orthogonal::new("jukebox", audio, lights);
    let mut hsm = Hsm::start(jukebox).expect("both regions are configured");

    hsm.push(Event::new(Signal::CoinIn)); // audio only
    hsm.push(Event::new(Signal::Dusk)); // lights only
    hsm.push(Event::new(Signal::TrackDone)); // audio only
    hsm.push(Event::new(Signal::Dawn)); // lights only

    std::thread::sleep(std::time::Duration::from_millis(200));
    hsm.stop().expect("clean shutdown");
    println!("jukebox shut down");
}
