//! # Hierarchical Player Demo
//!
//! A media player modeled as a nested state machine:
//!
//! - **player** (root): `stopped`, `playing`, `off` (stop state)
//! - **playing** is itself a machine: `normal` ⇄ `fast_forward`
//!
//! The speed events only exist inside `playing`; `stop` and `power_off`
//! bubble up to the root from wherever the player currently is. The machine
//! runs on its own thread while `main` plays the role of a remote control.
//!
//! Run with: `RUST_LOG=info cargo run --example player`

use std::sync::Arc;
use threaded_hsm::{
    Event, EventId, EventQueue, Hsm, NoopState, StateHandler, StateMachine, Transition,
};

#[derive(Debug, Clone, Copy)]
enum Remote {
    Play = 1,
    Stop = 2,
    FastForward = 3,
    NormalSpeed = 4,
    PowerOff = 5,
}

impl From<Remote> for EventId {
    fn from(button: Remote) -> EventId {
        EventId::new(button as u32)
    }
}

struct Announce(&'static str);

impl StateHandler for Announce {
    fn on_entry(&mut self) {
        println!("  ▶ {}", self.0);
    }
}

fn build_player(queue: &Arc<EventQueue>) -> StateMachine {
    // nested speed machine, only alive while the player is playing
    let mut playing = StateMachine::new("playing", queue.clone());
    let normal = playing.add_state("normal", Announce("playing at normal speed"));
    let fast = playing.add_state("fast_forward", Announce("fast-forwarding"));
    playing
        .add(Transition::new(normal, Remote::FastForward, fast))
        .unwrap();
    playing
        .add(Transition::new(fast, Remote::NormalSpeed, normal))
        .unwrap();
    playing.set_start(normal).unwrap();

    let mut player = StateMachine::new("player", queue.clone());
    let stopped = player.add_state("stopped", Announce("stopped"));
    let playing_id = player.add_machine(playing);
    let off = player.add_state("off", NoopState);
    player
        .add(Transition::new(stopped, Remote::Play, playing_id))
        .unwrap();
    player
        .add(Transition::new(playing_id, Remote::Stop, stopped))
        .unwrap();
    player
        .add(
            Transition::new(stopped, Remote::PowerOff, off)
                .with_action(|_| println!("  ▶ powering off")),
        )
        .unwrap();
    player.set_start(stopped).unwrap();
    player.set_stop(off).unwrap();
    player
}

fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp_millis()
        .init();

    let queue = Arc::new(EventQueue::new());
    let mut hsm = Hsm::start(build_player(&queue)).expect("player is fully configured");

    println!("remote: play");
    hsm.push(Event::new(Remote::Play));
    println!("remote: fast-forward");
    hsm.push(Event::new(Remote::FastForward));
    println!("remote: normal speed");
    hsm.push(Event::new(Remote::NormalSpeed));
    println!("remote: stop");
    hsm.push(Event::new(Remote::Stop));

    // fast-forward while stopped: nobody handles it, the engine logs an
    // error line and keeps going
    hsm.push(Event::new(Remote::FastForward));

    println!("remote: power off");
    hsm.push(Event::new(Remote::PowerOff));

    hsm.wait().expect("player shuts down by itself");
    println!("player terminated");
}
