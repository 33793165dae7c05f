//! Traffic Light State Machine
//!
//! This example demonstrates a nested machine driven by timeouts.
//!
//! Key concepts:
//! - Composite states (`Operating` cycles through its lights)
//! - Declarative timeouts moving between the lights
//! - An ancestor transition (`Fault`) that leaves any light
//! - A tokio loop sleeping until the next deadline, then pulsing
//!
//! Run with: RUST_LOG=hfsm=debug cargo run --example traffic_light

use hfsm::{event_enum, state_enum, Machine, MachineConfig};
use std::time::Duration;
use tokio::time::Instant;
use tracing::info;

state_enum! {
    enum Light {
        Operating,
        Red,
        Green,
        Yellow,
        Flashing,
        Lit,
        Dark,
    }
}

event_enum! {
    enum Signal {
        Fault,
        Repair,
    }
}

fn build() -> Result<Machine<Light, Signal>, hfsm::BuildError> {
    let mut builder = Machine::<Light, Signal>::builder()
        .state(Light::Operating)?
        .substate(Light::Operating, Light::Red)?
        .substate(Light::Operating, Light::Green)?
        .substate(Light::Operating, Light::Yellow)?
        .state(Light::Flashing)?
        .substate(Light::Flashing, Light::Lit)?
        .substate(Light::Flashing, Light::Dark)?
        .initial(Light::Operating)
        .default_transition(Light::Operating, Light::Red)?
        .default_transition(Light::Flashing, Light::Lit)?
        .timeout(Light::Red, Duration::from_millis(400), Light::Green)?
        .timeout(Light::Green, Duration::from_millis(400), Light::Yellow)?
        .timeout(Light::Yellow, Duration::from_millis(150), Light::Red)?
        .timeout(Light::Lit, Duration::from_millis(200), Light::Dark)?
        .timeout(Light::Dark, Duration::from_millis(200), Light::Lit)?
        .transition(Light::Operating, Signal::Fault, Light::Flashing)?
        .transition(Light::Flashing, Signal::Repair, Light::Operating)?
        .config(MachineConfig::default().with_history_capacity(32));

    for light in [
        Light::Red,
        Light::Green,
        Light::Yellow,
        Light::Lit,
        Light::Dark,
    ] {
        builder = builder.on_enter(light, move |event, _| {
            info!("{light:?} on ({})", event.kind().label());
            Ok(())
        })?;
    }

    builder.build_validated()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("info,hfsm=debug")
        .init();

    println!("=== Traffic Light State Machine ===\n");

    let mut machine = build()?;
    machine.start()?;

    let started = Instant::now();
    let mut script = vec![
        (Duration::from_millis(1500), Signal::Fault),
        (Duration::from_millis(2300), Signal::Repair),
    ]
    .into_iter()
    .peekable();

    while started.elapsed() < Duration::from_secs(3) {
        let until_timer = machine.time_until_next_timeout();
        let until_signal = script
            .peek()
            .map(|(at, _)| at.saturating_sub(started.elapsed()))
            .unwrap_or(Duration::MAX);

        if until_signal <= until_timer {
            tokio::time::sleep(until_signal).await;
            if let Some((_, signal)) = script.next() {
                info!("operator signal: {signal:?}");
                machine.post_event(signal)?;
            }
        } else {
            tokio::time::sleep(until_timer).await;
            machine.pulse()?;
        }
    }

    println!("\nActive chain: {:?}", machine.active_chain());
    println!("Visited: {:?}", machine.history().get_path());
    Ok(())
}
