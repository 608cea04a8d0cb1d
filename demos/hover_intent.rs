//! Hover intent: highlight an element only when the pointer rests on it.
//!
//! Entering `#target` starts a timer. If the timer expires before the pointer leaves, the `hover`
//! class is toggled on. Leaving restarts the timer, and once it expires without a new entry the
//! class is toggled off again. Leaving too early rejects the run and cancels the timer.
//!
//! The event stream is scripted; timers expire when the script says `timeout`.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example hover_intent
//! cargo run --example hover_intent -- --script enter,move,exit,enter,move,timeout
//! cargo run --example hover_intent -- --dot hover.dot
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::eyre;
use log::info;

use ltl_rs::effect::{Effect, RecordingSink, SinkCall};
use ltl_rs::event::Event;
use ltl_rs::{Automaton, Formula, Proposition};

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Comma-separated events: enter, exit, move, timeout.
    #[arg(long, value_name = "EVENTS", default_value = "enter,move,timeout,move,exit,move,timeout")]
    script: String,

    /// Hover delay, in milliseconds.
    #[arg(long, value_name = "INT", default_value = "300")]
    delay: u64,

    /// Element the monitor watches.
    #[arg(long, value_name = "SELECTOR", default_value = "#target")]
    target: String,

    /// Write the automaton in DOT format to this file.
    #[arg(long, value_name = "FILE")]
    dot: Option<PathBuf>,

    /// Show the monitor's debug log.
    #[arg(short, long)]
    verbose: bool,
}

/// `enter! ∧ X(¬exit U (timeout! ∧ X(True U (exit! ∧ X(¬enter U timeout!)))))`
fn hover_intent(target: &str, delay: Duration) -> Formula {
    let enter = Proposition::new("mouseenter").on(target);
    let exit = Proposition::new("mouseexit").on(target);
    let timer = Effect::start_timer(delay);
    let toggle = Formula::prop(Proposition::timeout().with_trigger(Effect::toggle_class(target, "hover")));

    Formula::and(
        Formula::prop(enter.clone().with_trigger(timer.clone())),
        Formula::next(Formula::until(
            Formula::not(Formula::prop(exit.clone())),
            Formula::and(
                toggle.clone(),
                Formula::next(Formula::eventually(Formula::and(
                    Formula::prop(exit.with_trigger(timer)),
                    Formula::next(Formula::until(Formula::not(Formula::prop(enter)), toggle)),
                ))),
            ),
        )),
    )
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Cli::parse();

    simplelog::TermLogger::init(
        if args.verbose {
            simplelog::LevelFilter::Debug
        } else {
            simplelog::LevelFilter::Info
        },
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    println!("args = {:?}", args);

    let formula = hover_intent(&args.target, Duration::from_millis(args.delay));
    println!("formula = {}", formula);

    let mut monitor = Automaton::compile(&formula, RecordingSink::new())?;
    print!("{}", monitor.debug_string());

    if let Some(path) = &args.dot {
        std::fs::write(path, monitor.to_dot()?)?;
        info!("Wrote automaton to {}", path.display());
    }

    for call in monitor.sink_mut().drain() {
        if let SinkCall::Subscribe(shape) = call {
            println!("subscribed to {}", shape);
        }
    }

    for step in args.script.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let event = match step {
            "enter" => Event::on("mouseenter", args.target.as_str()),
            "exit" => Event::on("mouseexit", args.target.as_str()),
            "move" => Event::on("mousemove", args.target.as_str()),
            "timeout" => match monitor.sink_mut().expire_pending() {
                Some(event) => event,
                None => {
                    println!("{:>8} | no timer pending, skipped", step);
                    continue;
                }
            },
            other => return Err(eyre!("unknown script step '{}'", other)),
        };

        monitor.accept(event);
        let calls = monitor.sink_mut().drain();
        println!("{:>8} | {:?}", step, monitor.current_state_names());
        for call in calls {
            match call {
                SinkCall::Schedule(id, delay) => println!("         | start {} ({:?})", id, delay),
                SinkCall::Cancel(Some(id)) => println!("         | cancel {}", id),
                SinkCall::Cancel(None) => {}
                SinkCall::Apply { selector, kind, .. } => println!("         | {} on {}", kind, selector),
                SinkCall::Subscribe(shape) => println!("         | subscribed to {}", shape),
            }
        }
    }

    print!("{}", monitor.dump_state());

    Ok(())
}
