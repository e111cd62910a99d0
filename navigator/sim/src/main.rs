//! Navigator Sim - Headless Navigation Scenario Runner
//!
//! Runs a scripted sequence of navigation requests against `navigator-core`
//! with logging stub views, ticking a fixed-rate frame clock between steps,
//! and prints every navigation event as a JSON line.
//!
//! # Usage
//!
//! ```bash
//! # Menu flow with a queued popup
//! navigator-sim show:MainMenu show:Gameplay popup:Pause popup:Quit:5 dismiss dismiss back
//!
//! # With a config file and slower frames
//! navigator-sim --config ./navigation.toml --fps 30 show:Gameplay
//!
//! # Verbose logging
//! RUST_LOG=navigator_core=debug navigator-sim show:MainMenu
//! ```
//!
//! # Environment Variables
//!
//! - `NAVIGATOR_CONFIG`: Configuration file path
//! - `NAVIGATOR_REDUCE_MOTION`: Force instant transitions
//! - `NAVIGATOR_FALLBACK_SCREEN`: Screen used by back when history is empty
//! - `RUST_LOG`: Log filter

mod script;

use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use navigator_core::config::{load_config, load_config_from_path};
use navigator_core::{
    CancelHandle, ConfigOverrides, InputRouter, Navigator, Popup, PopupId, Screen, ScreenId,
};

use script::Step;

/// Navigator Sim - scripted navigation scenarios
#[derive(Parser, Debug)]
#[command(name = "navigator-sim")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Navigation config file (default: the user config directory)
    #[arg(short = 'c', long, env = "NAVIGATOR_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Frame rate of the simulated clock
    #[arg(long, default_value_t = 60)]
    fps: u32,

    /// Frame limit per step while waiting for transitions to settle
    #[arg(long, default_value_t = 600)]
    max_frames: u32,

    /// Identifiers that resolve to no view
    #[arg(long, value_delimiter = ',')]
    missing: Vec<String>,

    /// Steps: show:ID[=PAYLOAD] clear:ID back hud nohud popup:ID[:PRIO][=PAYLOAD] dismiss cancel wait:N
    #[arg(required = true)]
    steps: Vec<Step>,
}

/// Stub view that logs its lifecycle
struct LoggingView {
    kind: &'static str,
    key: String,
}

impl Screen<String> for LoggingView {
    fn on_initialize(&mut self, _id: &ScreenId) {
        info!(kind = self.kind, view = %self.key, "initialize");
    }
    fn on_show(&mut self) {
        info!(kind = self.kind, view = %self.key, "show");
    }
    fn on_show_with(&mut self, payload: &String) {
        info!(kind = self.kind, view = %self.key, payload = %payload, "show");
    }
    fn on_hide(&mut self) {
        info!(kind = self.kind, view = %self.key, "hide");
    }
    fn on_dispose(&mut self) {
        info!(kind = self.kind, view = %self.key, "dispose");
    }
}

impl Popup<String> for LoggingView {
    fn on_initialize(&mut self, _id: &PopupId) {
        info!(kind = self.kind, view = %self.key, "initialize");
    }
    fn on_show(&mut self) {
        info!(kind = self.kind, view = %self.key, "show");
    }
    fn on_show_with(&mut self, payload: &String) {
        info!(kind = self.kind, view = %self.key, payload = %payload, "show");
    }
    fn on_dismiss(&mut self) {
        info!(kind = self.kind, view = %self.key, "dismiss");
    }
    fn on_dispose(&mut self) {
        info!(kind = self.kind, view = %self.key, "dispose");
    }
}

/// Input router that only logs the switches
struct LoggingRouter;

impl InputRouter for LoggingRouter {
    fn switch_to_ui(&mut self) {
        info!("input -> ui");
    }

    fn switch_to_player(&mut self) {
        info!("input -> player");
    }

    fn bind_cancel_action(&mut self, handle: CancelHandle) {
        info!(?handle, "cancel action bound");
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("navigator_sim=info".parse()?)
                .add_directive("navigator_core=info".parse()?),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let overrides = ConfigOverrides::from_env().context("Invalid navigator environment")?;
    let config = match &args.config {
        Some(path) => load_config_from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?
            .with_overrides(&overrides),
        None => load_config(&overrides)?,
    };

    let missing = Rc::new(args.missing.clone());
    let screens_missing = Rc::clone(&missing);
    let popups_missing = Rc::clone(&missing);

    let mut nav = Navigator::<String>::builder()
        .config(config)
        .screens(move |id: &ScreenId| -> Option<Box<dyn Screen<String>>> {
            if screens_missing.iter().any(|m| m == id.as_str()) {
                return None;
            }
            Some(Box::new(LoggingView {
                kind: "screen",
                key: id.to_string(),
            }))
        })
        .popups(move |id: &PopupId| -> Option<Box<dyn Popup<String>>> {
            if popups_missing.iter().any(|m| m == id.as_str()) {
                return None;
            }
            Some(Box::new(LoggingView {
                kind: "popup",
                key: id.to_string(),
            }))
        })
        .input_router(LoggingRouter)
        .on_cancel(|| info!("cancel with no popup visible"))
        .build()?;

    let (_, mut events) = nav.events_mut().subscribe_channel();
    let frame = Duration::from_secs_f64(1.0 / f64::from(args.fps.max(1)));
    let mut frames_run = 0_u64;

    for step in &args.steps {
        info!(%step, "step");
        match step {
            Step::Show { screen, payload: Some(p) } => nav.show_screen_with(screen.as_str(), p.clone()),
            Step::Show { screen, payload: None } => nav.show_screen(screen.as_str()),
            Step::Clear { screen } => nav.show_screen_clearing_history(screen.as_str()),
            Step::Back => nav.go_back(),
            Step::Hud => nav.show_hud(),
            Step::NoHud => nav.hide_hud(),
            Step::Popup {
                popup,
                priority,
                payload: Some(p),
            } => nav.show_popup_with(popup.as_str(), p.clone(), *priority),
            Step::Popup {
                popup,
                priority,
                payload: None,
            } => nav.show_popup(popup.as_str(), *priority),
            Step::Dismiss => nav.dismiss_popup(),
            Step::Cancel => nav.cancel_handle().trigger(),
            Step::Wait { frames } => {
                for _ in 0..*frames {
                    nav.tick(frame);
                }
                frames_run += u64::from(*frames);
            }
        }

        // Let the step play out, and deliver pending cancels
        let mut frames = 0;
        loop {
            nav.tick(frame);
            frames += 1;
            if !nav.is_transitioning() || frames >= args.max_frames {
                break;
            }
        }
        if nav.is_transitioning() {
            warn!(%step, frames, "step did not settle within the frame limit");
        }
        frames_run += u64::from(frames);

        while let Ok(event) = events.try_recv() {
            println!("{}", serde_json::to_string(&event)?);
        }
    }

    let summary = serde_json::json!({
        "current_screen": nav.current_screen(),
        "history": nav.history().collect::<Vec<_>>(),
        "popup": nav.current_popup(),
        "pending_popups": nav.pending_popups(),
        "input_mode": nav.input_mode(),
        "frames": frames_run,
    });
    println!("{summary}");

    nav.shutdown();
    Ok(())
}
