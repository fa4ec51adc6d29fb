use std::rc::Rc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use overlay::config::OverlayConfig;
use overlay::controller::UiController;
use overlay::error::OverlayError;
use overlay::host::{Scope, SettingsStore, Socket};
use overlay::memory::{MemorySession, RecordingSocket};
use overlay::store::SharedWorld;
use overlay::sync::{Envelope, SessionHub};
use overlay::trackers::{META_CURRENCY_ID, NEGOTIATION_ID};
use panels::bounds::Surface;
use panels::geometry::{Point, Rect, Size};
use panels::input::Button;
use serde_json::{Map, Value, json};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;


#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("overlay error: {0}")]
    Overlay(#[from] OverlayError),
    #[error("panel {0} did not open")]
    NotOpen(&'static str),
    #[error("invalid JSON output: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "dsp-sandbox", about = "Scripted multi-session runs of the floating panel overlay")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// GM opens the negotiation tracker, edits it, and every session's view is printed.
    Negotiation(NegotiationArgs),
    /// Drag, lock, reset and resize one panel, then print its chrome state.
    Drag(DragArgs),
}

#[derive(Args, Debug, Default)]
struct NegotiationArgs {
    #[arg(long, default_value_t = 2)]
    players: usize,

    #[arg(long)]
    npc: Option<String>,

    #[arg(long, help = "hostile, suspicious, neutral, open or friendly")]
    attitude: Option<String>,

    #[arg(long = "motivation")]
    motivations: Vec<String>,

    #[arg(long = "pitfall")]
    pitfalls: Vec<String>,

    #[arg(long = "discover", help = "Entry id to reveal to players")]
    discovered: Vec<String>,

    #[arg(long = "reveal", help = "Counter to reveal: interest, patience or impression")]
    revealed: Vec<String>,

    #[arg(long, default_value_t = false)]
    end: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum PanelChoice {
    #[default]
    MetaCurrency,
    Negotiation,
}

impl PanelChoice {
    fn id(self) -> &'static str {
        match self {
            Self::MetaCurrency => META_CURRENCY_ID,
            Self::Negotiation => NEGOTIATION_ID,
        }
    }
}

#[derive(Args, Debug, Default)]
struct DragArgs {
    #[arg(long, value_enum, default_value_t = PanelChoice::MetaCurrency)]
    panel: PanelChoice,

    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    dx: f64,

    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    dy: f64,

    #[arg(long, default_value_t = false)]
    lock: bool,

    #[arg(long, default_value_t = false)]
    reset: bool,

    #[arg(long, requires = "canvas_height")]
    canvas_width: Option<f64>,

    #[arg(long, requires = "canvas_width")]
    canvas_height: Option<f64>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = OverlayConfig::from_env();
    let report = match cli.command {
        Command::Negotiation(args) => run_negotiation(&config, &args).await?,
        Command::Drag(args) => run_drag(&config, &args).await?,
    };
    print_json(&report)
}

// =============================================================================
// SESSIONS
// =============================================================================

struct Participant {
    label: String,
    session: MemorySession,
    rx: mpsc::Receiver<Envelope>,
    ui: UiController,
}

impl Participant {
    fn join(hub: &SessionHub, world: &SharedWorld, config: &OverlayConfig, label: String, gm: bool) -> Self {
        let (socket, rx) = hub.join();
        let socket: Rc<dyn Socket> = Rc::new(socket);
        let session = MemorySession::new(world.clone(), socket, gm);
        let ui = UiController::new(session.host(), config.clone());
        Self { label, session, rx, ui }
    }

    fn negotiation_view(&self) -> Value {
        if !self.ui.is_open(NEGOTIATION_ID) {
            return Value::Null;
        }
        self.session.renderer.last_context(NEGOTIATION_ID).unwrap_or(Value::Null)
    }
}

async fn deliver(players: &mut [Participant]) {
    for player in players {
        let handled = player.ui.drain(&mut player.rx).await;
        if handled > 0 {
            info!(session = %player.label, handled, "delivered broadcasts");
        }
    }
}

// =============================================================================
// NEGOTIATION
// =============================================================================

async fn run_negotiation(config: &OverlayConfig, args: &NegotiationArgs) -> Result<Value, CliError> {
    let hub = SessionHub::new();
    let world = SharedWorld::default();
    let mut gm = Participant::join(&hub, &world, config, "gm".to_owned(), true);
    let mut players: Vec<Participant> = (1..=args.players)
        .map(|n| Participant::join(&hub, &world, config, format!("player-{n}"), false))
        .collect();

    gm.ui.init().await?;
    for player in &mut players {
        player.ui.init().await?;
    }

    gm.ui.toggle_negotiation().await?;
    deliver(&mut players).await;
    if !gm.ui.is_open(NEGOTIATION_ID) {
        return Err(CliError::NotOpen(NEGOTIATION_ID));
    }

    for (action, payload) in script(args) {
        gm.ui.dispatch(NEGOTIATION_ID, action, &payload).await?;
        deliver(&mut players).await;
    }

    let mut report = Map::new();
    report.insert(gm.label.clone(), gm.negotiation_view());
    for player in &players {
        report.insert(player.label.clone(), player.negotiation_view());
    }
    Ok(Value::Object(report))
}

/// GM actions in the order they are applied.
fn script(args: &NegotiationArgs) -> Vec<(&'static str, Value)> {
    let mut steps = Vec::new();
    if let Some(name) = &args.npc {
        steps.push(("setNpcName", json!({ "name": name })));
    }
    if let Some(attitude) = &args.attitude {
        steps.push(("setAttitude", json!({ "attitude": attitude })));
    }
    for id in &args.motivations {
        steps.push(("addEntry", json!({ "list": "motivations", "id": id })));
    }
    for id in &args.pitfalls {
        steps.push(("addEntry", json!({ "list": "pitfalls", "id": id })));
    }
    for id in &args.discovered {
        let list = if args.pitfalls.contains(id) { "pitfalls" } else { "motivations" };
        steps.push(("toggleDiscovered", json!({ "list": list, "id": id })));
    }
    for field in &args.revealed {
        steps.push(("toggleVisible", json!({ "field": field })));
    }
    if args.end {
        steps.push(("endNegotiation", Value::Null));
    }
    steps
}

// =============================================================================
// DRAG
// =============================================================================

async fn run_drag(config: &OverlayConfig, args: &DragArgs) -> Result<Value, CliError> {
    let socket = Rc::new(RecordingSocket::default());
    let session = MemorySession::new(SharedWorld::default(), socket, true);
    let mut ui = UiController::new(session.host(), config.clone());
    let id = args.panel.id();

    match args.panel {
        PanelChoice::MetaCurrency => {
            ui.init_meta_currency().await?;
        }
        PanelChoice::Negotiation => {
            ui.toggle_negotiation().await?;
        }
    }

    if args.dx != 0.0 || args.dy != 0.0 {
        let start = Point::new(0.0, 0.0);
        let end = Point::new(args.dx, args.dy);
        ui.pointer_down(id, start, Button::Primary);
        ui.pointer_move(id, end);
        ui.pointer_up(id, end).await?;
    }
    if args.lock {
        ui.dispatch(id, "toggleLock", &Value::Null).await?;
    }
    if args.reset {
        ui.dispatch(id, "resetPosition", &Value::Null).await?;
    }
    if let (Some(width), Some(height)) = (args.canvas_width, args.canvas_height) {
        let viewport = session.surface.viewport();
        session.surface.resize(Some(Rect::new(0.0, 0.0, width, height)), Size::new(viewport.width.max(width), height));
        ui.window_resized();
        ui.animation_frame(id).await?;
    }

    let entry = ui.registry().get(id).ok_or(CliError::NotOpen(id))?;
    let keys = &entry.floating().config().keys;
    let mut persisted = Map::new();
    for key in [Some(&keys.position), Some(&keys.locked), Some(&keys.centered), keys.expanded.as_ref()]
        .into_iter()
        .flatten()
    {
        let value = session.settings.get(Scope::Client, &config.module_id, key).unwrap_or(Value::Null);
        persisted.insert(key.clone(), value);
    }

    Ok(json!({
        "panel": id,
        "state": entry.floating().state(),
        "element": entry.floating().position(),
        "persisted": persisted,
    }))
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
