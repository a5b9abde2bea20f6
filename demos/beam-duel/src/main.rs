use roomsync::prelude::*;
use roomsync::tick::TickScheduler;
use tracing::info;

type Client = GameClient<LoopbackService, SceneLog, DynPreferences>;

// ---------------------------------------------------------------------------
// Console collaborators
// ---------------------------------------------------------------------------

struct ConsoleBeams {
    label: String,
    active: bool,
}

impl BeamVisual for ConsoleBeams {
    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, active: bool) {
        if self.active != active {
            info!(avatar = %self.label, active, "beams toggled");
        }
        self.active = active;
    }
}

struct ConsoleCamera(String);

impl CameraFollow for ConsoleCamera {
    fn start_following(&mut self) {
        info!(avatar = %self.0, "camera following");
    }
}

fn beams(label: &str) -> Option<Box<dyn BeamVisual>> {
    Some(Box::new(ConsoleBeams {
        label: label.to_string(),
        active: true,
    }))
}

// ---------------------------------------------------------------------------
// Duel
// ---------------------------------------------------------------------------

fn player(relay: &LoopbackRelay, config: &ClientConfig, name: &str) -> Result<Client, ClientError> {
    let mut client = GameClient::new(
        config.clone(),
        relay.client(),
        SceneLog::new(),
        config.open_preferences()?,
    );
    client.set_beam_factory(Box::new(|view| beams(&format!("mirror {view}"))));
    client.set_player_name(name)?;
    client.connect()?;
    client.pump_events()?;
    Ok(client)
}

/// Outcome of a duel, as each side sees the guest's avatar.
#[derive(Debug)]
struct DuelReport {
    ticks: u64,
    guest_health_local: f32,
    guest_health_on_host: f32,
}

/// Host holds the trigger; the guest stands in the beam.
async fn duel(config: ClientConfig, ticks: u64) -> Result<DuelReport, ClientError> {
    let relay = LoopbackRelay::new();
    let mut host = player(&relay, &config, "host")?;
    let mut guest = player(&relay, &config, "guest")?;
    host.pump_events()?;
    guest.pump_events()?;

    let host_view = host.spawn_avatar(beams("host"), Some(Box::new(ConsoleCamera("host".into()))))?;
    let guest_view = guest.spawn_avatar(beams("guest"), Some(Box::new(ConsoleCamera("guest".into()))))?;

    let mut scheduler = TickScheduler::new(config.tick.clone());
    for _ in 0..ticks {
        let tick = scheduler.wait_for_tick().await;

        if let Some(avatar) = host.avatar_mut(host_view) {
            avatar.process_input(FireInput::Down);
        }
        if let Some(avatar) = guest.avatar_mut(guest_view) {
            if tick.tick == 1 {
                avatar.contact_begin("HostBeam");
            } else {
                avatar.contact_stay("HostBeam", tick.dt_secs());
            }
        }

        host.sync_tick()?;
        guest.sync_tick()?;
    }
    // Deliver the guest's last tick.
    host.pump_events()?;

    let guest_health_local = guest.avatar(guest_view).map_or(f32::NAN, |a| a.health());
    let guest_health_on_host = host.avatar(guest_view).map_or(f32::NAN, |a| a.health());

    guest.leave_room()?;
    guest.pump_events()?;
    host.pump_events()?;
    info!(scene = ?host.scenes().current(), "guest left");

    Ok(DuelReport {
        ticks,
        guest_health_local,
        guest_health_on_host,
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    roomsync::logging::init();

    let config = match std::env::args().nth(1) {
        Some(path) => ClientConfig::load(path)?,
        None => ClientConfig::default(),
    };

    let report = duel(config, 20).await?;
    info!(
        ticks = report.ticks,
        guest = report.guest_health_local,
        guest_seen_by_host = report.guest_health_on_host,
        "duel over"
    );
    Ok(())
}
