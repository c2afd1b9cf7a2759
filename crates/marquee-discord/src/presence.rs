//! Discord Rich Presence sink.
//!
//! Runs a `DiscordIpcClient` on a dedicated OS thread (IPC is blocking) and
//! exposes an async handle over a channel. Every command is answered so the
//! engine knows whether the presence actually changed. Connects lazily and
//! reconnects after a failed write.

use discord_rich_presence::{activity, DiscordIpc, DiscordIpcClient};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use marquee_core::{PresenceError, PresenceSink, Presentation};

use crate::error::DiscordError;

/// Discord rejects activity strings longer than this.
const MAX_FIELD_CHARS: usize = 128;

/// Owned, IPC-ready rendering of a [`Presentation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityPayload {
    /// Shown in place of the application name.
    pub name: String,
    pub details: String,
    pub state: String,
    pub large_image: &'static str,
    pub large_text: &'static str,
    pub small_image: &'static str,
    pub small_text: String,
    /// Unix seconds.
    pub start: Option<i64>,
    pub end: Option<i64>,
}

impl ActivityPayload {
    pub fn from_presentation(p: &Presentation) -> Self {
        Self {
            name: clip(&p.main_line),
            details: clip(&p.details),
            state: clip(&p.state_text),
            large_image: p.large_image(),
            large_text: Presentation::LARGE_TEXT,
            small_image: p.small_image(),
            small_text: clip(&p.small_text()),
            start: p.window.map(|w| w.start.timestamp()),
            end: p.window.map(|w| w.end.timestamp()),
        }
    }

    fn to_activity(&self) -> activity::Activity<'_> {
        let mut payload = activity::Activity::new()
            .activity_type(activity::ActivityType::Watching)
            .details(&self.details)
            .assets(
                activity::Assets::new()
                    .large_image(self.large_image)
                    .large_text(self.large_text)
                    .small_image(self.small_image)
                    .small_text(&self.small_text),
            );
        if !self.name.is_empty() {
            payload = payload.name(&self.name);
        }
        if !self.state.is_empty() {
            payload = payload.state(&self.state);
        }
        if let (Some(start), Some(end)) = (self.start, self.end) {
            payload = payload.timestamps(activity::Timestamps::new().start(start).end(end));
        }
        payload
    }
}

fn clip(s: &str) -> String {
    s.chars().take(MAX_FIELD_CHARS).collect()
}

type Reply = oneshot::Sender<Result<(), PresenceError>>;

/// Commands sent to the presence actor thread.
enum PresenceCommand {
    Set { payload: ActivityPayload, reply: Reply },
    Clear { reply: Reply },
    Shutdown,
}

/// Cloneable handle to the presence actor thread.
#[derive(Clone)]
pub struct RichPresence {
    tx: mpsc::UnboundedSender<PresenceCommand>,
}

impl RichPresence {
    /// Spawn the actor thread for the given application id.
    pub fn start(application_id: String) -> Result<Self, DiscordError> {
        let (tx, rx) = mpsc::unbounded_channel();

        std::thread::Builder::new()
            .name("discord-rpc".into())
            .spawn(move || actor_loop(application_id, rx))?;

        Ok(Self { tx })
    }

    /// Clear the activity and close the IPC connection.
    pub fn shutdown(&self) {
        let _ = self.tx.send(PresenceCommand::Shutdown);
    }

    async fn request(
        &self,
        make: impl FnOnce(Reply) -> PresenceCommand,
    ) -> Result<(), PresenceError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .map_err(|_| PresenceError("presence thread stopped".into()))?;
        rx.await
            .unwrap_or_else(|_| Err(PresenceError("presence thread stopped".into())))
    }
}

impl PresenceSink for RichPresence {
    async fn set_presence(&self, presentation: &Presentation) -> Result<(), PresenceError> {
        let payload = ActivityPayload::from_presentation(presentation);
        self.request(|reply| PresenceCommand::Set { payload, reply })
            .await
    }

    async fn clear_presence(&self) -> Result<(), PresenceError> {
        self.request(|reply| PresenceCommand::Clear { reply }).await
    }
}

/// Lazily connected IPC client.
struct Connection {
    application_id: String,
    client: Option<DiscordIpcClient>,
}

impl Connection {
    fn ensure(&mut self) -> Result<&mut DiscordIpcClient, PresenceError> {
        if self.client.is_none() {
            let mut ipc = DiscordIpcClient::new(&self.application_id);
            ipc.connect()
                .map_err(|e| PresenceError(format!("Discord not available: {e}")))?;
            info!("Connected to Discord IPC");
            self.client = Some(ipc);
        }
        self.client
            .as_mut()
            .ok_or_else(|| PresenceError("Discord not available".into()))
    }

    /// Drop the connection so the next command reconnects.
    fn reset(&mut self) {
        if let Some(mut ipc) = self.client.take() {
            let _ = ipc.close();
        }
    }

    fn set(&mut self, payload: &ActivityPayload) -> Result<(), PresenceError> {
        let result = self
            .ensure()?
            .set_activity(payload.to_activity())
            .map_err(|e| PresenceError(e.to_string()));
        if result.is_err() {
            self.reset();
        }
        result
    }

    fn clear(&mut self) -> Result<(), PresenceError> {
        // Nothing is shown while disconnected.
        let Some(ipc) = self.client.as_mut() else {
            return Ok(());
        };
        let result = ipc
            .clear_activity()
            .map_err(|e| PresenceError(e.to_string()));
        if result.is_err() {
            self.reset();
        }
        result
    }
}

/// The actor loop: owns the IPC client and processes commands.
fn actor_loop(application_id: String, mut rx: mpsc::UnboundedReceiver<PresenceCommand>) {
    let mut conn = Connection {
        application_id,
        client: None,
    };

    while let Some(cmd) = rx.blocking_recv() {
        match cmd {
            PresenceCommand::Set { payload, reply } => {
                let result = conn.set(&payload);
                if let Err(e) = &result {
                    debug!(error = %e, "Failed to set Discord activity");
                }
                let _ = reply.send(result);
            }
            PresenceCommand::Clear { reply } => {
                let _ = reply.send(conn.clear());
            }
            PresenceCommand::Shutdown => {
                let _ = conn.clear();
                conn.reset();
                break;
            }
        }
    }
}
