use crate::action::Plan;
use crate::config::Config;
use crate::messages::Inbound;
use crate::report::SessionOutcome;
use crate::session::{Session, Step};
use crate::transport::{Channel, WebSocketChannel};

use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// Drives one session over an open channel.
///
/// The state machine decides what to send; this loop only moves messages,
/// applies the settle pause and watches for Ctrl+C. The channel is closed in
/// [`App::finish`], which consumes the app, so it happens exactly once.
pub struct App<C: Channel> {
    channel: C,
    session: Session,
    settle_delay: Duration,
    response_timeout: Option<Duration>,
    shutdown: watch::Receiver<bool>,
}

impl<C: Channel> App<C> {
    pub fn new(channel: C, config: &Config, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            channel,
            session: Session::new(),
            settle_delay: config.settle_delay(),
            response_timeout: config.response_timeout(),
            shutdown,
        }
    }

    pub async fn run(mut self, plan: Plan) -> SessionOutcome {
        let step = self.session.open(plan);
        if let Some(outcome) = self.apply(step).await {
            return self.finish(outcome).await;
        }
        // One deadline per awaited request; chatter from the server does not extend it
        let mut deadline = self.arm_deadline();

        loop {
            tracing::debug!("Main loop: waiting for response in {:?}", self.session.state());

            let received = tokio::select! {
                received = next_inbound(&mut self.channel, self.response_timeout, deadline) => Some(received),
                _ = interrupted(&mut self.shutdown) => None,
            };

            let inbound = match received {
                None => {
                    tracing::info!("Received Ctrl+C, shutting down");
                    return self.finish(SessionOutcome::Interrupted).await;
                }
                Some(Err(outcome)) => return self.finish(outcome).await,
                Some(Ok(inbound)) => inbound,
            };

            match inbound {
                Inbound::Response(response) => {
                    tracing::info!("Received: {:?}", response);
                    let step = self.session.handle(&response);
                    let sends = step.send.is_some();
                    if let Some(outcome) = self.apply(step).await {
                        return self.finish(outcome).await;
                    }
                    if sends {
                        deadline = self.arm_deadline();
                    }
                }
                Inbound::Event(kind) => tracing::debug!("Ignoring event {}", kind),
                Inbound::Unrecognized(value) => {
                    tracing::warn!("Ignoring unrecognized message: {}", value)
                }
            }
        }
    }

    fn arm_deadline(&self) -> Option<Instant> {
        self.response_timeout.map(|limit| Instant::now() + limit)
    }

    /// Carry out a step. Returns the outcome once the session is over.
    async fn apply(&mut self, step: Step) -> Option<SessionOutcome> {
        if let Some(outcome) = step.finish {
            return Some(outcome);
        }
        let outgoing = step.send?;

        if outgoing.settle {
            tracing::info!(
                "Waiting {:?} for the replay buffer to become active",
                self.settle_delay
            );
            let settled = tokio::select! {
                _ = tokio::time::sleep(self.settle_delay) => true,
                _ = interrupted(&mut self.shutdown) => false,
            };
            if !settled {
                tracing::info!("Received Ctrl+C, shutting down");
                return Some(SessionOutcome::Interrupted);
            }
        }

        match self.channel.send(&outgoing.request).await {
            Ok(()) => {
                tracing::info!(
                    "Sent request: {} ({})",
                    outgoing.request.command,
                    outgoing.request.tag.as_str()
                );
                None
            }
            Err(e) => Some(SessionOutcome::TransportFailed(e.to_string())),
        }
    }

    async fn finish(mut self, outcome: SessionOutcome) -> SessionOutcome {
        tracing::debug!("Session finished: {:?}", outcome);

        if let Err(e) = self.channel.close().await {
            tracing::warn!("Failed to close connection cleanly: {}", e);
        }
        tracing::info!("WebSocket connection closed");

        outcome
    }
}

/// Connect to OBS and run one session for `plan`
pub async fn run_action(
    config: &Config,
    plan: Plan,
    mut shutdown: watch::Receiver<bool>,
) -> SessionOutcome {
    let connected = tokio::select! {
        connected = WebSocketChannel::connect(&config.url) => Some(connected),
        _ = interrupted(&mut shutdown) => None,
    };

    let channel = match connected {
        None => return SessionOutcome::Interrupted,
        Some(Err(e)) => return SessionOutcome::TransportFailed(e.to_string()),
        Some(Ok(channel)) => channel,
    };

    App::new(channel, config, shutdown).run(plan).await
}

async fn next_inbound<C: Channel>(
    channel: &mut C,
    limit: Option<Duration>,
    deadline: Option<Instant>,
) -> Result<Inbound, SessionOutcome> {
    let received = match (limit, deadline) {
        (Some(limit), Some(deadline)) => tokio::time::timeout_at(deadline, channel.recv())
            .await
            .map_err(|_| {
                SessionOutcome::TransportFailed(format!("no response within {:?}", limit))
            })?,
        _ => channel.recv().await,
    };

    match received {
        Ok(Some(inbound)) => Ok(inbound),
        Ok(None) => Err(SessionOutcome::TransportFailed(
            "connection closed by server".to_string(),
        )),
        Err(e) => Err(SessionOutcome::TransportFailed(e.to_string())),
    }
}

/// Resolves once shutdown has been requested
async fn interrupted(shutdown: &mut watch::Receiver<bool>) {
    if shutdown.wait_for(|stop| *stop).await.is_err() {
        // Sender dropped; nothing can interrupt us any more
        std::future::pending::<()>().await;
    }
}
