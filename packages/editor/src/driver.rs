//! Async pump between a [`RenderSession`] and the host channel.
//!
//! ```text
//!   actions ──┐
//!             ├──▶ RenderSession ──events──▶ host
//!  commands ──┘         ▲
//!                       └── timers (debounce, grace, exit transitions)
//! ```
//!
//! Every wake-up ends with a tick and an outbox flush, so events leave in
//! the order the session produced them.

use crate::actions::UserAction;
use crate::session::RenderSession;
use sitecanvas_protocol::{EditorEndpoint, EditorEvent, Sender};
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};

/// Drive `session` until the user is done and nothing is outstanding, or
/// until the host goes away. Returns the session for inspection.
pub async fn run_session(
    mut session: RenderSession,
    endpoint: EditorEndpoint,
    mut actions: mpsc::UnboundedReceiver<UserAction>,
) -> RenderSession {
    let (sender, mut commands) = endpoint.split();
    let mut actions_open = true;
    let mut paused_until: Option<Instant> = None;

    flush(&mut session, &sender);

    loop {
        let idle = session.next_deadline().is_none() && session.pending_requests() == 0;
        if !actions_open && idle && paused_until.is_none() {
            break;
        }

        let deadline = session
            .next_deadline()
            .map(Instant::from_std)
            .into_iter()
            .chain(paused_until)
            .min();
        let accepting = actions_open && paused_until.is_none();

        tokio::select! {
            command = commands.recv() => match command {
                Some(command) => session.handle_command(command, Instant::now().into_std()),
                None => {
                    tracing::debug!("host channel closed");
                    break;
                }
            },
            action = actions.recv(), if accepting => match action {
                Some(action) => {
                    if let Some(wait) = action.wait() {
                        paused_until = Some(Instant::now() + wait);
                    } else if let Err(err) = session.perform(action, Instant::now().into_std()) {
                        tracing::debug!(%err, "action had no effect");
                    }
                }
                None => actions_open = false,
            },
            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {}
        }

        let now = Instant::now();
        if paused_until.map(|until| until <= now).unwrap_or(false) {
            paused_until = None;
        }
        session.tick(now.into_std());
        flush(&mut session, &sender);
    }

    session.tick(Instant::now().into_std());
    flush(&mut session, &sender);
    session
}

fn flush(session: &mut RenderSession, sender: &Sender<EditorEvent>) {
    for event in session.drain_events() {
        if let Err(err) = sender.send(&event) {
            tracing::debug!(%err, kind = event.kind(), "dropping event");
        }
    }
}
