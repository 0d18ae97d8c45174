//! Client execution logic with join retry.

use std::{sync::Arc, time::Duration};

use studyroom_session::{
    RoomCoordinator, SessionConfig, SimulatorConfig, infrastructure::ActivitySimulator,
    usecase::JoinError,
};
use studyroom_shared::time::{Clock, SystemClock};

use super::{error::ClientError, session::run_client_session};

pub const MAX_JOIN_ATTEMPTS: u32 = 5;
pub const JOIN_RETRY_INTERVAL_SECS: u64 = 5;

/// Everything the client needs to join a simulated room
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub room_id: String,
    pub name: String,
    pub session: SessionConfig,
    pub simulator: SimulatorConfig,
}

/// Join the room, run the interactive session and leave on exit
pub async fn run_client(options: ClientOptions) -> Result<(), ClientError> {
    options.session.validate()?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let simulator = Arc::new(ActivitySimulator::new(options.simulator, clock.clone())?);
    let coordinator = RoomCoordinator::new(simulator, clock, options.session);

    join_with_retry(
        &coordinator,
        &options.room_id,
        &options.name,
        MAX_JOIN_ATTEMPTS,
        Duration::from_secs(JOIN_RETRY_INTERVAL_SECS),
    )
    .await?;

    let result = run_client_session(&coordinator, &options.name).await;
    coordinator.leave_room().await;
    tracing::info!("Client session ended");
    result
}

/// Try to join up to `max_attempts` times, waiting `interval` between attempts
///
/// Returns the number of attempts it took. Invalid requests fail immediately.
pub async fn join_with_retry(
    coordinator: &RoomCoordinator,
    room_id: &str,
    name: &str,
    max_attempts: u32,
    interval: Duration,
) -> Result<u32, ClientError> {
    let mut attempt = 1;

    loop {
        tracing::info!(
            "Joining room '{}' as '{}' (attempt {}/{})",
            room_id,
            name,
            attempt,
            max_attempts
        );

        match coordinator.try_join_room(room_id, name).await {
            Ok(()) => return Ok(attempt),
            Err(e @ JoinError::InvalidRequest(_)) => {
                tracing::error!("{}", e);
                return Err(ClientError::InvalidJoin(e));
            }
            Err(e) => {
                tracing::warn!("Join failed: {}", e);
                if attempt >= max_attempts {
                    tracing::error!("Failed to join after {} attempts. Exiting.", max_attempts);
                    return Err(ClientError::JoinFailed {
                        room: room_id.to_string(),
                        attempts: attempt,
                    });
                }

                attempt += 1;
                tracing::info!(
                    "Retrying in {:?}... (attempt {}/{})",
                    interval,
                    attempt,
                    max_attempts
                );
                tokio::time::sleep(interval).await;
            }
        }
    }
}
