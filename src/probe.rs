use tokio::time::{sleep, Duration};

use crate::error::{SensorError, SensorResult};
use crate::registry::SensorRegistry;
use crate::types::SensorKind;

/// Number of polling attempts before the sensor is declared unsupported.
pub const MAX_ATTEMPTS: u32 = 20;

/// Delay between polling attempts.
pub const RETRY_INTERVAL: Duration = Duration::from_millis(50);

/// Wait for a sensor channel to deliver its first raw sample.
///
/// Sensor availability cannot be queried up front; the only reliable
/// signal is whether an event ever arrives. Polls the channel's
/// latest-sample slot up to [`MAX_ATTEMPTS`] times at [`RETRY_INTERVAL`],
/// resolving as soon as a sample shows up and failing with
/// [`SensorError::NotSupported`] once the budget is exhausted.
pub async fn wait_for_sample(registry: &SensorRegistry, kind: SensorKind) -> SensorResult<()> {
    for attempt in 1..=MAX_ATTEMPTS {
        sleep(RETRY_INTERVAL).await;
        if registry.has_sample(kind)? {
            log::debug!("{kind} sample observed on probe attempt {attempt}");
            return Ok(());
        }
    }
    Err(SensorError::NotSupported(kind))
}
