//! Settings and calibration persistence
//!
//! Loads both records at boot, falling back to defaults when a record is
//! missing or unusable, and writes them back on request.

use defmt::*;

use wheelclock_core::config::{CalibrationData, ClockSettings, SETTINGS_VERSION};
use wheelclock_core::control::SaveRequest;
use wheelclock_hal_rp2040::flash::{FlashError, FlashStorage, StorageKey};
use wheelclock_hal_rp2040::FlashStorageTrait;

/// Largest serialized record (settings with a full timezone string)
const MAX_RECORD_SIZE: usize = 256;

/// Persistence errors
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    /// Flash operation failed
    Flash(FlashError),
    /// Serialization failed
    Serialize,
    /// Deserialization failed
    Deserialize,
    /// Invalid magic or version
    InvalidFormat,
    /// CRC check failed
    CrcMismatch,
}

impl From<FlashError> for StoreError {
    fn from(e: FlashError) -> Self {
        StoreError::Flash(e)
    }
}

/// Load settings, or defaults if none are stored
pub async fn load_settings(storage: &mut FlashStorage<'_>) -> ClockSettings {
    match load_settings_inner(storage).await {
        Ok(settings) => {
            info!(
                "Loaded settings: max speed {}, sensitivity {}, power saver {}",
                settings.max_speed, settings.sensitivity, settings.power_saver
            );
            settings
        }
        Err(StoreError::Flash(FlashError::NotFound)) => {
            debug!("No settings in flash, using defaults");
            ClockSettings::default()
        }
        Err(e) => {
            warn!("Failed to load settings: {:?}, using defaults", e);
            ClockSettings::default()
        }
    }
}

async fn load_settings_inner(storage: &mut FlashStorage<'_>) -> Result<ClockSettings, StoreError> {
    let mut buffer = [0u8; MAX_RECORD_SIZE];
    let len = storage.read(StorageKey::ClockSettings, &mut buffer).await?;

    let settings: ClockSettings =
        postcard::from_bytes(&buffer[..len]).map_err(|_| StoreError::Deserialize)?;

    if settings.version != SETTINGS_VERSION {
        return Err(StoreError::InvalidFormat);
    }
    // A record that no longer validates would put the motors out of range
    if settings.validate().is_err() {
        return Err(StoreError::InvalidFormat);
    }

    Ok(settings)
}

/// Load calibration, or defaults if none is stored
pub async fn load_calibration(storage: &mut FlashStorage<'_>) -> CalibrationData {
    match load_calibration_inner(storage).await {
        Ok(data) => {
            info!(
                "Loaded calibration: baseline H{} M{}, steps/rev H{} M{}",
                data.baseline.hours,
                data.baseline.minutes,
                data.steps_per_revolution.hours,
                data.steps_per_revolution.minutes
            );
            data
        }
        Err(StoreError::Flash(FlashError::NotFound)) => {
            debug!("No calibration in flash, using defaults");
            CalibrationData::new()
        }
        Err(e) => {
            warn!("Failed to load calibration: {:?}, using defaults", e);
            CalibrationData::new()
        }
    }
}

async fn load_calibration_inner(
    storage: &mut FlashStorage<'_>,
) -> Result<CalibrationData, StoreError> {
    let mut buffer = [0u8; MAX_RECORD_SIZE];
    let len = storage.read(StorageKey::Calibration, &mut buffer).await?;

    let data: CalibrationData =
        postcard::from_bytes(&buffer[..len]).map_err(|_| StoreError::Deserialize)?;

    if !data.is_valid() {
        return Err(StoreError::InvalidFormat);
    }
    if !data.verify_crc() {
        warn!("Calibration CRC mismatch");
        return Err(StoreError::CrcMismatch);
    }

    Ok(data)
}

/// Write one record
///
/// Calibration gets a fresh CRC before it is written.
pub async fn save(storage: &mut FlashStorage<'_>, request: SaveRequest) -> Result<(), StoreError> {
    let mut buffer = [0u8; MAX_RECORD_SIZE];

    let (key, bytes) = match request {
        SaveRequest::Settings(settings) => {
            let bytes =
                postcard::to_slice(&settings, &mut buffer).map_err(|_| StoreError::Serialize)?;
            (StorageKey::ClockSettings, bytes)
        }
        SaveRequest::Calibration(mut data) => {
            data.update_crc();
            let bytes = postcard::to_slice(&data, &mut buffer).map_err(|_| StoreError::Serialize)?;
            (StorageKey::Calibration, bytes)
        }
    };

    debug!("Saving {} bytes under {:?}", bytes.len(), key);
    storage.write(key, bytes).await?;
    Ok(())
}
