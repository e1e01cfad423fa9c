//! Flash persistence task
//!
//! Owns the flash storage and writes settings and calibration records as
//! the control loop requests them. Flash erases take tens of
//! milliseconds, which is why they never run on the control loop.

use defmt::*;

use wheelclock_hal_rp2040::flash::FlashStorage;

use crate::channels::SAVE_CHANNEL;
use crate::config::save;

#[embassy_executor::task]
pub async fn persistence_task(mut storage: FlashStorage<'static>) {
    info!("Persistence task started");

    loop {
        let request = SAVE_CHANNEL.receive().await;

        match save(&mut storage, request).await {
            Ok(()) => info!("Saved to flash"),
            Err(e) => error!("Failed to save: {:?}", e),
        }
    }
}
