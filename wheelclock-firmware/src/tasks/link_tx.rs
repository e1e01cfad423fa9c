//! Control link transmit task
//!
//! Sends command replies and heartbeat responses to the host.

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_rp::uart::BufferedUartTx;
use embedded_io_async::Write;

use wheelclock_protocol::ClockMessage;

use crate::channels::{HEARTBEAT_RECEIVED, REPLY_CHANNEL};

#[embassy_executor::task]
pub async fn link_tx_task(mut tx: BufferedUartTx) {
    info!("Link TX task started");

    loop {
        let msg = match select(REPLY_CHANNEL.receive(), HEARTBEAT_RECEIVED.wait()).await {
            Either::First(reply) => ClockMessage::Reply(reply),
            Either::Second(()) => ClockMessage::Pong,
        };
        send(&mut tx, &msg).await;
    }
}

async fn send(tx: &mut BufferedUartTx, msg: &ClockMessage) {
    let bytes = match msg.to_frame().and_then(|frame| frame.encode_to_vec()) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Failed to encode message: {:?}", e);
            return;
        }
    };

    if let Err(e) = tx.write_all(&bytes).await {
        warn!("Failed to send frame: {:?}", e);
    } else {
        trace!("Sent {} byte frame", bytes.len());
    }
}
