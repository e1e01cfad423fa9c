//! Control link receive task
//!
//! Receives frames from the host and dispatches them: commands go to the
//! control loop, time updates go straight to the wall clock.

use defmt::*;
use embassy_rp::uart::BufferedUartRx;
use embedded_io_async::Read;

use wheelclock_protocol::{FrameParser, HostMessage};

use crate::channels::{COMMAND_CHANNEL, HEARTBEAT_RECEIVED};
use crate::wall_clock;

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 64;

#[embassy_executor::task]
pub async fn link_rx_task(mut rx: BufferedUartRx) {
    info!("Link RX task started");

    let mut parser = FrameParser::new();
    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        let n = match rx.read(&mut buf).await {
            Ok(n) => n,
            Err(e) => {
                warn!("UART read error: {:?}", e);
                parser.reset();
                continue;
            }
        };

        for &byte in &buf[..n] {
            match parser.feed(byte) {
                Ok(Some(frame)) => match HostMessage::from_frame(&frame) {
                    Ok(msg) => handle_message(msg).await,
                    Err(e) => warn!("Failed to parse host message: {:?}", e),
                },
                Ok(None) => {}
                Err(e) => warn!("Frame parse error: {:?}", e),
            }
        }
    }
}

async fn handle_message(msg: HostMessage) {
    match msg {
        HostMessage::Command(command) => {
            debug!("Command: {:?}", command);
            // Back-pressure the host rather than dropping commands
            COMMAND_CHANNEL.send(command).await;
        }
        HostMessage::SetTime {
            unix_seconds,
            utc_offset_minutes,
        } => {
            info!("Time set: {} (offset {} min)", unix_seconds, utc_offset_minutes);
            wall_clock::set(unix_seconds, utc_offset_minutes);
        }
        HostMessage::Ping => {
            trace!("PING received");
            HEARTBEAT_RECEIVED.signal(());
        }
    }
}
