//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels/signals.
//! Only the control task touches the wheels.

pub mod control;
pub mod link_rx;
pub mod link_tx;
pub mod persistence;

pub use control::{control_task, Coils};
pub use link_rx::link_rx_task;
pub use link_tx::link_tx_task;
pub use persistence::persistence_task;
