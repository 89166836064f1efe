//! Protocol core of an ISO 15765-2 (DoCAN) transport stack.
//!
//! The crate owns everything between the wire layer (`docan-frame`) and
//! the diagnostic layer above: the physical transceiver's single-slot
//! send discipline, the receive and transmit state machines with their
//! flow-control back-pressure, and the session container that
//! multiplexes many connections onto one CAN bus.
//!
//! # Design
//!
//! The core is pure and non-blocking: no clock, no I/O, no executor.
//! Time is an injected microsecond counter, the CAN controller is a
//! [`CanDriver`] with a non-blocking enqueue, and progress is driven by
//! three entry points on [`TransportLayer`] — the interrupt-path frame
//! and confirmation deliveries and the periodic
//! [`cyclic_task`](TransportLayer::cyclic_task). One internal mutex
//! guards the pools; it is never held across an upper-layer callback.

pub mod driver;
pub mod error;
pub mod job;
pub mod params;
pub mod pool;
mod receiver;
pub mod timer;
pub mod transceiver;
pub mod transport;
mod transmitter;
pub mod uds;
pub mod upper;

pub use driver::{CanDriver, CanFrame, NoTickGenerator, TickGenerator};
pub use error::{CanWriteError, ProcessingResult, SendError};
pub use job::JobHandle;
pub use params::{MAX_MIN_SEPARATION_TIME_US, Parameters};
pub use pool::SlotPool;
pub use timer::Deadline;
pub use transceiver::{PhysicalTransceiver, SendFramesResult};
pub use transport::{TransportLayer, TransportLayerConfig, TransportStats};
pub use uds::{DiagnosticJob, PendingResponse, ServiceDispatcher};
pub use upper::{AllowAll, SessionPolicy, UpperLayer};
