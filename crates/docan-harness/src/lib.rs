//! Deterministic simulation harness for the DoCAN transport core.
//!
//! Scripted implementations of the driver, tick and upper-layer seams
//! plus a virtual clock, so transport behaviour can be tested frame by
//! frame without hardware or wall-clock time. The [`SimNode`] bundles
//! the per-node pieces; [`pump`] shuttles frames between two nodes like
//! a zero-latency bus, confirming each transmitted frame to its sender.
//!
//! # Usage
//!
//! ```ignore
//! let filter = tester_filter();
//! let tick = CountingTick::default();
//! let layer = TransportLayer::new(&filter, AddressingScheme::Normal, &tick,
//!     TransportLayerConfig::default(), Parameters::default());
//! let mut node = SimNode::new();
//! node.send(&layer, 0x11, 0x10, &[0x3E, 0x00]).unwrap();
//! ```

pub mod sim;

pub use sim::{
    CountingTick, RecordingUpperLayer, SimCanDriver, SimClock, SimNode, ecu_filter, fd_filter,
    pump, tester_filter,
};
