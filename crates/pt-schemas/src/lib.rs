//! Shared on-disk schema types: the snapshot tree, canonical path layout,
//! OHLCV bars, and trade/equity event records. No I/O lives here — see
//! `pt-io` for the atomic read/write substrate.

pub mod bar;
pub mod mode;
pub mod paths;
pub mod snapshot;
pub mod trade;

pub use bar::{timeframe_seconds, Bar, FetchMeta};
pub use mode::Mode;
pub use paths::Paths;
pub use snapshot::{new_snapshot, tick_id, Snapshot, SnapshotMeta};
pub use trade::{CloseEvent, EquityPoint, OpenEvent, TradeEvent};
