//! Core modules for rotalock

pub mod api;
pub mod clock;
pub mod evaluator;
pub mod replay;
pub mod sensor;
pub mod sink;
pub mod timer;

pub use api::{create_router, run_server, spawn_ticker, AppState};
pub use clock::{Clock, ManualClock, SystemClock};
pub use evaluator::RotaryLockEvaluator;
pub use replay::{parse_script, run_script, ReplayReport, ReplayStep};
pub use sensor::{parse_angle_line, parse_raw_adc_line, AdcAngleFilter, LineDecoder};
pub use sink::{AuthLog, AuthLogEntry, BroadcastSink, LiveEvent, MemorySink, OutcomeSink, StatusUpdate};
pub use timer::TimerSlot;
