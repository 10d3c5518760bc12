//! Camera session: lifecycle, frame gate and capture control.
//!
//! - Session control via [`CameraSession`] built with [`SessionBuilder`]
//! - Configuration via [`SessionOptions`]
//! - Host backgrounding via [`LifecycleHub`]

mod controller;
mod gate;
mod lifecycle;
mod options;
mod state;

pub use controller::{CameraSession, FrameOf, SessionBuilder};
pub use gate::{FrameGate, GatePermit};
pub use lifecycle::{AppLifecycle, LifecycleHub, LifecycleSubscription, DEFAULT_LIFECYCLE_CAPACITY};
pub use options::{
    OsVersionPolicy, SessionOptions, DEFAULT_MIN_OS_VERSION, DEFAULT_SETTLE_DELAY,
    DEFAULT_STREAM_START_DELAY,
};
pub use state::{ErrorKind, FrameStats, SessionError, SessionState, SessionView};
