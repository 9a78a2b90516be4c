pub mod errors;

pub use errors::{
    ControllerError, ObserverError, PlayerError, PreferenceError, ProbeError, ResolveError,
    StatusTransitionError,
};
