// src/macros.rs

//
// Crate diagnostics.
//
// logging feature enabled → `log` facade, target "mom_double"
// logging feature disabled → errors go to stderr, everything else is dropped
//
// These only describe what the fake itself does. Values logged by code under
// test are captured by `TestLogger` and never pass through here.
//

#![allow(unused_macros)]

#[cfg(feature = "logging")]
macro_rules! log_at {
    ($level:ident, $($arg:tt)*) => {
        log::$level!(target: "mom_double", $($arg)*)
    };
}

#[cfg(not(feature = "logging"))]
macro_rules! log_at {
    (error, $($arg:tt)*) => {
        eprintln!($($arg)*)
    };
    ($level:ident, $($arg:tt)*) => {};
}

macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::macros::log_at!(error, $($arg)*)
    };
}

macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::macros::log_at!(warn, $($arg)*)
    };
}

macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::macros::log_at!(info, $($arg)*)
    };
}

macro_rules! log_debug {
    ($($arg:tt)*) => {
        $crate::macros::log_at!(debug, $($arg)*)
    };
}

#[allow(unused_imports)]
pub(crate) use log_at;
#[allow(unused_imports)]
pub(crate) use log_debug;
#[allow(unused_imports)]
pub(crate) use log_error;
#[allow(unused_imports)]
pub(crate) use log_info;
#[allow(unused_imports)]
pub(crate) use log_warn;
