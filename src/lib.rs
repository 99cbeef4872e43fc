//! # lorasonde
//!
//! A portable, no_std framing engine for balloon sondes that relay serial
//! instrument telemetry over a LoRa packet radio.
//!
//! The onboard unit reads two serial feeds:
//! - an instrument line carrying `xdata=<hex>` records
//! - an optional auxiliary line carrying `PTUX:` and `GPS:` records
//!
//! It decodes the hex, prefixes the latest auxiliary readings, and hands one
//! compact little-endian packet per record to the radio. The ground unit
//! decodes packets back into text lines.
//!
//! ## Crate features
//! | Feature               | Description |
//! |-----------------------|-------------|
//! | `std`                 | Disables `#![no_std]`, adds the `std`-backed `StdClock` |
//! | `delay-loop`          | Adds `run_poll_loop` over `embedded_hal::delay::DelayNs` |
//! | `timer-isr` (default) | Adds `TickClock`, advanced from a timer interrupt via `critical_section::with` |
//! | `defmt-0-3`           | Uses `defmt` logging |
//! | `log`                 | Uses `log` logging |
//!
//! ## Software Features
//!
//! - **Stream tokenizers** for both feeds, with per-record read windows that
//!   flush the line on timeout or framing errors
//! - **ASCII-hex codec** tolerant of the malformed pairs the instruments emit
//! - **Packet builder** enforcing the radio's 251-byte payload limit
//! - **Ground decoder** with streaming field output
//! - Radio, serial lines and clock are all traits, so the engine runs on any
//!   `embedded-hal` target or on a host
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lorasonde::config::{LinkConfig, SondeConfig};
//! use lorasonde::indicator::Indicator;
//! use lorasonde::sonde::Sonde;
//! use lorasonde::source::SerialSource;
//! use lorasonde::timer::TickClock;
//!
//! static CLOCK: TickClock = TickClock::new();
//!
//! let mut led = Indicator::new(led_pin);
//! let mut sonde = Sonde::new(
//!     SerialSource::new(instrument_uart),
//!     SerialSource::new(aux_uart),
//!     radio,
//!     &CLOCK,
//!     SondeConfig { aux_enabled: true, ..SondeConfig::default() },
//! );
//! if sonde.initialize(&LinkConfig::default()).is_err() {
//!     led.halt(&mut delay);
//! }
//! led.ready().ok();
//! loop {
//!     let _ = sonde.poll();
//! }
//! ```
//!
//! Or, with the `delay-loop` feature, hand the loop over entirely:
//!
//! ```rust,ignore
//! lorasonde::timer::run_poll_loop(&mut sonde, &mut delay, 1_000);
//! ```
//!
//! ## Integration Notes
//!
//! - `TickClock::tick` must be called from a periodic timer interrupt; the
//!   read windows are only as accurate as that tick
//! - Sonde and ground must agree on `aux_enabled`, since combined packets
//!   carry no type tag

#![deny(
    bad_style,
    dead_code,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    unused,
    while_true,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results
)]
#![cfg_attr(not(feature = "std"), no_std)]

#[macro_use]
mod fmt;

#[cfg(feature = "timer-isr")]
pub use critical_section;

pub use heapless;

pub mod auxfeed;
pub mod config;
pub mod consts;
pub mod decoder;
pub mod error;
pub mod ground;
pub mod hex;
pub mod indicator;
pub mod packet;
pub mod reader;
pub mod sonde;
pub mod source;
pub mod timer;
pub mod transport;
pub mod xdata;

#[cfg(test)]
pub(crate) mod testing;
