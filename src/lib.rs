//! # Gremlins
//!
//! Monkey testing harness - unleash a horde of gremlins on your system.
//!
//! A horde repeatedly invokes small, independent action callbacks
//! (gremlins) against a live target while probe callbacks (mogwais)
//! observe it and can halt the run. What a gremlin actually does is
//! opaque to the core: this crate is the orchestration engine only.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                            HORDE                              │
//! │  registries: gremlins │ mogwais │ strategies │ before │ after │
//! │  services:   logger │ randomizer       catalog: defaults      │
//! └───────────────┬───────────────────────────────────────────────┘
//!                 │ unleash
//!                 ▼
//!      ┌────────────────────┐   inject logger/randomizer
//!      │  SERVICE INJECTOR  │   into every willing callback
//!      └─────────┬──────────┘
//!                ▼
//!   setup ───────► attack ───────► teardown
//!   before + mogwais   strategies drive     after + collected
//!   via the sequencer  gremlins in waves,   cleanups, in order
//!                      blocks, or weighted
//!                      random picks
//! ```
//!
//! ## Key Concepts
//!
//! - **Gremlin**: an action callback that perturbs the target under test
//! - **Mogwai**: a probe callback run once before the attack phase
//! - **Strategy**: a scheduling policy deciding order, repetition, and
//!   timing of gremlin invocations
//! - **Horde**: the aggregate owning registries, services, and the
//!   three-phase run pipeline
//!
//! ## Example
//!
//! ```
//! use gremlins::{FnCallback, Horde, RunParams};
//!
//! # tokio_test::block_on(async {
//! let horde = Horde::new();
//! horde
//!     .gremlin(FnCallback::new("poker", |_| Ok(())).shared())
//!     .seed(1234);
//!
//! horde.unleash(RunParams::with_nb(10)).await.unwrap();
//! # });
//! ```
//!
//! ## Failure model
//!
//! The core never wraps or retries errors from user-supplied callbacks:
//! one failing gremlin aborts its phase and the whole run, and `unleash`
//! returns the error unchanged. There is no timeout either - a callback
//! whose future never resolves stalls its phase indefinitely. Both are
//! deliberate tradeoffs favoring simplicity over robustness.

pub mod callback;
pub mod catalog;
pub mod error;
pub mod horde;
pub mod inject;
pub mod sequencer;
pub mod services;
pub mod strategies;

pub use callback::{AsyncCallback, BoxedWork, Callback, FnCallback, SharedCallback};
pub use catalog::Catalog;
pub use error::HordeError;
pub use horde::{Horde, SharedStrategy};
pub use inject::{Inject, ServiceInjector, ServiceSlots};
pub use sequencer::run_sequence;
pub use services::{
    ChaChaRandomizer, Logger, Randomizer, SharedLogger, SharedRandomizer, TracingLogger,
};
pub use strategies::{
    AllTogether, AllTogetherConfig, BySpecies, BySpeciesConfig, Distribution, DistributionConfig,
    RunParams, Strategy, StrategyControl, StrategyState,
};
