//! Callback contract - the unit of work a horde schedules
//!
//! Gremlins, mogwais, and before/after callbacks all share this contract.
//! A callback completes when its `invoke` future resolves, whether that
//! happens immediately (a synchronous action) or after awaiting.
//! Completion is signalled exactly once, by the future resolving.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::HordeError;
use crate::inject::{Inject, ServiceSlots};
use crate::services::{SharedLogger, SharedRandomizer};

/// Boxed future produced by an asynchronous callback body
pub type BoxedWork = Pin<Box<dyn Future<Output = Result<(), HordeError>> + Send>>;

/// A schedulable unit of work
///
/// Registries own callbacks behind [`SharedCallback`] handles; the
/// sequencer only ever borrows a list of them.
#[async_trait]
pub trait Callback: Inject {
    /// Name used in logs and missing-service errors
    fn name(&self) -> &str;

    /// Run the callback once
    ///
    /// A callback whose future never resolves stalls its phase
    /// indefinitely; the core applies no timeout.
    async fn invoke(&self) -> Result<(), HordeError>;

    /// Companion cleanup callback, collected into the teardown phase
    ///
    /// Invoked at most once per run, after every explicitly registered
    /// after-callback, and only when this callback was registered for the
    /// run.
    fn clean_up(&self) -> Option<SharedCallback> {
        None
    }
}

/// Shared handle to a callback
pub type SharedCallback = Arc<dyn Callback>;

/// Callback built from a synchronous closure
///
/// The closure receives the callback's service slots, so an action can
/// reach the injected logger or randomizer:
///
/// ```
/// use gremlins::FnCallback;
///
/// let clicker = FnCallback::new("clicker", |services| {
///     let random = services.require_randomizer("clicker")?;
///     let _x = random.between(0, 1024);
///     Ok(())
/// });
/// ```
pub struct FnCallback {
    name: String,
    slots: ServiceSlots,
    body: Box<dyn Fn(&ServiceSlots) -> Result<(), HordeError> + Send + Sync>,
    cleanup: Option<SharedCallback>,
}

impl FnCallback {
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&ServiceSlots) -> Result<(), HordeError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            slots: ServiceSlots::new(),
            body: Box::new(body),
            cleanup: None,
        }
    }

    /// Attach a companion cleanup callback
    pub fn with_clean_up(mut self, cleanup: SharedCallback) -> Self {
        self.cleanup = Some(cleanup);
        self
    }

    /// Finish as a shareable handle
    pub fn shared(self) -> SharedCallback {
        Arc::new(self)
    }
}

impl Inject for FnCallback {
    fn logger(&self) -> Option<SharedLogger> {
        self.slots.logger()
    }

    fn set_logger(&self, logger: SharedLogger) {
        self.slots.set_logger(logger)
    }

    fn randomizer(&self) -> Option<SharedRandomizer> {
        self.slots.randomizer()
    }

    fn set_randomizer(&self, randomizer: SharedRandomizer) {
        self.slots.set_randomizer(randomizer)
    }
}

#[async_trait]
impl Callback for FnCallback {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self) -> Result<(), HordeError> {
        (self.body)(&self.slots)
    }

    fn clean_up(&self) -> Option<SharedCallback> {
        self.cleanup.clone()
    }
}

/// Callback built from a closure returning a future
///
/// The body receives a clone of the service slots (clones share storage),
/// letting the future outlive the borrow of `self`.
pub struct AsyncCallback {
    name: String,
    slots: ServiceSlots,
    body: Box<dyn Fn(ServiceSlots) -> BoxedWork + Send + Sync>,
    cleanup: Option<SharedCallback>,
}

impl AsyncCallback {
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(ServiceSlots) -> BoxedWork + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            slots: ServiceSlots::new(),
            body: Box::new(body),
            cleanup: None,
        }
    }

    /// Attach a companion cleanup callback
    pub fn with_clean_up(mut self, cleanup: SharedCallback) -> Self {
        self.cleanup = Some(cleanup);
        self
    }

    /// Finish as a shareable handle
    pub fn shared(self) -> SharedCallback {
        Arc::new(self)
    }
}

impl Inject for AsyncCallback {
    fn logger(&self) -> Option<SharedLogger> {
        self.slots.logger()
    }

    fn set_logger(&self, logger: SharedLogger) {
        self.slots.set_logger(logger)
    }

    fn randomizer(&self) -> Option<SharedRandomizer> {
        self.slots.randomizer()
    }

    fn set_randomizer(&self, randomizer: SharedRandomizer) {
        self.slots.set_randomizer(randomizer)
    }
}

#[async_trait]
impl Callback for AsyncCallback {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self) -> Result<(), HordeError> {
        (self.body)(self.slots.clone()).await
    }

    fn clean_up(&self) -> Option<SharedCallback> {
        self.cleanup.clone()
    }
}

/// Test callback appending its name to a shared trace on every invocation
#[cfg(test)]
pub(crate) struct TraceCallback {
    name: String,
    trace: Arc<parking_lot::Mutex<Vec<String>>>,
    fail: bool,
    cleanup: Option<SharedCallback>,
}

#[cfg(test)]
impl TraceCallback {
    pub(crate) fn new(name: &str, trace: &Arc<parking_lot::Mutex<Vec<String>>>) -> Self {
        Self {
            name: name.to_string(),
            trace: Arc::clone(trace),
            fail: false,
            cleanup: None,
        }
    }

    pub(crate) fn shared(name: &str, trace: &Arc<parking_lot::Mutex<Vec<String>>>) -> SharedCallback {
        Arc::new(Self::new(name, trace))
    }

    /// Variant that records its name, then fails
    pub(crate) fn failing(name: &str, trace: &Arc<parking_lot::Mutex<Vec<String>>>) -> SharedCallback {
        let mut cb = Self::new(name, trace);
        cb.fail = true;
        Arc::new(cb)
    }

    pub(crate) fn with_clean_up(mut self, cleanup: SharedCallback) -> SharedCallback {
        self.cleanup = Some(cleanup);
        Arc::new(self)
    }
}

#[cfg(test)]
impl Inject for TraceCallback {}

#[cfg(test)]
#[async_trait]
impl Callback for TraceCallback {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self) -> Result<(), HordeError> {
        self.trace.lock().push(self.name.clone());
        if self.fail {
            return Err(anyhow::anyhow!("{} failed", self.name).into());
        }
        Ok(())
    }

    fn clean_up(&self) -> Option<SharedCallback> {
        self.cleanup.clone()
    }
}
