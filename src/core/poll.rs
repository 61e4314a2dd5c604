//! Interruptible waiting for polling loops
//!
//! Both the deployment status loop and the artifact awaiter sleep between
//! requests. An interrupt aborts the whole run, so every pause and every
//! request in those loops races against a shared interrupt flag.
//!
//! The flag is set once by a single listener task and never reset. A signal
//! that arrives while no pause is running is therefore seen by the next one.

use crate::core::error::DeployError;
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;

/// Sets the flag of the [`Interrupt`] it was created with
#[derive(Debug)]
pub struct InterruptTrigger {
    flag: watch::Sender<bool>,
}

impl InterruptTrigger {
    pub fn fire(&self) {
        self.flag.send_replace(true);
    }
}

/// Shared interrupt flag for polling loops
#[derive(Clone)]
pub struct Interrupt {
    flag: watch::Receiver<bool>,
}

impl Interrupt {
    /// Interrupt on Ctrl-C
    ///
    /// Installs one listener for the rest of the process. Must be called from
    /// within a tokio runtime.
    pub fn ctrl_c() -> Self {
        Self::on(async {
            if tokio::signal::ctrl_c().await.is_err() {
                // Without a handler we can never be interrupted
                std::future::pending::<()>().await;
            }
        })
    }

    /// Never interrupt
    pub fn never() -> Self {
        let (_, flag) = watch::channel(false);
        Self { flag }
    }

    /// Interrupt once `signal` completes
    ///
    /// `signal` is spawned on the current tokio runtime.
    pub fn on<F>(signal: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (trigger, interrupt) = Self::manual();
        tokio::spawn(async move {
            signal.await;
            trigger.fire();
        });
        interrupt
    }

    /// Interrupt fired by hand through the returned trigger
    pub fn manual() -> (InterruptTrigger, Self) {
        let (flag, receiver) = watch::channel(false);
        (InterruptTrigger { flag }, Self { flag: receiver })
    }

    pub fn is_fired(&self) -> bool {
        *self.flag.borrow()
    }

    /// Resolves once the flag is set, or never if it cannot be set anymore
    async fn fired(&self) {
        let mut flag = self.flag.clone();
        if flag.wait_for(|fired| *fired).await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    /// Run `future` to completion unless the interrupt fires first
    ///
    /// A flag that is already set wins without polling `future`.
    pub async fn guard<F: Future>(&self, future: F) -> Result<F::Output, DeployError> {
        tokio::select! {
            biased;
            _ = self.fired() => Err(DeployError::Interrupted),
            output = future => Ok(output),
        }
    }

    /// Sleep for `duration`, failing with [`DeployError::Interrupted`] if the
    /// interrupt fires first
    pub async fn pause(&self, duration: Duration) -> Result<(), DeployError> {
        self.guard(sleep(duration)).await
    }
}

impl std::fmt::Debug for Interrupt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interrupt")
            .field("fired", &self.is_fired())
            .finish()
    }
}
