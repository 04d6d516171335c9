//! Start, stop, restart, up and down.

use std::io::Write;

use kvm_wireguard::{ProcessRunner, WireGuardService};

use crate::error::CliError;
use crate::output::{ActionResult, OutputFormat};

/// A state-changing operation on an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Bring the default interface up.
    Start,
    /// Bring the default interface down.
    Stop,
    /// Restart the default interface.
    Restart,
    /// Bring the named interface up.
    Up,
    /// Bring the named interface down.
    Down,
}

impl Action {
    fn past_tense(self) -> &'static str {
        match self {
            Self::Start => "started",
            Self::Stop => "stopped",
            Self::Restart => "restarted",
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

/// Lifecycle command executor.
pub struct LifecycleCommand<'a, R> {
    service: &'a WireGuardService<R>,
}

impl<'a, R: ProcessRunner> LifecycleCommand<'a, R> {
    /// Create a new lifecycle command.
    #[must_use]
    pub fn new(service: &'a WireGuardService<R>) -> Self {
        Self { service }
    }

    /// Execute `action`.
    ///
    /// `Start`, `Stop` and `Restart` always act on the default interface
    /// and ignore `interface`.
    ///
    /// # Errors
    ///
    /// Returns an error if the operation or output fails.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        action: Action,
        interface: &str,
    ) -> Result<(), CliError> {
        let target = match action {
            Action::Start | Action::Stop | Action::Restart => {
                self.service.control().default_interface().to_string()
            }
            Action::Up | Action::Down => self.service.settings().resolve_interface(interface)?.into_inner(),
        };

        match action {
            Action::Start => self.service.start().await?,
            Action::Stop => self.service.stop().await?,
            Action::Restart => self.service.restart().await?,
            Action::Up => self.service.up(&target).await?,
            Action::Down => self.service.down(&target).await?,
        }

        format.write(writer, &ActionResult::new(action.past_tense(), target))
    }
}
