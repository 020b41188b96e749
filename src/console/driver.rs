//! Runs a controller's virtual clock against tokio time.
//!
//! The controllers only know virtual time. Inside an async UI loop the driver
//! sleeps until the next deadline and fires what came due, which gives the
//! same ordering guarantees as advancing the clock by hand.

use super::{controller::ScreenController, dialogs::DialogKind, types::Entity};
use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

/// Maps a controller's virtual clock onto `tokio::time`
#[derive(Debug, Clone, Copy)]
pub struct ControllerDriver {
    /// Wall instant matching virtual time `base`
    origin: Instant,
    base: Duration,
}

impl ControllerDriver {
    /// Anchor the controller's current virtual time to now
    pub fn new<K: DialogKind, E: Entity + 'static>(controller: &ScreenController<K, E>) -> Self {
        Self {
            origin: Instant::now(),
            base: controller.now(),
        }
    }

    /// Virtual time corresponding to the current wall time
    pub fn virtual_now(&self) -> Duration {
        self.base + self.origin.elapsed()
    }

    /// Fire everything that came due while the caller was busy elsewhere
    pub fn catch_up<K: DialogKind, E: Entity + 'static>(
        &self,
        controller: &mut ScreenController<K, E>,
    ) {
        controller.advance_to(self.virtual_now());
    }

    /// Sleep through every scheduled timer until the controller is quiet
    pub async fn run_until_idle<K: DialogKind, E: Entity + 'static>(
        &self,
        controller: &mut ScreenController<K, E>,
    ) {
        while let Some(deadline) = controller.next_deadline() {
            self.sleep_until_virtual(deadline).await;
            controller.advance_to(deadline.max(self.virtual_now()));
        }
        debug!("Controller idle at {:?}", controller.now());
    }

    /// Run timers for `duration` of wall time
    pub async fn run_for<K: DialogKind, E: Entity + 'static>(
        &self,
        controller: &mut ScreenController<K, E>,
        duration: Duration,
    ) {
        let end = self.virtual_now() + duration;
        loop {
            match controller.next_deadline() {
                Some(deadline) if deadline <= end => {
                    self.sleep_until_virtual(deadline).await;
                    controller.advance_to(deadline);
                }
                _ => {
                    self.sleep_until_virtual(end).await;
                    controller.advance_to(end);
                    return;
                }
            }
        }
    }

    async fn sleep_until_virtual(&self, at: Duration) {
        if let Some(offset) = at.checked_sub(self.base) {
            sleep_until(self.origin + offset).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::screens::SectionDialog;
    use crate::console::types::Record;
    use std::sync::Arc;

    type Controller = ScreenController<SectionDialog, Record>;

    #[tokio::test(start_paused = true)]
    async fn test_run_until_idle_completes_notification() {
        let mut controller = Controller::default();
        controller.open_modal("editSection", Some(Arc::new(Record::new(12))));
        controller.show_success_message("Section updated");

        let driver = ControllerDriver::new(&controller);
        let started = Instant::now();
        driver.run_until_idle(&mut controller).await;

        assert!(started.elapsed() >= Duration::from_millis(3600));
        assert!(!controller.is_busy());
        assert!(controller.active_modal_payload().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_for_stops_mid_cycle() {
        let mut controller = Controller::default();
        controller.show_success_message("Section added");

        let driver = ControllerDriver::new(&controller);
        driver.run_for(&mut controller, Duration::from_millis(1000)).await;

        assert!(controller.notification_state().visible);
        assert_eq!(controller.now(), Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_catch_up_after_external_wait() {
        let mut controller = Controller::default();
        controller.open_modal("viewSection", None);
        controller.open_modal("deleteSection", None);

        let driver = ControllerDriver::new(&controller);
        tokio::time::sleep(Duration::from_millis(500)).await;
        driver.catch_up(&mut controller);

        assert_eq!(controller.active_modal_kind(), Some("deleteSection"));
    }
}
