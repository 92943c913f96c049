use std::{sync::Arc, time::Duration};
use tokio::{
    sync::Mutex,
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::debug;

use crate::questionnaire::SessionController;

/// Periodic autosave for one controller. Dropping the handle stops the timer.
#[derive(Debug)]
pub struct AutosaveHandle {
    task: JoinHandle<()>,
}

impl AutosaveHandle {
    pub fn spawn(controller: Arc<Mutex<SessionController>>, every: Duration) -> Self {
        let task = tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + every, every);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                // the lock serializes this save with user-driven saves and submit
                let mut c = controller.lock().await;
                if c.is_completed() {
                    debug!("attempt completed, stopping autosave");
                    break;
                }
                c.autosave().await;
            }
        });
        Self { task }
    }
}

impl Drop for AutosaveHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
