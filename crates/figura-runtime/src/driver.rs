//! Tokio countdown driver
//!
//! Runs the 1 Hz countdown of the active effect on a tokio task. The task
//! carries the [`TickToken`] it was started for and exits as soon as the
//! orchestrator stops accepting it.

use std::sync::Arc;

use figura_time::TickToken;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

use crate::EditorOrchestrator;

/// Shared editor handle
pub type EditorHandle = Arc<Mutex<EditorOrchestrator>>;

/// Keeps one interval task in line with the editor's countdown schedule
pub struct CountdownDriver {
    editor: EditorHandle,
    task: Option<(TickToken, JoinHandle<()>)>,
}

impl CountdownDriver {
    pub fn new(editor: EditorHandle) -> Self {
        CountdownDriver { editor, task: None }
    }

    pub fn editor(&self) -> &EditorHandle {
        &self.editor
    }

    /// Start, replace or stop the task to match the armed token.
    /// Must be called from within a tokio runtime.
    pub fn sync(&mut self) {
        let (token, period) = {
            let editor = self.editor.lock();
            (editor.countdown_token(), editor.tick_period())
        };

        if let (Some(token), Some((running, handle))) = (token, &self.task) {
            if *running == token && !handle.is_finished() {
                return;
            }
        }

        self.stop();
        let Some(token) = token else {
            return;
        };

        let editor = Arc::clone(&self.editor);
        let handle = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                let live = editor.lock().tick_with(token);
                if !live {
                    break;
                }
            }
            debug!(effect = %token.effect, generation = token.generation, "countdown task finished");
        });

        debug!(effect = %token.effect, generation = token.generation, "countdown task started");
        self.task = Some((token, handle));
    }

    pub fn stop(&mut self) {
        if let Some((token, handle)) = self.task.take() {
            handle.abort();
            debug!(effect = %token.effect, generation = token.generation, "countdown task stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.task
            .as_ref()
            .map_or(false, |(_, handle)| !handle.is_finished())
    }

    /// Run `f` against the editor, then bring the task in line
    pub fn run<R>(&mut self, f: impl FnOnce(&mut EditorOrchestrator) -> R) -> R {
        let result = {
            let mut editor = self.editor.lock();
            f(&mut editor)
        };
        self.sync();
        result
    }
}

impl Drop for CountdownDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EditorConfig, MemoryLookStore, RecordingOutbox};
    use figura_category::StaticFigureStructure;
    use figura_core::{EffectGrant, EffectId, OwnedEffect, ServerEvent};
    use std::time::Duration;

    fn handle() -> EditorHandle {
        let editor = EditorOrchestrator::new(
            EditorConfig::default(),
            Arc::new(StaticFigureStructure::new()),
            Box::new(RecordingOutbox::new()),
            Box::new(MemoryLookStore::new()),
        );
        Arc::new(Mutex::new(editor))
    }

    fn running(id: u32, left: u32) -> ServerEvent {
        ServerEvent::EffectsSnapshot(vec![OwnedEffect {
            effect: EffectId::new(id),
            duration: 60,
            seconds_left_if_active: left,
            is_permanent: false,
        }])
    }

    fn seconds_left(handle: &EditorHandle, id: u32) -> Option<u32> {
        handle
            .lock()
            .lifecycle()
            .ledger()
            .get(EffectId::new(id))
            .map(|meta| meta.seconds_left_if_active)
    }

    #[tokio::test(start_paused = true)]
    async fn test_counts_down_and_exits() {
        let editor = handle();
        let mut driver = CountdownDriver::new(editor.clone());

        driver.run(|e| {
            e.handle_event(&running(5, 3));
            e.show();
        });
        assert!(driver.is_running());

        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(editor.lock().lifecycle().active(), EffectId::NONE);
        assert_eq!(seconds_left(&editor, 5), Some(0));
        assert!(!driver.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_hide_stops_countdown() {
        let editor = handle();
        let mut driver = CountdownDriver::new(editor.clone());

        driver.run(|e| {
            e.handle_event(&running(5, 30));
            e.show();
        });
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(seconds_left(&editor, 5), Some(29));

        driver.run(|e| e.hide());
        assert!(!driver.is_running());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(seconds_left(&editor, 5), Some(29));
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_expiry_stops_task() {
        let editor = handle();
        let mut driver = CountdownDriver::new(editor.clone());

        driver.run(|e| {
            e.handle_event(&running(5, 30));
            e.show();
        });
        driver.run(|e| e.handle_event(&ServerEvent::EffectExpired(EffectId::new(5))));
        assert!(!driver.is_running());
        assert!(seconds_left(&editor, 5).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_active_effect_replaces_task() {
        let editor = handle();
        let mut driver = CountdownDriver::new(editor.clone());

        driver.run(|e| {
            e.handle_event(&running(5, 30));
            e.show();
        });
        let first = editor.lock().countdown_token().unwrap();

        driver.run(|e| {
            e.handle_event(&ServerEvent::EffectActivated(EffectGrant {
                effect: EffectId::new(8),
                duration: 10,
                is_permanent: false,
            }))
        });
        let second = editor.lock().countdown_token().unwrap();
        assert_ne!(first, second);
        assert_eq!(second.effect, EffectId::new(8));

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(seconds_left(&editor, 8), Some(8));
        // The replaced timer no longer ticks effect 5
        assert_eq!(seconds_left(&editor, 5), Some(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_metadata_update_keeps_task() {
        let editor = handle();
        let mut driver = CountdownDriver::new(editor.clone());

        driver.run(|e| {
            e.handle_event(&running(5, 30));
            e.show();
        });
        let first = editor.lock().countdown_token();

        driver.run(|e| {
            e.handle_event(&ServerEvent::EffectAdded(EffectGrant {
                effect: EffectId::new(9),
                duration: 100,
                is_permanent: false,
            }))
        });
        assert_eq!(editor.lock().countdown_token(), first);
        assert!(driver.is_running());
    }
}
