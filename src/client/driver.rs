use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{mpsc, watch},
    time::{self, Instant, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use crate::client::{
    api::ListingSource,
    slideshow::{Command, Slideshow, SyncOutcome, View, AUTOPLAY_INTERVAL, POLL_INTERVAL},
};

#[derive(Debug, Clone)]
pub struct DriverSettings {
    pub autoplay_interval: Duration,
    pub poll_interval: Duration,
    pub start_playing: bool,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            autoplay_interval: AUTOPLAY_INTERVAL,
            poll_interval: POLL_INTERVAL,
            start_playing: true,
        }
    }
}

/// What a renderer needs to draw the current frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub view: View,
    pub current: Option<String>,
    pub position: usize,
    pub total: usize,
    pub playing: bool,
}

impl From<&Slideshow> for Snapshot {
    fn from(slideshow: &Slideshow) -> Self {
        let (position, total) = slideshow.counter();
        Self {
            view: slideshow.view(),
            current: slideshow.current().map(str::to_string),
            position,
            total,
            playing: slideshow.is_playing(),
        }
    }
}

/// Owns the slideshow and multiplexes the autoplay timer, the listing poll
/// and user commands on one task.
pub struct SlideshowDriver {
    source: Arc<dyn ListingSource>,
    settings: DriverSettings,
    slideshow: Slideshow,
    snapshots: watch::Sender<Snapshot>,
}

impl SlideshowDriver {
    pub fn new(
        source: Arc<dyn ListingSource>,
        settings: DriverSettings,
    ) -> (Self, watch::Receiver<Snapshot>) {
        let slideshow = Slideshow::new(settings.start_playing);
        let (snapshots, receiver) = watch::channel(Snapshot::from(&slideshow));

        (
            Self {
                source,
                settings,
                slideshow,
                snapshots,
            },
            receiver,
        )
    }

    /// Runs until `Command::Quit` arrives or every command sender is dropped,
    /// then hands back the final state.
    pub async fn run(mut self, mut commands: mpsc::Receiver<Command>) -> Slideshow {
        self.initial_load().await;

        let mut autoplay_deadline = self.fresh_deadline();
        let mut poll = time::interval_at(
            Instant::now() + self.settings.poll_interval,
            self.settings.poll_interval,
        );
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = time::sleep_until(autoplay_deadline.unwrap_or_else(Instant::now)),
                    if autoplay_deadline.is_some() =>
                {
                    self.slideshow.next();
                    autoplay_deadline = self.fresh_deadline();
                }
                _ = poll.tick() => {
                    self.poll_listing().await;
                    if !self.slideshow.autoplay_active() {
                        autoplay_deadline = None;
                    } else if autoplay_deadline.is_none() {
                        autoplay_deadline = self.fresh_deadline();
                    }
                }
                command = commands.recv() => match command {
                    None | Some(Command::Quit) => break,
                    Some(Command::Next) => {
                        self.slideshow.next();
                        autoplay_deadline = self.fresh_deadline();
                    }
                    Some(Command::Previous) => {
                        self.slideshow.previous();
                        autoplay_deadline = self.fresh_deadline();
                    }
                    Some(Command::TogglePlay) => {
                        let playing = self.slideshow.toggle_play();
                        info!("Autoplay {}", if playing { "resumed" } else { "paused" });
                        autoplay_deadline = self.fresh_deadline();
                    }
                },
            }

            self.publish();
        }

        self.slideshow
    }

    async fn initial_load(&mut self) {
        match self.source.fetch_listing().await {
            Ok(images) => {
                info!("Loaded {} images", images.len());
                self.slideshow.load(images);
            }
            Err(e) => {
                warn!("Failed to load images: {}", e);
                self.slideshow.load_failed();
            }
        }
        self.publish();
    }

    async fn poll_listing(&mut self) {
        match self.source.fetch_listing().await {
            Ok(images) => {
                if self.slideshow.refresh(images) == SyncOutcome::Rerendered {
                    info!(
                        "Listing changed, now {} images",
                        self.slideshow.images().len()
                    );
                }
            }
            Err(e) => warn!("Failed to check for new images: {}", e),
        }
    }

    fn fresh_deadline(&self) -> Option<Instant> {
        self.slideshow
            .autoplay_active()
            .then(|| Instant::now() + self.settings.autoplay_interval)
    }

    fn publish(&self) {
        let snapshot = Snapshot::from(&self.slideshow);
        self.snapshots.send_if_modified(|current| {
            if *current == snapshot {
                return false;
            }
            debug!("Showing {:?} ({}/{})", snapshot.current, snapshot.position, snapshot.total);
            *current = snapshot.clone();
            true
        });
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::VecDeque, sync::Mutex};

    use async_trait::async_trait;

    use super::*;
    use crate::client::error::ClientError;

    /// Replays scripted listings; the last one repeats once the script runs out.
    struct ScriptedSource {
        script: Mutex<VecDeque<Result<Vec<String>, u16>>>,
        last: Mutex<Vec<String>>,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<Vec<&str>, u16>>) -> Arc<Self> {
            let script: VecDeque<Result<Vec<String>, u16>> = script
                .into_iter()
                .map(|r| r.map(|names| names.into_iter().map(String::from).collect()))
                .collect();
            Arc::new(Self {
                script: Mutex::new(script),
                last: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ListingSource for ScriptedSource {
        async fn fetch_listing(&self) -> Result<Vec<String>, ClientError> {
            let next = self.script.lock().unwrap().pop_front();
            match next {
                Some(Ok(images)) => {
                    *self.last.lock().unwrap() = images.clone();
                    Ok(images)
                }
                Some(Err(status)) => Err(ClientError::Status {
                    status,
                    message: "scripted failure".to_string(),
                }),
                None => Ok(self.last.lock().unwrap().clone()),
            }
        }
    }

    fn spawn(
        source: Arc<ScriptedSource>,
        settings: DriverSettings,
    ) -> (
        mpsc::Sender<Command>,
        watch::Receiver<Snapshot>,
        tokio::task::JoinHandle<Slideshow>,
    ) {
        let (driver, snapshots) = SlideshowDriver::new(source, settings);
        let (tx, rx) = mpsc::channel(8);
        let handle = tokio::spawn(driver.run(rx));
        (tx, snapshots, handle)
    }

    async fn sleep_ms(ms: u64) {
        time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn autoplay_advances_every_interval() {
        let source = ScriptedSource::new(vec![Ok(vec!["c", "b", "a"])]);
        let (tx, snapshots, handle) = spawn(source, DriverSettings::default());

        sleep_ms(100).await;
        assert_eq!(snapshots.borrow().current.as_deref(), Some("c"));

        sleep_ms(5_000).await;
        assert_eq!(snapshots.borrow().current.as_deref(), Some("b"));

        sleep_ms(5_000).await;
        sleep_ms(5_000).await;
        assert_eq!(snapshots.borrow().current.as_deref(), Some("c"));

        tx.send(Command::Quit).await.unwrap();
        let show = handle.await.unwrap();
        assert_eq!(show.current_index(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_navigation_restarts_the_timer() {
        let source = ScriptedSource::new(vec![Ok(vec!["a", "b", "c"])]);
        let (tx, snapshots, handle) = spawn(source, DriverSettings::default());

        sleep_ms(4_000).await;
        tx.send(Command::Next).await.unwrap();
        sleep_ms(100).await;
        assert_eq!(snapshots.borrow().current.as_deref(), Some("b"));

        // The old deadline at 5s no longer applies.
        sleep_ms(2_000).await;
        assert_eq!(snapshots.borrow().current.as_deref(), Some("b"));

        sleep_ms(3_000).await;
        assert_eq!(snapshots.borrow().current.as_deref(), Some("c"));

        drop(tx);
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn pause_suspends_and_resume_starts_a_full_interval() {
        let source = ScriptedSource::new(vec![Ok(vec!["a", "b"])]);
        let (tx, snapshots, handle) = spawn(source, DriverSettings::default());

        sleep_ms(1_000).await;
        tx.send(Command::TogglePlay).await.unwrap();
        sleep_ms(20_000).await;
        assert_eq!(snapshots.borrow().current.as_deref(), Some("a"));
        assert!(!snapshots.borrow().playing);

        tx.send(Command::TogglePlay).await.unwrap();
        sleep_ms(4_900).await;
        assert_eq!(snapshots.borrow().current.as_deref(), Some("a"));
        sleep_ms(200).await;
        assert_eq!(snapshots.borrow().current.as_deref(), Some("b"));

        tx.send(Command::Quit).await.unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn poll_picks_up_new_images_and_keeps_index() {
        let source = ScriptedSource::new(vec![
            Ok(vec!["b.jpg", "a.jpg"]),
            Ok(vec!["c.jpg", "b.jpg", "a.jpg"]),
        ]);
        let settings = DriverSettings {
            start_playing: false,
            ..DriverSettings::default()
        };
        let (tx, snapshots, handle) = spawn(source, settings);

        sleep_ms(100).await;
        assert_eq!(snapshots.borrow().total, 2);
        assert_eq!(snapshots.borrow().current.as_deref(), Some("b.jpg"));

        sleep_ms(10_000).await;
        assert_eq!(snapshots.borrow().total, 3);
        assert_eq!(snapshots.borrow().position, 1);
        assert_eq!(snapshots.borrow().current.as_deref(), Some("c.jpg"));

        tx.send(Command::Quit).await.unwrap();
        let show = handle.await.unwrap();
        assert_eq!(show.render_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_start_shows_error_until_a_poll_succeeds() {
        let source = ScriptedSource::new(vec![Err(500), Err(503), Ok(vec!["a.png"])]);
        let (tx, snapshots, handle) = spawn(source, DriverSettings::default());

        sleep_ms(100).await;
        assert_eq!(snapshots.borrow().view, View::LoadError);

        sleep_ms(10_000).await;
        assert_eq!(snapshots.borrow().view, View::LoadError);

        sleep_ms(10_000).await;
        assert_eq!(snapshots.borrow().view, View::Slides);
        assert_eq!(snapshots.borrow().current.as_deref(), Some("a.png"));

        tx.send(Command::Quit).await.unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn autoplay_starts_once_a_second_image_arrives() {
        let source = ScriptedSource::new(vec![Ok(vec!["a"]), Ok(vec!["b", "a"])]);
        let (tx, snapshots, handle) = spawn(source, DriverSettings::default());

        sleep_ms(9_000).await;
        assert_eq!(snapshots.borrow().current.as_deref(), Some("a"));

        // The 10s poll grows the listing; index 0 now shows the new image.
        sleep_ms(1_100).await;
        assert_eq!(snapshots.borrow().current.as_deref(), Some("b"));
        sleep_ms(5_000).await;
        assert_eq!(snapshots.borrow().current.as_deref(), Some("a"));

        tx.send(Command::Quit).await.unwrap();
        handle.await.unwrap();
    }
}
