use std::sync::Arc;
use std::time::Duration;

use flipbook::config::ScrollGalleryConfig;
use flipbook::events::{WheelDisposition, WheelGesture};
use flipbook::gallery::GalleryContext;
use flipbook::probe::ProbeOptions;
use flipbook::surface::LOADING_CLASS;
use flipbook::tasks::scroll_gallery;
use flipbook::testkit::{MemorySource, RecordingSurface};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

struct Harness {
    surface: Arc<RecordingSurface>,
    wheel: mpsc::Sender<WheelGesture>,
    cancel: CancellationToken,
    handle: JoinHandle<anyhow::Result<()>>,
}

impl Harness {
    fn start(source: MemorySource) -> Self {
        let surface = Arc::new(RecordingSurface::default());
        let ctx = GalleryContext::new(Arc::new(source), surface.clone()).with_probe_options(
            ProbeOptions {
                max_number: 9,
                ..ProbeOptions::default()
            },
        );
        let (wheel, wheel_rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(scroll_gallery::run(
            ScrollGalleryConfig::default(),
            ctx,
            wheel_rx,
            cancel.clone(),
        ));
        Self {
            surface,
            wheel,
            cancel,
            handle,
        }
    }

    async fn wheel(&self, delta_y: f64) -> WheelDisposition {
        let (gesture, reply) = WheelGesture::with_reply(delta_y);
        self.wheel.send(gesture).await.expect("gallery running");
        reply.await.expect("gallery replied")
    }

    async fn stop(self) {
        self.cancel.cancel();
        self.handle.await.expect("join").expect("gallery result");
    }
}

fn three_images() -> MemorySource {
    MemorySource::with_images(["g_001.jpg", "g_002.png", "g_003.jpg"])
}

#[tokio::test(start_paused = true)]
async fn wheel_walks_the_sequence_and_releases_the_page_at_the_end() {
    let gallery = Harness::start(three_images());
    sleep(Duration::from_millis(350)).await;
    assert_eq!(gallery.surface.shown(), vec!["g_001.jpg"]);
    assert_eq!(gallery.surface.last_label().as_deref(), Some("Image 1"));

    assert_eq!(gallery.wheel(40.0).await, WheelDisposition::Consumed);
    sleep(Duration::from_millis(350)).await;
    assert_eq!(gallery.wheel(40.0).await, WheelDisposition::Consumed);
    sleep(Duration::from_millis(350)).await;
    assert_eq!(
        gallery.surface.shown(),
        vec!["g_001.jpg", "g_002.png", "g_003.jpg"]
    );
    assert_eq!(gallery.surface.last_label().as_deref(), Some("Image 3"));

    // exhausted: downward scroll belongs to the page again
    assert_eq!(gallery.wheel(40.0).await, WheelDisposition::PassThrough);
    assert_eq!(gallery.wheel(40.0).await, WheelDisposition::PassThrough);

    assert_eq!(gallery.wheel(-40.0).await, WheelDisposition::Consumed);
    sleep(Duration::from_millis(350)).await;
    assert_eq!(gallery.surface.shown().last().map(String::as_str), Some("g_002.png"));
    assert_eq!(gallery.surface.class_enabled(LOADING_CLASS), Some(false));

    gallery.stop().await;
}

#[tokio::test(start_paused = true)]
async fn burst_of_wheel_events_moves_one_image() {
    let gallery = Harness::start(three_images());
    sleep(Duration::from_millis(350)).await;

    assert_eq!(gallery.wheel(40.0).await, WheelDisposition::Consumed);
    sleep(Duration::from_millis(10)).await;
    assert_eq!(gallery.wheel(40.0).await, WheelDisposition::Consumed);
    sleep(Duration::from_millis(400)).await;

    assert_eq!(gallery.surface.shown(), vec!["g_001.jpg", "g_002.png"]);
    gallery.stop().await;
}

#[tokio::test(start_paused = true)]
async fn settle_delay_holds_the_transition_lock() {
    let gallery = Harness::start(three_images());
    sleep(Duration::from_millis(350)).await;

    gallery.wheel(40.0).await;
    // past the gesture spacing but inside the settle delay
    sleep(Duration::from_millis(200)).await;
    gallery.wheel(40.0).await;
    sleep(Duration::from_millis(200)).await;
    assert_eq!(gallery.surface.shown(), vec!["g_001.jpg", "g_002.png"]);

    gallery.wheel(40.0).await;
    sleep(Duration::from_millis(50)).await;
    assert_eq!(
        gallery.surface.shown(),
        vec!["g_001.jpg", "g_002.png", "g_003.jpg"]
    );
    gallery.stop().await;
}

#[tokio::test(start_paused = true)]
async fn slow_loads_keep_the_lock_until_settled() {
    let gallery = Harness::start(three_images().with_delay(Duration::from_millis(500)));
    // probe done at 500ms, first image shown at 1000ms, lock free at 1300ms
    sleep(Duration::from_millis(1100)).await;
    assert_eq!(gallery.surface.shown(), vec!["g_001.jpg"]);
    assert_eq!(gallery.surface.class_enabled(LOADING_CLASS), Some(false));

    sleep(Duration::from_millis(250)).await;
    gallery.wheel(40.0).await;
    assert_eq!(gallery.surface.class_enabled(LOADING_CLASS), Some(true));

    // loaded 500ms later, locked for another 300ms
    sleep(Duration::from_millis(600)).await;
    gallery.wheel(40.0).await;
    assert_eq!(gallery.surface.class_enabled(LOADING_CLASS), Some(false));
    assert_eq!(gallery.surface.shown(), vec!["g_001.jpg", "g_002.png"]);

    sleep(Duration::from_millis(250)).await;
    gallery.wheel(40.0).await;
    assert_eq!(gallery.surface.class_enabled(LOADING_CLASS), Some(true));
    sleep(Duration::from_millis(600)).await;

    assert_eq!(
        gallery.surface.shown(),
        vec!["g_001.jpg", "g_002.png", "g_003.jpg"]
    );
    gallery.stop().await;
}

#[tokio::test(start_paused = true)]
async fn failed_load_keeps_current_image_and_releases_lock() {
    let source = MemorySource::with_images(["g_001.jpg", "g_003.jpg"]).with_broken("g_002.jpg");
    let gallery = Harness::start(source);
    sleep(Duration::from_millis(350)).await;

    gallery.wheel(40.0).await;
    sleep(Duration::from_millis(1)).await;
    assert_eq!(gallery.surface.shown(), vec!["g_001.jpg"]);
    assert_eq!(gallery.surface.class_enabled(LOADING_CLASS), Some(false));

    // only the gesture spacing stands in the way now
    sleep(Duration::from_millis(160)).await;
    gallery.wheel(40.0).await;
    sleep(Duration::from_millis(1)).await;
    assert_eq!(gallery.surface.shown(), vec!["g_001.jpg", "g_003.jpg"]);
    gallery.stop().await;
}

#[tokio::test(start_paused = true)]
async fn empty_probe_shows_naming_help_and_never_intercepts() {
    let source = MemorySource::with_images(["h_001.jpg"]);
    let gallery = Harness::start(source);
    sleep(Duration::from_millis(10)).await;

    assert_eq!(
        gallery.surface.errors(),
        vec![
            "No image files found.\n\
             Image file names must use the g_number format (e.g. g_001.jpg, g_002.png).\n\
             Numbers must be zero-padded to 3 digits (001, 002, 003...).\n\
             Place the image files in the image folder next to this page."
        ]
    );
    assert!(gallery.surface.shown().is_empty());
    assert_eq!(gallery.wheel(40.0).await, WheelDisposition::PassThrough);
    assert_eq!(gallery.wheel(-40.0).await, WheelDisposition::PassThrough);
    gallery.stop().await;
}

#[tokio::test(start_paused = true)]
async fn gestures_during_probe_pass_through() {
    let gallery = Harness::start(three_images().with_delay(Duration::from_millis(200)));
    sleep(Duration::from_millis(50)).await;
    assert_eq!(gallery.wheel(40.0).await, WheelDisposition::PassThrough);
    gallery.stop().await;
}

#[tokio::test(start_paused = true)]
async fn closing_the_gesture_channel_ends_the_task() {
    let Harness {
        wheel, handle, ..
    } = Harness::start(three_images());
    sleep(Duration::from_millis(10)).await;
    drop(wheel);
    handle.await.expect("join").expect("gallery result");
}
