//! End-to-end composition and export tests against a recording mock engine
//! and a local mock media server.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sreel_compose::{
    ArtifactLocation, ClipSource, ComposeError, Composition, CompositorState, Diagnostic,
    EngineError, EngineResult, ExportPipeline, ExportStrategy, NoSaveCapability,
    SaveLocationPicker, TimelineCompositor,
};
use sreel_media::{FetchConfig, MediaFetcher, MediaResolver};
use sreel_models::{Point, RenderSettings, ScriptTimeline, Section};
use sreel_store::Database;

/// One recorded clip insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Inserted {
    Audio {
        url: String,
        offset: u64,
    },
    Video {
        url: String,
        offset: u64,
        duration: u64,
        muted: bool,
    },
    Image {
        url: String,
        offset: u64,
        duration: u64,
    },
}

/// Mock engine composition that records insertions and writes render output
/// to the destination file.
struct RecordingComposition {
    clips: Vec<Inserted>,
    renders: usize,
    failing_renders: usize,
    last_settings: Option<RenderSettings>,
}

impl RecordingComposition {
    fn new() -> Self {
        Self {
            clips: Vec::new(),
            renders: 0,
            failing_renders: 0,
            last_settings: None,
        }
    }

    /// Fail the first `n` render calls.
    fn failing_first_renders(n: usize) -> Self {
        Self {
            failing_renders: n,
            ..Self::new()
        }
    }
}

#[async_trait]
impl Composition for RecordingComposition {
    fn resolution(&self) -> (u32, u32) {
        (1280, 720)
    }

    fn add_audio_clip(&mut self, source: ClipSource, offset_frames: u64) -> EngineResult<()> {
        self.clips.push(Inserted::Audio {
            url: source.url,
            offset: offset_frames,
        });
        Ok(())
    }

    fn add_video_clip(
        &mut self,
        source: ClipSource,
        offset_frames: u64,
        duration_frames: u64,
        muted: bool,
    ) -> EngineResult<()> {
        self.clips.push(Inserted::Video {
            url: source.url,
            offset: offset_frames,
            duration: duration_frames,
            muted,
        });
        Ok(())
    }

    fn add_image_clip(
        &mut self,
        source: ClipSource,
        offset_frames: u64,
        duration_frames: u64,
    ) -> EngineResult<()> {
        self.clips.push(Inserted::Image {
            url: source.url,
            offset: offset_frames,
            duration: duration_frames,
        });
        Ok(())
    }

    async fn render(&mut self, settings: &RenderSettings, destination: &Path) -> EngineResult<()> {
        self.renders += 1;
        self.last_settings = Some(settings.clone());
        if self.renders <= self.failing_renders {
            return Err(EngineError::render("simulated encoder failure"));
        }
        std::fs::write(destination, b"artifact").map_err(|e| EngineError::render(e.to_string()))?;
        Ok(())
    }
}

/// Opt-in log output: RUST_LOG=debug cargo test -p sreel-compose
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn compositor(store: Arc<Database>) -> TimelineCompositor {
    init_tracing();
    let fetcher = MediaFetcher::new(FetchConfig::default()).unwrap();
    TimelineCompositor::new(MediaResolver::new(store, fetcher))
}

async fn serve(server: &MockServer, route: &str, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .mount(server)
        .await;
}

fn point(server: &MockServer, name: &str, start: u64, end: u64) -> Point {
    Point {
        text: String::new(),
        video_id: name.to_string(),
        video_url: format!("{}/{}.mp4", server.uri(), name),
        video_thumbnail: format!("{}/{}.jpg", server.uri(), name),
        start_time: start,
        end_time: end,
    }
}

fn section(server: &MockServer, id: &str, points: Vec<Point>) -> Section {
    Section {
        section_id: id.to_string(),
        audio_url: Some(format!("{}/{}.mp3", server.uri(), id)),
        voice_over_id: format!("voice-{}", id),
        points,
    }
}

#[tokio::test]
async fn test_section_composes_audio_and_trimmed_video() {
    let server = MockServer::start().await;
    serve(&server, "/s1.mp3", b"voice").await;
    serve(&server, "/p1.mp4", b"frames").await;

    let timeline = ScriptTimeline {
        success: true,
        sections: vec![section(&server, "s1", vec![point(&server, "p1", 0, 5000)])],
    };

    let store = Arc::new(Database::open_in_memory().unwrap());
    let mut comp = RecordingComposition::new();
    let mut compositor = compositor(store);

    let report = compositor.compose(&timeline, &mut comp).await.unwrap();

    assert_eq!(
        comp.clips,
        vec![
            Inserted::Audio {
                url: format!("{}/s1.mp3", server.uri()),
                offset: 0,
            },
            Inserted::Video {
                url: format!("{}/p1.mp4", server.uri()),
                offset: 0,
                duration: 150,
                muted: true,
            },
        ]
    );
    assert_eq!(report.audio_clips, 1);
    assert_eq!(report.video_clips, 1);
    assert_eq!(report.duration_frames, 150);
    assert!(report.diagnostics.is_empty());
    assert_eq!(compositor.state(), CompositorState::Ready);
}

#[tokio::test]
async fn test_mov_video_produces_single_placeholder() {
    let server = MockServer::start().await;
    serve(&server, "/s1.mp3", b"voice").await;
    serve(&server, "/p1.jpg", b"pixels").await;

    let mut unsupported = point(&server, "p1", 2000, 4000);
    unsupported.video_url = format!("{}/p1.mov", server.uri());

    let timeline = ScriptTimeline {
        success: true,
        sections: vec![section(&server, "s1", vec![unsupported])],
    };

    let store = Arc::new(Database::open_in_memory().unwrap());
    let mut comp = RecordingComposition::new();
    let mut compositor = compositor(store);

    let report = compositor.compose(&timeline, &mut comp).await.unwrap();

    // The placeholder occupies the point's exact frame range; the timeline
    // has no gap where the point was declared.
    let placeholders: Vec<&Inserted> = comp
        .clips
        .iter()
        .filter(|c| matches!(c, Inserted::Image { .. }))
        .collect();
    assert_eq!(
        placeholders,
        vec![&Inserted::Image {
            url: format!("{}/p1.jpg", server.uri()),
            offset: 60,
            duration: 60,
        }]
    );
    assert_eq!(report.placeholder_clips, 1);
    assert_eq!(report.video_clips, 0);
    assert!(matches!(
        report.diagnostics.as_slice(),
        [Diagnostic::PlaceholderUsed { reason, .. }] if reason.as_str() == "unsupported format"
    ));
}

#[tokio::test]
async fn test_zero_duration_point_inserts_zero_length_clip() {
    let server = MockServer::start().await;
    serve(&server, "/s1.mp3", b"voice").await;
    serve(&server, "/p1.mp4", b"frames").await;

    let timeline = ScriptTimeline {
        success: true,
        sections: vec![section(&server, "s1", vec![point(&server, "p1", 3000, 3000)])],
    };

    let store = Arc::new(Database::open_in_memory().unwrap());
    let mut comp = RecordingComposition::new();

    compositor(store).compose(&timeline, &mut comp).await.unwrap();

    assert!(comp.clips.contains(&Inserted::Video {
        url: format!("{}/p1.mp4", server.uri()),
        offset: 90,
        duration: 0,
        muted: true,
    }));
}

#[tokio::test]
async fn test_compose_twice_fetches_each_asset_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/s1.mp3"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"voice".to_vec()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/p1.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"frames".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let timeline = ScriptTimeline {
        success: true,
        sections: vec![section(&server, "s1", vec![point(&server, "p1", 0, 1000)])],
    };

    // Two separate builds sharing one store: the second is served entirely
    // from cache.
    let store = Arc::new(Database::open_in_memory().unwrap());
    let mut first = RecordingComposition::new();
    compositor(store.clone())
        .compose(&timeline, &mut first)
        .await
        .unwrap();

    let mut second = RecordingComposition::new();
    compositor(store)
        .compose(&timeline, &mut second)
        .await
        .unwrap();

    assert_eq!(first.clips, second.clips);
}

#[tokio::test]
async fn test_audio_failure_degrades_without_aborting() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/s1.mp3"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    serve(&server, "/p1.mp4", b"frames").await;

    let timeline = ScriptTimeline {
        success: true,
        sections: vec![section(&server, "s1", vec![point(&server, "p1", 0, 2000)])],
    };

    let store = Arc::new(Database::open_in_memory().unwrap());
    let mut comp = RecordingComposition::new();
    let mut compositor = compositor(store);

    let report = compositor.compose(&timeline, &mut comp).await.unwrap();

    // Narration is lost, footage still lands
    assert_eq!(report.audio_clips, 0);
    assert_eq!(report.video_clips, 1);
    assert!(matches!(
        report.diagnostics.as_slice(),
        [Diagnostic::AudioSkipped { .. }]
    ));
    assert_eq!(compositor.state(), CompositorState::Ready);
}

#[tokio::test]
async fn test_thumbnail_failure_skips_point_entirely() {
    let server = MockServer::start().await;
    serve(&server, "/s1.mp3", b"voice").await;

    let mut p = point(&server, "p1", 0, 2000);
    p.video_url = format!("{}/p1.mov", server.uri());
    p.video_thumbnail = format!("{}/missing.jpg", server.uri());

    let timeline = ScriptTimeline {
        success: true,
        sections: vec![section(&server, "s1", vec![p])],
    };

    let store = Arc::new(Database::open_in_memory().unwrap());
    let mut comp = RecordingComposition::new();
    let mut compositor = compositor(store);

    let report = compositor.compose(&timeline, &mut comp).await.unwrap();

    assert_eq!(report.skipped_points, 1);
    assert_eq!(report.placeholder_clips, 0);
    assert!(report
        .diagnostics
        .iter()
        .any(|d| matches!(d, Diagnostic::PointSkipped { .. })));
    // The audio insertion still happened; only the visual is gone
    assert_eq!(comp.clips.len(), 1);
    assert_eq!(compositor.state(), CompositorState::Ready);
}

#[tokio::test]
async fn test_empty_section_narrates_at_previous_end() {
    let server = MockServer::start().await;
    serve(&server, "/s1.mp3", b"voice one").await;
    serve(&server, "/s2.mp3", b"voice two").await;
    serve(&server, "/p1.mp4", b"frames").await;

    let timeline = ScriptTimeline {
        success: true,
        sections: vec![
            section(&server, "s1", vec![point(&server, "p1", 0, 3000)]),
            section(&server, "s2", vec![]),
        ],
    };

    let store = Arc::new(Database::open_in_memory().unwrap());
    let mut comp = RecordingComposition::new();

    compositor(store).compose(&timeline, &mut comp).await.unwrap();

    // The empty section is a zero-length marker at the previous section's
    // end, and its narration is still inserted there.
    assert!(comp.clips.contains(&Inserted::Audio {
        url: format!("{}/s2.mp3", server.uri()),
        offset: 90,
    }));
}

#[tokio::test]
async fn test_overlapping_points_both_inserted_in_order() {
    let server = MockServer::start().await;
    serve(&server, "/s1.mp3", b"voice").await;
    serve(&server, "/p1.mp4", b"frames one").await;
    serve(&server, "/p2.mp4", b"frames two").await;

    let timeline = ScriptTimeline {
        success: true,
        sections: vec![section(
            &server,
            "s1",
            vec![point(&server, "p1", 0, 3000), point(&server, "p2", 2000, 5000)],
        )],
    };

    let store = Arc::new(Database::open_in_memory().unwrap());
    let mut comp = RecordingComposition::new();

    compositor(store).compose(&timeline, &mut comp).await.unwrap();

    // Overlap is passed through uncorrected, in array order
    let videos: Vec<&Inserted> = comp
        .clips
        .iter()
        .filter(|c| matches!(c, Inserted::Video { .. }))
        .collect();
    assert_eq!(
        videos,
        vec![
            &Inserted::Video {
                url: format!("{}/p1.mp4", server.uri()),
                offset: 0,
                duration: 90,
                muted: true,
            },
            &Inserted::Video {
                url: format!("{}/p2.mp4", server.uri()),
                offset: 60,
                duration: 90,
                muted: true,
            },
        ]
    );
}

#[tokio::test]
async fn test_export_without_capability_uses_anonymous_strategy() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let mut comp = RecordingComposition::new();
    let pipeline = ExportPipeline::new(30, dir.path().join("saved"));

    let ArtifactLocation { path, strategy } = pipeline
        .export(&mut comp, &NoSaveCapability, "my-video.mp4")
        .await
        .unwrap();

    assert_eq!(strategy, ExportStrategy::Anonymous);
    assert!(path.exists());
    assert!(path.to_string_lossy().ends_with("my-video.mp4"));

    // Fixed settings: composition resolution, pipeline fps
    let settings = comp.last_settings.unwrap();
    assert_eq!(settings.video.width, 1280);
    assert_eq!(settings.video.height, 720);
    assert_eq!(settings.video.fps, 30);
}

#[tokio::test]
async fn test_export_falls_back_when_direct_render_fails() {
    struct PickInto(PathBuf);

    #[async_trait]
    impl SaveLocationPicker for PickInto {
        async fn pick(
            &self,
            suggested_filename: &str,
        ) -> Result<Option<PathBuf>, Box<dyn std::error::Error + Send + Sync>> {
            Ok(Some(self.0.join(suggested_filename)))
        }
    }

    let dir = tempfile::tempdir().unwrap();
    let mut comp = RecordingComposition::failing_first_renders(1);
    let pipeline = ExportPipeline::new(30, dir.path().join("saved"));
    let picker = PickInto(dir.path().to_path_buf());

    let ArtifactLocation { path, strategy } = pipeline
        .export(&mut comp, &picker, "my-video.mp4")
        .await
        .unwrap();

    // The strategy-1 failure is swallowed and the anonymous render succeeds
    assert_eq!(strategy, ExportStrategy::Anonymous);
    assert!(path.exists());
    assert_eq!(comp.renders, 2);
}

#[tokio::test]
async fn test_export_surfaces_error_when_both_strategies_fail() {
    let dir = tempfile::tempdir().unwrap();
    let mut comp = RecordingComposition::failing_first_renders(2);
    let pipeline = ExportPipeline::new(30, dir.path().join("saved"));

    let err = pipeline
        .export(&mut comp, &NoSaveCapability, "my-video.mp4")
        .await
        .unwrap_err();

    assert!(matches!(err, sreel_compose::ExportError::Engine(_)));
}

#[tokio::test]
async fn test_composed_timeline_persists_and_replays_from_history() {
    let server = MockServer::start().await;
    serve(&server, "/s1.mp3", b"voice").await;
    serve(&server, "/p1.mp4", b"frames").await;

    let timeline = ScriptTimeline {
        success: true,
        sections: vec![section(&server, "s1", vec![point(&server, "p1", 0, 5000)])],
    };

    let store = Arc::new(Database::open_in_memory().unwrap());
    let id = store.history_put(&timeline, "Replayable").unwrap();

    // Replay: load the stored timeline and compose it again
    let stored = store.history_get(&id).unwrap().unwrap();
    let mut comp = RecordingComposition::new();
    let report = compositor(store)
        .compose(&stored.timeline, &mut comp)
        .await
        .unwrap();

    assert_eq!(report.video_clips, 1);
    assert_eq!(report.audio_clips, 1);
    assert_eq!(stored.title, "Replayable");
}

#[tokio::test]
async fn test_failed_timeline_never_touches_engine_or_network() {
    let timeline = ScriptTimeline {
        success: false,
        sections: vec![],
    };

    let store = Arc::new(Database::open_in_memory().unwrap());
    let mut comp = RecordingComposition::new();
    let mut compositor = compositor(store);

    let err = compositor.compose(&timeline, &mut comp).await.unwrap_err();
    assert!(matches!(err, ComposeError::Structural(_)));
    assert!(comp.clips.is_empty());
    assert_eq!(compositor.state(), CompositorState::Failed);
}
