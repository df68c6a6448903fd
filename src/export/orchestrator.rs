//! ExportOrchestrator implementation: drives the render pipeline across the
//! selected platforms and slide count, packages the results, and coordinates
//! backend persistence.
//!
//! Persistence and rendering are independent concerns: a failed sibling save
//! is surfaced as a warning and never skips rendering. Episode linkage is a
//! non-fatal sub-step.

use std::io::{Cursor, Write};

use chrono::{NaiveDate, Utc};
use tracing::warn;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::draft::{Background, Draft, Platform, Slide};
use crate::error::{DraftError, DraftResult};
use crate::export::model::{
    carousel_filename, multi_platform_filename, slide_filename, ExportArtifact, ExportJob,
    ExportOutcome,
};
use crate::export::service::{
    EpisodeUpsert, ExportRecord, PersistService, PostPayload, PostRecord, SiblingSaveRequest,
};
use crate::render::{RasterImage, RenderContext, RenderPipeline};

/// Coordinates rendering, packaging, and backend persistence for one export.
pub struct ExportOrchestrator<P> {
    persist: P,
    pipeline: RenderPipeline,
    http: reqwest::Client,
    brand: String,
}

impl<P: PersistService + Sync> ExportOrchestrator<P> {
    /// Creates an orchestrator with the default render pipeline.
    pub fn new(persist: P, brand: impl Into<String>) -> Self {
        Self {
            persist,
            pipeline: RenderPipeline::default(),
            http: reqwest::Client::new(),
            brand: brand.into(),
        }
    }

    /// Builder: Use a custom render pipeline.
    pub fn with_pipeline(mut self, pipeline: RenderPipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Exports the draft per the job: renders, packages, persists.
    ///
    /// The draft is read, never mutated.
    pub async fn export_draft(&self, draft: &Draft, job: &ExportJob) -> DraftResult<ExportOutcome> {
        validate(draft, job)?;
        let date = Utc::now().date_naive();
        let mut warnings = Vec::new();

        let (artifact, posts) = if job.platforms.len() == 1 {
            self.export_single_platform(draft, job, date, &mut warnings)
                .await?
        } else {
            self.export_multi_platform(draft, job, date, &mut warnings)
                .await?
        };

        Ok(ExportOutcome {
            artifact,
            posts,
            warnings,
        })
    }

    // =========================================================================
    // SINGLE PLATFORM
    // =========================================================================

    async fn export_single_platform(
        &self,
        draft: &Draft,
        job: &ExportJob,
        date: NaiveDate,
        warnings: &mut Vec<String>,
    ) -> DraftResult<(ExportArtifact, Vec<PostRecord>)> {
        let platform = job.platforms[0];

        // Primary post save comes first and is fatal on failure.
        let payload = PostPayload::from_draft(draft, platform)?;
        let post = self.persist.save_post(&payload).await?;

        let mut entries = self.render_entries(draft, platform, job, date, warnings).await?;
        let artifact = if job.slide_count == 1 {
            let (filename, bytes) = entries
                .pop()
                .ok_or_else(|| DraftError::validation("no slides rendered"))?;
            ExportArtifact::Png { filename, bytes }
        } else {
            ExportArtifact::Archive {
                filename: carousel_filename(&self.brand, &draft.category, platform, date),
                bytes: build_archive(&entries)?,
            }
        };

        self.record_export(&post, job, warnings).await;
        self.upsert_episode_if_linked(draft, &post, warnings).await;
        Ok((artifact, vec![post]))
    }

    // =========================================================================
    // MULTI PLATFORM
    // =========================================================================

    async fn export_multi_platform(
        &self,
        draft: &Draft,
        job: &ExportJob,
        date: NaiveDate,
        warnings: &mut Vec<String>,
    ) -> DraftResult<(ExportArtifact, Vec<PostRecord>)> {
        let source_platform = draft.platform.unwrap_or(job.platforms[0]);
        let request = SiblingSaveRequest {
            post_data: PostPayload::from_draft(draft, source_platform)?,
            platforms: job.platforms.clone(),
            adapt_content: true,
            source_platform,
        };

        let posts = match self.persist.save_sibling_posts(&request).await {
            Ok(posts) => posts,
            Err(error) => {
                warn!(%error, "sibling post save failed");
                warnings.push(format!("posts not saved: {}", error));
                Vec::new()
            }
        };

        // Rendering proceeds for every requested platform regardless of the
        // persistence outcome.
        let mut entries = Vec::new();
        for &platform in &job.platforms {
            let rendered = self.render_entries(draft, platform, job, date, warnings).await?;
            for (name, bytes) in rendered {
                entries.push((format!("{}/{}", platform.as_str(), name), bytes));
            }
        }

        let artifact = ExportArtifact::Archive {
            filename: multi_platform_filename(&self.brand, &draft.category, date),
            bytes: build_archive(&entries)?,
        };

        for post in &posts {
            self.record_export(post, job, warnings).await;
        }
        let episode_post = posts
            .iter()
            .find(|p| p.platform == source_platform)
            .or_else(|| posts.first());
        if let Some(post) = episode_post {
            self.upsert_episode_if_linked(draft, post, warnings).await;
        }

        Ok((artifact, posts))
    }

    // =========================================================================
    // RENDERING
    // =========================================================================

    async fn render_entries(
        &self,
        draft: &Draft,
        platform: Platform,
        job: &ExportJob,
        date: NaiveDate,
        warnings: &mut Vec<String>,
    ) -> DraftResult<Vec<(String, Vec<u8>)>> {
        let cta_fallback = (!draft.content.cta_text.is_empty())
            .then_some(draft.content.cta_text.as_str());

        let mut entries = Vec::with_capacity(job.slide_count);
        for (index, slide) in draft.content.slides.iter().take(job.slide_count).enumerate() {
            let background = self.resolve_background(slide, warnings).await;
            let ctx = RenderContext {
                platform,
                quality: job.quality,
                slide_index: index,
                slide_count: job.slide_count,
                arc: draft.arc.as_ref(),
                cta_fallback,
                background_image: background.as_ref(),
            };
            let surface = self.pipeline.render_slide(slide, &ctx)?;
            let filename = slide_filename(&self.brand, &draft.category, platform, date, index + 1);
            entries.push((filename, surface.to_png()?));
        }
        Ok(entries)
    }

    /// Resolves an image background before rendering so the pipeline stays
    /// pure. Unresolvable images degrade to the theme fallback colour.
    async fn resolve_background(
        &self,
        slide: &Slide,
        warnings: &mut Vec<String>,
    ) -> Option<RasterImage> {
        let Background::Image(url) = &slide.background else {
            return None;
        };
        match self.fetch_background(url).await {
            Ok(image) => Some(image),
            Err(error) => {
                warn!(%url, %error, "background image unavailable");
                warnings.push(format!("background image {} unavailable: {}", url, error));
                None
            }
        }
    }

    async fn fetch_background(&self, url: &str) -> DraftResult<RasterImage> {
        let resp = self.http.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(DraftError::invalid_background(format!(
                "{} ({})",
                url,
                resp.status()
            )));
        }
        let bytes = resp.bytes().await?;
        RasterImage::from_png(&bytes)
    }

    // =========================================================================
    // PERSISTENCE SUB-STEPS
    // =========================================================================

    async fn record_export(&self, post: &PostRecord, job: &ExportJob, warnings: &mut Vec<String>) {
        let record = ExportRecord {
            post_id: post.id.clone(),
            platform: post.platform,
            resolution: job.quality.resolution_label().to_string(),
            slide_count: job.slide_count,
        };
        if let Err(error) = self.persist.record_export(&record).await {
            warn!(%error, "export record failed");
            warnings.push(format!("export record not saved: {}", error));
        }
    }

    async fn upsert_episode_if_linked(
        &self,
        draft: &Draft,
        post: &PostRecord,
        warnings: &mut Vec<String>,
    ) {
        let Some(arc) = draft.arc.as_ref() else {
            return;
        };
        let episode = EpisodeUpsert {
            arc_id: arc.arc_id.clone(),
            episode_number: arc.episode_number,
            post_id: post.id.clone(),
        };
        if let Err(error) = self.persist.upsert_episode(&episode).await {
            warn!(%error, "episode upsert failed");
            warnings.push(format!("episode record not updated: {}", error));
        }
    }
}

// =============================================================================
// VALIDATION / PACKAGING
// =============================================================================

fn validate(draft: &Draft, job: &ExportJob) -> DraftResult<()> {
    if job.platforms.is_empty() {
        return Err(DraftError::validation("no platform selected"));
    }
    if job.slide_count == 0 {
        return Err(DraftError::validation("at least one slide is required"));
    }
    if job.slide_count > draft.content.slides.len() {
        return Err(DraftError::index_out_of_bounds(
            job.slide_count,
            draft.content.slides.len(),
        ));
    }
    if draft.category.trim().is_empty() {
        return Err(DraftError::validation("category is required"));
    }
    for (index, slide) in draft.content.slides.iter().take(job.slide_count).enumerate() {
        if slide.headline.trim().is_empty() {
            return Err(DraftError::validation(format!(
                "slide {} is missing a headline",
                index + 1
            )));
        }
    }
    Ok(())
}

/// Assembles entries into a deterministic ZIP archive.
fn build_archive(entries: &[(String, Vec<u8>)]) -> DraftResult<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, bytes) in entries {
        writer.start_file(name.as_str(), options)?;
        writer.write_all(bytes)?;
    }
    Ok(writer.finish()?.into_inner())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::BTreeSet;
    use std::sync::Mutex;

    use crate::draft::{ArcLink, DraftStore, Quality, Slide};

    struct MockPersist {
        fail_siblings: bool,
        fail_episode: bool,
        calls: Mutex<Vec<String>>,
    }

    impl MockPersist {
        fn new() -> Self {
            Self {
                fail_siblings: false,
                fail_episode: false,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PersistService for MockPersist {
        async fn save_post(&self, payload: &PostPayload) -> DraftResult<PostRecord> {
            self.calls.lock().unwrap().push("save_post".to_string());
            Ok(PostRecord {
                id: "post-1".to_string(),
                platform: payload.platform,
            })
        }

        async fn save_sibling_posts(
            &self,
            request: &SiblingSaveRequest,
        ) -> DraftResult<Vec<PostRecord>> {
            self.calls.lock().unwrap().push("save_siblings".to_string());
            if self.fail_siblings {
                return Err(DraftError::persistence(503, "backend down"));
            }
            Ok(request
                .platforms
                .iter()
                .map(|&platform| PostRecord {
                    id: format!("post-{}", platform.as_str()),
                    platform,
                })
                .collect())
        }

        async fn record_export(&self, record: &ExportRecord) -> DraftResult<()> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("record_export:{}", record.platform.as_str()));
            Ok(())
        }

        async fn upsert_episode(&self, episode: &EpisodeUpsert) -> DraftResult<()> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("episode:{}", episode.arc_id));
            if self.fail_episode {
                return Err(DraftError::persistence(500, "episode backend down"));
            }
            Ok(())
        }
    }

    fn draft_with_slides(n: usize) -> Draft {
        let mut store = DraftStore::new("fitness");
        store.set_headline(0, "Slide 1").unwrap();
        for i in 1..n {
            store.add_slide(Slide::new(format!("Slide {}", i + 1)));
        }
        store.set_cta_text("Follow for more");
        store.draft().clone()
    }

    fn archive_names(artifact: &ExportArtifact) -> Vec<String> {
        let bytes = artifact.bytes().to_vec();
        let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        archive.file_names().map(str::to_string).collect()
    }

    #[tokio::test]
    async fn test_single_slide_direct_png() {
        let orchestrator = ExportOrchestrator::new(MockPersist::new(), "postcraft");
        let draft = draft_with_slides(1);
        let job = ExportJob::new(vec![Platform::Feed], 1, Quality::Standard);

        let outcome = orchestrator.export_draft(&draft, &job).await.unwrap();
        match &outcome.artifact {
            ExportArtifact::Png { filename, bytes } => {
                assert!(filename.ends_with("_01.png"));
                assert!(filename.starts_with("postcraft_fitness_feed_"));
                crate::render::RasterImage::from_png(bytes).unwrap();
            }
            other => panic!("expected direct PNG, got {:?}", other.filename()),
        }
        assert!(outcome.warnings.is_empty());

        let calls = orchestrator.persist.calls();
        assert!(calls.contains(&"save_post".to_string()));
        assert!(calls.contains(&"record_export:feed".to_string()));
    }

    #[tokio::test]
    async fn test_carousel_archive() {
        let orchestrator = ExportOrchestrator::new(MockPersist::new(), "postcraft");
        let draft = draft_with_slides(3);
        let job = ExportJob::new(vec![Platform::Feed], 3, Quality::Standard);

        let outcome = orchestrator.export_draft(&draft, &job).await.unwrap();
        assert!(outcome.artifact.filename().ends_with("_carousel.zip"));

        let names = archive_names(&outcome.artifact);
        assert_eq!(names.len(), 3);
        for suffix in ["_01.png", "_02.png", "_03.png"] {
            assert!(names.iter().any(|n| n.ends_with(suffix)), "missing {}", suffix);
        }
    }

    #[tokio::test]
    async fn test_multi_platform_archive_layout() {
        let orchestrator = ExportOrchestrator::new(MockPersist::new(), "postcraft");
        let draft = draft_with_slides(3);
        let job = ExportJob::new(vec![Platform::Feed, Platform::Story], 3, Quality::Standard);

        let outcome = orchestrator.export_draft(&draft, &job).await.unwrap();
        assert!(outcome.artifact.filename().contains("all_platforms"));
        assert_eq!(outcome.posts.len(), 2);

        let names = archive_names(&outcome.artifact);
        assert_eq!(names.len(), 6);

        let folders: BTreeSet<&str> = names.iter().map(|n| n.split('/').next().unwrap()).collect();
        assert_eq!(folders, BTreeSet::from(["feed", "story"]));
        for folder in ["feed", "story"] {
            for suffix in ["_01.png", "_02.png", "_03.png"] {
                assert!(
                    names
                        .iter()
                        .any(|n| n.starts_with(folder) && n.ends_with(suffix)),
                    "missing {}/{}",
                    folder,
                    suffix
                );
            }
        }

        let calls = orchestrator.persist.calls();
        assert!(calls.contains(&"record_export:feed".to_string()));
        assert!(calls.contains(&"record_export:story".to_string()));
    }

    #[tokio::test]
    async fn test_sibling_save_failure_still_renders() {
        let persist = MockPersist {
            fail_siblings: true,
            ..MockPersist::new()
        };
        let orchestrator = ExportOrchestrator::new(persist, "postcraft");
        let draft = draft_with_slides(2);
        let job = ExportJob::new(vec![Platform::Feed, Platform::Story], 2, Quality::Standard);

        let outcome = orchestrator.export_draft(&draft, &job).await.unwrap();
        assert!(outcome.posts.is_empty());
        assert!(!outcome.warnings.is_empty());
        assert_eq!(archive_names(&outcome.artifact).len(), 4);

        // No export records without saved posts.
        let calls = orchestrator.persist.calls();
        assert!(!calls.iter().any(|c| c.starts_with("record_export")));
    }

    #[tokio::test]
    async fn test_episode_failure_is_non_fatal() {
        let persist = MockPersist {
            fail_episode: true,
            ..MockPersist::new()
        };
        let orchestrator = ExportOrchestrator::new(persist, "postcraft");
        let mut draft = draft_with_slides(1);
        draft.arc = Some(ArcLink::new("arc-1", 2));
        let job = ExportJob::new(vec![Platform::Feed], 1, Quality::Standard);

        let outcome = orchestrator.export_draft(&draft, &job).await.unwrap();
        assert_eq!(outcome.posts.len(), 1);
        assert!(outcome
            .warnings
            .iter()
            .any(|w| w.contains("episode record not updated")));
    }

    #[tokio::test]
    async fn test_validation_rejects_bad_jobs() {
        let orchestrator = ExportOrchestrator::new(MockPersist::new(), "postcraft");
        let draft = draft_with_slides(2);

        let no_platforms = ExportJob::new(vec![], 1, Quality::Standard);
        assert!(matches!(
            orchestrator.export_draft(&draft, &no_platforms).await,
            Err(DraftError::Validation(_))
        ));

        let zero_slides = ExportJob::new(vec![Platform::Feed], 0, Quality::Standard);
        assert!(matches!(
            orchestrator.export_draft(&draft, &zero_slides).await,
            Err(DraftError::Validation(_))
        ));

        let too_many = ExportJob::new(vec![Platform::Feed], 5, Quality::Standard);
        assert!(matches!(
            orchestrator.export_draft(&draft, &too_many).await,
            Err(DraftError::IndexOutOfBounds { .. })
        ));
    }

    #[tokio::test]
    async fn test_validation_requires_headlines() {
        let orchestrator = ExportOrchestrator::new(MockPersist::new(), "postcraft");
        let mut draft = draft_with_slides(2);
        draft.content.slides[1].headline = String::new();
        let job = ExportJob::new(vec![Platform::Feed], 2, Quality::Standard);

        assert!(matches!(
            orchestrator.export_draft(&draft, &job).await,
            Err(DraftError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_high_quality_doubles_output_dimensions() {
        let orchestrator = ExportOrchestrator::new(MockPersist::new(), "postcraft");
        let draft = draft_with_slides(1);
        let job = ExportJob::new(vec![Platform::Feed], 1, Quality::High);

        let outcome = orchestrator.export_draft(&draft, &job).await.unwrap();
        let image = crate::render::RasterImage::from_png(outcome.artifact.bytes()).unwrap();
        assert_eq!((image.width(), image.height()), (2160, 2160));
    }
}
