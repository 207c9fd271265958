//! Per-identifier pipeline: fetch, classify, capture, extract, archive

use super::Harvester;
use crate::archive::archive_artifact_async;
use crate::capture::{attachment_path, find_attachment, snapshot_path};
use crate::error::Result;
use crate::types::{
    ArtifactKind, AttachmentRef, CaptureArtifact, Classification, Event, IdOutcome, MissReason,
    ProcessedRecord, RecordId,
};
use scraper::Html;
use tracing::{debug, info, warn};
use url::Url;

impl Harvester {
    /// Run the pipeline for one identifier
    ///
    /// Malformed identifiers are misses and never reach the network. Under the
    /// stop-when-full policy the budget is checked before the page is fetched.
    /// Unexpected failures are contained here and reported as
    /// [`IdOutcome::Fault`].
    pub async fn process_id(&self, raw: &str) -> IdOutcome {
        let Some(id) = RecordId::parse(raw) else {
            debug!(raw, "skipping malformed identifier");
            return IdOutcome::Miss(MissReason::InvalidId);
        };

        if self.budget.is_full() {
            return IdOutcome::StorageFull;
        }

        match self.process_record(&id).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(record_id = %id, error = %e, "identifier failed");
                self.emit_event(Event::Fault {
                    id: id.to_string(),
                    error: e.to_string(),
                });
                IdOutcome::Fault(e.to_string())
            }
        }
    }

    async fn process_record(&self, id: &RecordId) -> Result<IdOutcome> {
        let page_url = Url::parse(&self.config.notice_url(id.as_str()))?;
        let body = self.client.fetch_page(page_url.as_str()).await?;

        // Html is not Send; finish with it before the next await
        let (classification, attachment) = {
            let document = Html::parse_document(&body);
            let classification = self.classifier.classify(&document);
            let attachment = match classification {
                Classification::ValidRelevant => {
                    find_attachment(&document, &page_url, &self.attachment_re)
                }
                _ => None,
            };
            (classification, attachment)
        };

        self.emit_event(Event::Classified {
            id: id.to_string(),
            classification,
        });
        if let Some(reason) = Option::<MissReason>::from(classification) {
            debug!(record_id = %id, ?reason, "not a relevant notice");
            return Ok(IdOutcome::Miss(reason));
        }
        info!(record_id = %id, "relevant notice");

        let mut record = ProcessedRecord::new(id.clone());
        let artifact = match attachment {
            Some(attachment) => self.capture_attachment(&mut record, &attachment).await,
            None => self.capture_snapshot(id, &page_url).await,
        };
        let Some(artifact) = artifact else {
            return Ok(IdOutcome::Productive(record));
        };
        self.emit_event(Event::Captured {
            id: id.to_string(),
            kind: artifact.kind,
            path: artifact.path.clone(),
        });

        if artifact.kind == ArtifactKind::Attachment {
            match self.extraction.run(&artifact).await {
                Ok(table) => {
                    self.emit_event(Event::TableExtracted {
                        id: id.to_string(),
                        path: table.path.clone(),
                        rows: table.rows,
                    });
                    record.table = Some(table);
                }
                Err(e) => warn!(record_id = %id, error = %e, "no table extracted"),
            }
        }

        let delete_raw = self.config.storage.delete_raw_after_archive;
        match archive_artifact_async(&artifact.path, delete_raw).await {
            Ok(path) => {
                self.emit_event(Event::Archived {
                    id: id.to_string(),
                    path: path.clone(),
                });
                record.archive = Some(path);
            }
            Err(e) => warn!(record_id = %id, error = %e, "capture kept unarchived"),
        }

        record.artifact = Some(artifact);
        Ok(IdOutcome::Productive(record))
    }

    async fn capture_attachment(
        &self,
        record: &mut ProcessedRecord,
        attachment: &AttachmentRef,
    ) -> Option<CaptureArtifact> {
        let id = record.id.clone();
        let url = attachment.url.as_str();

        let pending = self.client.probe_size(url).await;
        match self.budget.make_room(pending) {
            Ok(Some(report)) if !report.removed.is_empty() => {
                record.pruned_bytes = report.freed;
                self.emit_event(Event::Pruned {
                    removed: report.removed,
                    freed: report.freed,
                });
            }
            Ok(_) => {}
            Err(e) => warn!(record_id = %id, error = %e, "rolling prune failed"),
        }

        let dest = attachment_path(self.budget.raw_dir(), &id, attachment);
        info!(record_id = %id, url, ?dest, "downloading attachment");
        match self.client.download_to(url, &dest).await {
            Ok(_) => Some(CaptureArtifact {
                path: dest,
                kind: ArtifactKind::Attachment,
            }),
            Err(e) => {
                warn!(record_id = %id, error = %e, "attachment not captured");
                self.skip_capture(&id, e.to_string());
                None
            }
        }
    }

    async fn capture_snapshot(&self, id: &RecordId, page_url: &Url) -> Option<CaptureArtifact> {
        if !self.renderer.is_available() {
            info!(record_id = %id, "no attachment and no renderer, skipping capture");
            self.skip_capture(id, "no attachment and no page renderer".to_string());
            return None;
        }

        let dest = snapshot_path(self.budget.raw_dir(), id);
        info!(record_id = %id, renderer = self.renderer.name(), ?dest, "rendering notice page");
        match self.renderer.render_pdf(page_url.as_str(), &dest).await {
            Ok(()) => Some(CaptureArtifact {
                path: dest,
                kind: ArtifactKind::Snapshot,
            }),
            Err(e) => {
                warn!(record_id = %id, error = %e, "notice page not rendered");
                self.skip_capture(id, e.to_string());
                None
            }
        }
    }

    fn skip_capture(&self, id: &RecordId, reason: String) {
        self.emit_event(Event::CaptureSkipped {
            id: id.to_string(),
            reason,
        });
    }
}
