//! Page-by-page menu rendering.
//!
//! A document is loaded once, then each page is rendered in order to a
//! fixed-width text surface and pushed to a sink. Rendering stops quietly as
//! soon as the cancellation token fires or the sink goes away: no further
//! pages are appended and an in-flight page is dropped, even if it failed.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;
use futures::StreamExt;
use reqwest::Client;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Fixed render scale; 1.0 corresponds to [`BASE_COLUMNS`] characters per line.
pub const RENDER_SCALE: f32 = 1.6;
const BASE_COLUMNS: f32 = 50.0;

#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("download failed: {0}")]
    Download(#[from] reqwest::Error),

    #[error("download returned status {0}")]
    Status(u16),

    #[error("download timed out")]
    Timeout,

    #[error("menu is larger than {limit} bytes")]
    TooLarge { limit: usize },

    #[error("not a readable PDF: {0}")]
    Extract(String),

    #[error("page {0} does not exist")]
    NoSuchPage(usize),
}

/// One rendered page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSurface {
    pub number: usize,
    pub total: usize,
    pub lines: Vec<String>,
}

impl fmt::Display for PageSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Page {} of {} ===", self.number, self.total)?;
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        writeln!(f)
    }
}

/// What the viewer reports, in order, while it works.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerEvent {
    Status(String),
    Page(PageSurface),
    Failed(String),
}

impl ViewerEvent {
    pub fn to_text(&self) -> String {
        match self {
            Self::Status(message) | Self::Failed(message) => format!("{message}\n\n"),
            Self::Page(page) => page.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// There was no URL to load.
    NoMenu,
    Completed { pages: usize },
    Cancelled { appended: usize },
    /// Loading or rendering failed after `appended` pages reached the viewer.
    Failed { appended: usize },
}

#[async_trait]
pub trait PageSource: Send + Sync {
    fn page_count(&self) -> usize;

    /// Render page `number` (1-based).
    async fn render_page(&self, number: usize, scale: f32) -> Result<PageSurface, ViewerError>;
}

/// A PDF reduced to the text of each page.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    pages: Vec<String>,
}

impl ExtractedDocument {
    pub fn from_pages(pages: Vec<String>) -> Self {
        Self { pages }
    }

    /// Download `url` (at most `max_bytes`) and extract per-page text off the
    /// async runtime.
    pub async fn load(
        http: &Client,
        url: &str,
        timeout: Duration,
        max_bytes: usize,
    ) -> Result<Self, ViewerError> {
        let response = tokio::time::timeout(timeout, http.get(url).send())
            .await
            .map_err(|_| ViewerError::Timeout)??;
        let status = response.status();
        if !status.is_success() {
            return Err(ViewerError::Status(status.as_u16()));
        }
        let too_large = ViewerError::TooLarge { limit: max_bytes };
        if response
            .content_length()
            .is_some_and(|len| len > max_bytes as u64)
        {
            return Err(too_large);
        }

        let mut bytes = BytesMut::new();
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            if bytes.len() + chunk.len() > max_bytes {
                return Err(too_large);
            }
            bytes.extend_from_slice(&chunk);
        }
        let bytes = bytes.freeze();

        let pages = tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text_from_mem_by_pages(&bytes)
        })
        .await
        .map_err(|e| ViewerError::Extract(e.to_string()))?
        .map_err(|e| ViewerError::Extract(e.to_string()))?;

        Ok(Self::from_pages(pages))
    }
}

#[async_trait]
impl PageSource for ExtractedDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    async fn render_page(&self, number: usize, scale: f32) -> Result<PageSurface, ViewerError> {
        let text = number
            .checked_sub(1)
            .and_then(|i| self.pages.get(i))
            .ok_or(ViewerError::NoSuchPage(number))?;
        Ok(PageSurface {
            number,
            total: self.pages.len(),
            lines: wrap(text, columns_for(scale)),
        })
    }
}

fn columns_for(scale: f32) -> usize {
    ((BASE_COLUMNS * scale).round() as usize).max(1)
}

/// Word-wrap `text` to `columns`, keeping paragraph breaks but never more than one blank line.
fn wrap(text: &str, columns: usize) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for raw in text.lines() {
        let mut words = raw.split_whitespace().peekable();
        if words.peek().is_none() {
            if lines.last().is_some_and(|l| !l.is_empty()) {
                lines.push(String::new());
            }
            continue;
        }

        let mut current = String::new();
        for word in words {
            let needed = if current.is_empty() {
                word.chars().count()
            } else {
                current.chars().count() + 1 + word.chars().count()
            };
            if needed > columns && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        lines.push(current);
    }
    while lines.last().is_some_and(String::is_empty) {
        lines.pop();
    }
    lines
}

/// Render every page of `source` into `sink`, in order. A page that fails
/// to render ends the document with a [`ViewerEvent::Failed`].
pub async fn render_document<S>(
    source: &S,
    sink: &mpsc::Sender<ViewerEvent>,
    cancel: &CancellationToken,
) -> RenderOutcome
where
    S: PageSource + ?Sized,
{
    let total = source.page_count();
    if !emit(sink, cancel, ViewerEvent::Status(format!("Rendering {total} page(s)..."))).await {
        return RenderOutcome::Cancelled { appended: 0 };
    }

    let mut appended = 0;
    for number in 1..=total {
        if cancel.is_cancelled() {
            return RenderOutcome::Cancelled { appended };
        }

        let rendered = tokio::select! {
            biased;
            _ = cancel.cancelled() => return RenderOutcome::Cancelled { appended },
            rendered = source.render_page(number, RENDER_SCALE) => rendered,
        };
        if cancel.is_cancelled() {
            tracing::debug!(page = number, "render cancelled, dropping in-flight page");
            return RenderOutcome::Cancelled { appended };
        }

        let page = match rendered {
            Ok(page) => page,
            Err(err) => {
                tracing::warn!(page = number, error = %err, "page render failed");
                return report_failure(sink, cancel, &err, appended).await;
            }
        };
        if !emit(sink, cancel, ViewerEvent::Page(page)).await {
            return RenderOutcome::Cancelled { appended };
        }
        appended += 1;
    }

    RenderOutcome::Completed { pages: appended }
}

/// Load the menu at `url` and stream it into `sink`. Failures are reported as
/// a final [`ViewerEvent::Failed`] instead of being returned.
pub async fn stream_menu(
    http: Client,
    url: String,
    timeout: Duration,
    max_bytes: usize,
    sink: mpsc::Sender<ViewerEvent>,
    cancel: CancellationToken,
) -> RenderOutcome {
    if url.is_empty() {
        emit(&sink, &cancel, ViewerEvent::Status("No menu URL provided.".to_string())).await;
        return RenderOutcome::NoMenu;
    }
    if !emit(&sink, &cancel, ViewerEvent::Status("Loading menu...".to_string())).await {
        return RenderOutcome::Cancelled { appended: 0 };
    }

    let loaded = tokio::select! {
        biased;
        _ = cancel.cancelled() => return RenderOutcome::Cancelled { appended: 0 },
        loaded = ExtractedDocument::load(&http, &url, timeout, max_bytes) => loaded,
    };
    let document = match loaded {
        Ok(document) => document,
        Err(err) => {
            tracing::warn!(url = %url, error = %err, "menu load failed");
            return report_failure(&sink, &cancel, &err, 0).await;
        }
    };

    let outcome = render_document(&document, &sink, &cancel).await;
    tracing::debug!(?outcome, "menu render finished");
    outcome
}

async fn report_failure(
    sink: &mpsc::Sender<ViewerEvent>,
    cancel: &CancellationToken,
    err: &ViewerError,
    appended: usize,
) -> RenderOutcome {
    let message = format!("Could not load menu. {err}");
    if emit(sink, cancel, ViewerEvent::Failed(message)).await {
        RenderOutcome::Failed { appended }
    } else {
        RenderOutcome::Cancelled { appended }
    }
}

/// Send one event. Returns `false` when the viewer has gone away; a closed
/// sink cancels the token so nothing else gets started.
async fn emit(sink: &mpsc::Sender<ViewerEvent>, cancel: &CancellationToken, event: ViewerEvent) -> bool {
    let sent = tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        sent = sink.send(event) => sent.is_ok(),
    };
    if !sent {
        cancel.cancel();
    }
    sent
}
