//! Rendering a `ResearchResult` to the terminal and to disk.

use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use rp_core::{ImageData, ImageRef, ResearchResult};
use rp_providers::OpenAIImageProvider;

/// Plain-text report: summary, numbered posts, then image and graph notes.
pub fn render_text(result: &ResearchResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "## Summary\n\n{}\n", result.summary.trim());

    if !result.posts.is_empty() {
        let _ = writeln!(out, "## Posts\n");
        for (i, post) in result.posts.iter().enumerate() {
            let _ = writeln!(out, "{}. {}\n", i + 1, post);
        }
    }

    if !result.images.is_empty() {
        let _ = writeln!(out, "## Images\n");
        for (i, image) in result.images.iter().enumerate() {
            match image {
                ImageRef::Url(url) => {
                    let _ = writeln!(out, "{}. {}", i + 1, url);
                }
                ImageRef::Payload(data) => {
                    let _ = writeln!(out, "{}. <inline image, {} base64 chars>", i + 1, data.len());
                }
            }
        }
        out.push('\n');
    }

    if !result.graphs.is_empty() {
        let _ = writeln!(out, "## Graphs\n");
        for (i, chart) in result.graphs.iter().enumerate() {
            let _ = writeln!(
                out,
                "{}. {} ({} vs {}, {}x{} PNG)",
                i + 1,
                chart.title,
                chart.y_label,
                chart.x_label,
                chart.width,
                chart.height
            );
            if let Some(categories) = &chart.categories {
                let _ = writeln!(out, "   {}: {}", chart.x_label, categories.join(", "));
            }
        }
        out.push('\n');
    }

    out.trim_end().to_string()
}

/// Write charts and images into `dir`. Images that cannot be fetched or
/// decoded are skipped with a warning.
pub async fn save_artifacts(
    dir: &Path,
    result: &ResearchResult,
    downloader: &OpenAIImageProvider,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;

    let mut written = Vec::new();

    for (i, chart) in result.graphs.iter().enumerate() {
        let path = dir.join(format!("graph-{}.png", i + 1));
        std::fs::write(&path, &chart.png)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        written.push(path);
    }

    for (i, image) in result.images.iter().enumerate() {
        let bytes = match image {
            ImageRef::Payload(_) => image.decode_payload(),
            ImageRef::Url(url) => downloader.download(url).await,
        };
        let data = match bytes.and_then(ImageData::from_bytes) {
            Ok(data) => data,
            Err(e) => {
                warn!(index = i + 1, error = %e, "Skipping image");
                continue;
            }
        };
        debug!(
            index = i + 1,
            mime = %data.mime_type,
            width = ?data.width,
            height = ?data.height,
            "Saving image"
        );

        let path = dir.join(format!("image-{}.{}", i + 1, data.extension));
        std::fs::write(&path, &data.bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        written.push(path);
    }

    Ok(written)
}
