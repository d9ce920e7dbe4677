//! One-shot reconciliation of placeholders for every tagged movie.

use crate::arr::{FileStatus, MovieCatalog};
use crate::config::LibraryTarget;
use crate::placeholder::Provisioner;
use anyhow::{Context, Result};
use std::path::Path;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaintenanceReport {
    pub checked: usize,
    pub provisioned: usize,
    pub cleaned: usize,
    pub failed: usize,
}

enum Swept {
    Provisioned,
    Cleaned,
    Unchanged,
}

/// Walk every movie carrying the target's tag.
///
/// Movies with a real file lose their placeholder and backing folder; all
/// others get their placeholder re-provisioned. A failing movie is logged and
/// counted without stopping the sweep.
pub async fn run(
    catalog: &dyn MovieCatalog,
    provisioner: &Provisioner,
    target: &LibraryTarget,
) -> Result<MaintenanceReport> {
    let tag_id = catalog
        .tag_id(&target.tag)
        .await?
        .with_context(|| format!("Tag '{}' does not exist in Radarr", target.tag))?;

    let movie_ids = catalog.movie_ids_by_tag(tag_id).await?;
    tracing::info!(tag = %target.tag, count = movie_ids.len(), "Starting maintenance sweep");

    let mut report = MaintenanceReport::default();

    for movie_id in movie_ids {
        report.checked += 1;
        match sweep_movie(catalog, provisioner, target, movie_id).await {
            Ok(Swept::Provisioned) => report.provisioned += 1,
            Ok(Swept::Cleaned) => report.cleaned += 1,
            Ok(Swept::Unchanged) => {}
            Err(e) => {
                report.failed += 1;
                tracing::warn!(movie_id, "Maintenance failed for movie: {:#}", e);
            }
        }
    }

    tracing::info!(
        checked = report.checked,
        provisioned = report.provisioned,
        cleaned = report.cleaned,
        failed = report.failed,
        "Maintenance sweep finished"
    );

    Ok(report)
}

async fn sweep_movie(
    catalog: &dyn MovieCatalog,
    provisioner: &Provisioner,
    target: &LibraryTarget,
    movie_id: i64,
) -> Result<Swept> {
    let movie = catalog
        .movie(movie_id)
        .await?
        .with_context(|| format!("Movie {} not found", movie_id))?;

    let folder_name = movie
        .path
        .as_deref()
        .and_then(|p| Path::new(p).file_name())
        .and_then(|n| n.to_str())
        .with_context(|| format!("Movie {} has no folder", movie_id))?
        .to_string();

    if movie.file_status(provisioner.naming()) == FileStatus::Real {
        let outcome = provisioner.cleanup(&target.library_root.join(&folder_name))?;
        if !outcome.has_real_file {
            // Radarr knows a file the library folder does not show yet
            return Ok(Swept::Unchanged);
        }
        let removed_backing =
            provisioner.remove_backing_folder(&target.placeholder_root.join(&folder_name))?;

        return Ok(if outcome.removed > 0 || removed_backing {
            Swept::Cleaned
        } else {
            Swept::Unchanged
        });
    }

    provisioner.provision_movie(target, &folder_name)?;
    Ok(Swept::Provisioned)
}
