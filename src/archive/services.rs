use anyhow::Context;
use bytes::Bytes;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::repo::ArchivedExport;
use crate::nutrition::export::{to_csv, ExportRow};
use crate::state::AppState;

pub const EXPORT_NAME: &str = "recomendaciones_nutricionales.csv";
pub const EXPORT_CONTENT_TYPE: &str = "text/csv; charset=utf-8";
pub const DOWNLOAD_TTL_SECS: u64 = 10 * 60;

/// A rendered export ready for upload.
pub struct ExportDocument {
    pub name: String,
    pub body: Bytes,
    pub rows: usize,
}

pub fn build_document(rows: &[ExportRow]) -> anyhow::Result<ExportDocument> {
    anyhow::ensure!(!rows.is_empty(), "no hay recetas para exportar");
    let body = to_csv(rows).context("render csv export")?;
    Ok(ExportDocument {
        name: EXPORT_NAME.to_string(),
        body: Bytes::from(body),
        rows: rows.len(),
    })
}

/// Uploads the document and records it in the user's history. The upload is
/// what makes an export succeed; a history insert that fails is only logged.
#[instrument(skip(st, doc), fields(rows = doc.rows))]
pub async fn archive_export(
    st: &AppState,
    user_id: Uuid,
    doc: ExportDocument,
) -> anyhow::Result<String> {
    let key = st
        .archive
        .put_export(user_id, &doc.name, doc.body, EXPORT_CONTENT_TYPE)
        .await
        .with_context(|| format!("archive export {}", doc.name))?;

    let row_count = i32::try_from(doc.rows).unwrap_or(i32::MAX);
    match ArchivedExport::insert(&st.db, user_id, &doc.name, &key, row_count).await {
        Ok(rec) => info!(export_id = %rec.id, %key, "export archived"),
        Err(e) => warn!(error = %e, %key, "export uploaded but not recorded"),
    }
    Ok(key)
}

pub async fn presign_download(st: &AppState, s3_key: &str) -> anyhow::Result<String> {
    st.archive
        .presign_get(s3_key, DOWNLOAD_TTL_SECS)
        .await
        .with_context(|| format!("presign url for s3_key {}", s3_key))
}
