use common::prelude::*;

use crate::DriveState;

use super::error::DriveOpsError;

/// Everything under `prefix` in `bucket`, following page tokens.
///
/// Checks the stop flag between pages and feeds every object seen into the
///  bucket's model so later queries in the same operation stay local.
pub(crate) async fn list_all(
    bucket: &str,
    prefix: &str,
    delimited: bool,
    state: &DriveState,
) -> Result<ObjectListPage, DriveOpsError> {
    let mut request = ListObjectsRequest::new(bucket).prefix(prefix).full();
    if delimited {
        request = request.delimited();
    }

    let mut all = ObjectListPage::default();
    loop {
        if state.is_stopping() {
            return Err(DriveOpsError::Stopped);
        }
        let page = state.api().list_objects(&request).await?;
        for record in &page.items {
            state.models().observe(record).await;
        }
        all.items.extend(page.items);
        all.prefixes.extend(page.prefixes);

        match page.next_page_token {
            Some(token) => request = request.page_token(Some(token)),
            None => break,
        }
    }
    tracing::debug!(
        bucket,
        prefix,
        objects = all.items.len(),
        folders = all.prefixes.len(),
        "listed objects"
    );
    Ok(all)
}
