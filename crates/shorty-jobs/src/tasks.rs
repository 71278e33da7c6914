use crate::job::Job;
use shorty_core::UrlStore;
use std::sync::Arc;

pub const DELETE_USER_URLS: &str = "delete user URLs";

/// Soft-deletes `short_ids` on behalf of `owner_id` in the background.
///
/// Ids the owner does not hold are skipped by the store, so rerunning the
/// job after an abandoned attempt is harmless. The store call is dropped as
/// soon as the job's token is cancelled.
pub fn delete_user_urls(
    store: Arc<dyn UrlStore>,
    owner_id: impl Into<String>,
    short_ids: Vec<String>,
) -> Job {
    let owner_id = owner_id.into();
    Job::new(DELETE_USER_URLS, move |cancel| async move {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                anyhow::bail!("cancelled before deleting {} URLs of {owner_id}", short_ids.len())
            }
            deleted = store.delete_user_urls(&owner_id, &short_ids) => deleted?,
        }
        anyhow::Ok(())
    })
}
