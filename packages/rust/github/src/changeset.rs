//! Pull-request file listing (`GET /repos/{repo}/pulls/{n}/files`).

use prdocs_shared::{
    ChangedFile, PrDocsError, PullRequestRef, Result, Settings, build_client,
};
use reqwest::Client;
use tracing::{debug, info, instrument};
use url::Url;

/// GitHub serves at most 3000 files per pull request; 30 pages of 100.
const MAX_PAGES: u32 = 30;

/// Lists the files changed by a pull request, in provider order.
#[derive(Debug, Clone)]
pub struct ChangeSetFetcher {
    client: Client,
    api_base: Url,
    token: String,
    per_page: u32,
}

impl ChangeSetFetcher {
    pub fn new(settings: &Settings) -> Result<Self> {
        Ok(Self {
            client: build_client(settings)?,
            api_base: settings.github_api_base.clone(),
            token: settings.github_token.clone(),
            per_page: settings.per_page,
        })
    }

    /// Fetch the full change set for `pr`, following pagination.
    ///
    /// Any failing page aborts the listing: a partial change set is never returned.
    #[instrument(skip_all, fields(pr = %pr))]
    pub async fn fetch(&self, pr: &PullRequestRef) -> Result<Vec<ChangedFile>> {
        let mut files = Vec::new();

        for page in 1..=MAX_PAGES {
            let batch = self.fetch_page(pr, page).await?;
            let count = batch.len();
            files.extend(batch);

            debug!(page, count, "fetched change set page");

            if count < self.per_page as usize {
                break;
            }
        }

        info!(files = files.len(), "change set fetched");
        Ok(files)
    }

    async fn fetch_page(&self, pr: &PullRequestRef, page: u32) -> Result<Vec<ChangedFile>> {
        let url = self.files_url(pr, page)?;

        let response = self
            .client
            .get(url.as_str())
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .map_err(|e| PrDocsError::UpstreamUnavailable(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PrDocsError::UpstreamUnavailable(format!(
                "{url}: HTTP {status}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| PrDocsError::UpstreamUnavailable(format!("{url}: body read failed: {e}")))?;

        serde_json::from_str(&body).map_err(|e| {
            PrDocsError::MalformedResponse(format!(
                "{url}: expected a list of file changes: {e} (got: {})",
                &body[..floor_char_boundary(&body, 200)]
            ))
        })
    }

    fn files_url(&self, pr: &PullRequestRef, page: u32) -> Result<Url> {
        let mut url = self.api_base.clone();
        let number = pr.number.to_string();

        url.path_segments_mut()
            .map_err(|()| {
                PrDocsError::validation(format!("cannot build listing URL for {pr} from {}", self.api_base))
            })?
            .pop_if_empty()
            .push("repos")
            .extend(pr.repository.split('/'))
            .extend(["pulls", number.as_str(), "files"]);

        url.query_pairs_mut()
            .append_pair("per_page", &self.per_page.to_string())
            .append_pair("page", &page.to_string());
        Ok(url)
    }
}

/// Largest index `<= max` that falls on a char boundary of `s`.
fn floor_char_boundary(s: &str, max: usize) -> usize {
    if s.len() <= max {
        return s.len();
    }
    (0..=max).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0)
}
