use std::path::PathBuf;

use serde::Serialize;

/// What the user asked for: a search term, how many results, and where to put them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchRequest {
    pub term: String,
    pub count: usize,
    pub folder: String,
}

/// One image to fetch and the file it will be written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    pub index: usize,
    pub url: String,
    pub destination: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DownloadOutcome {
    Success {
        index: usize,
        url: String,
        path: PathBuf,
        bytes: u64,
    },
    Failed {
        index: usize,
        url: String,
        reason: String,
    },
}

impl DownloadOutcome {
    pub fn index(&self) -> usize {
        match self {
            DownloadOutcome::Success { index, .. } | DownloadOutcome::Failed { index, .. } => *index,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, DownloadOutcome::Success { .. })
    }
}

/// Result of a whole run, enough to tell the user what actually happened.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub request: SearchRequest,
    pub search_url: String,
    pub folder_path: PathBuf,
    pub image_urls: Vec<String>,
    pub outcomes: Vec<DownloadOutcome>,
}

impl RunSummary {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Closing line shown to the user.
    pub fn message(&self) -> String {
        let total = self.outcomes.len();
        if self.request.count == 0 {
            "Nothing to download: 0 images requested".to_string()
        } else if total == 0 {
            format!("No images found for \"{}\"", self.request.term)
        } else if self.failed() == 0 {
            format!("All {} images downloaded", total)
        } else {
            format!(
                "Downloaded {} of {} images ({} failed)",
                self.succeeded(),
                total,
                self.failed()
            )
        }
    }
}
