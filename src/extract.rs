use serde_json::Value;

use crate::browser::ResultsPage;

const SRCSET_PROPERTY: &str = "srcset";

// ── Public API ───────────────────────────────────────────────────────────────

/// Collect up to `count` image URLs from the results matching `selector`.
///
/// Indices are visited strictly in order, each one scrolled into view before
/// it is read, because scrolling can pull in or reflow later results.
/// Per-index failures are logged and leave a gap; gaps are dropped from the
/// returned list without disturbing the order of the rest. The walk stops at
/// the first index past the end of the results, so `count` is only an upper
/// bound and never sizes anything.
pub async fn extract_image_urls<P>(page: &P, selector: &str, count: usize) -> Vec<String>
where
    P: ResultsPage + ?Sized,
{
    let mut urls = Vec::new();

    for index in 0..count {
        match extract_one(page, selector, index).await {
            Slot::Found(url) => urls.push(url),
            Slot::Empty => {}
            Slot::Exhausted => break,
        }
    }

    tracing::info!("extracted {} of {} requested image urls", urls.len(), count);
    urls
}

enum Slot {
    Found(String),
    Empty,
    /// No result at this index or any later one.
    Exhausted,
}

async fn extract_one<P>(page: &P, selector: &str, index: usize) -> Slot
where
    P: ResultsPage + ?Sized,
{
    match page.count(selector).await {
        Ok(available) if index < available => {}
        Ok(available) => {
            tracing::debug!(index, available, "no more results");
            return Slot::Exhausted;
        }
        Err(e) => {
            tracing::warn!(index, "result lookup failed, stopping: {}", e);
            return Slot::Exhausted;
        }
    }

    if let Err(e) = page.scroll_into_view(selector, index).await {
        tracing::warn!(index, "scroll failed, reading element as found: {}", e);
    }

    // Re-resolved by index: the scroll may have replaced the node.
    let value = match page.property(selector, index, SRCSET_PROPERTY).await {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(index, "could not read srcset: {}", e);
            return Slot::Empty;
        }
    };

    match value
        .as_ref()
        .and_then(Value::as_str)
        .and_then(first_srcset_url)
    {
        Some(url) => Slot::Found(url),
        None => {
            tracing::debug!(index, "result has no usable srcset");
            Slot::Empty
        }
    }
}

// ── Srcset helpers ───────────────────────────────────────────────────────────

/// First candidate URL in a `srcset`, with its query string removed.
pub fn first_srcset_url(srcset: &str) -> Option<String> {
    let candidate = srcset.split(',').map(str::trim).find(|c| !c.is_empty())?;
    let url = candidate.split_whitespace().next()?;
    let url = url.split('?').next().unwrap_or(url);
    if url.is_empty() {
        None
    } else {
        Some(url.to_string())
    }
}
