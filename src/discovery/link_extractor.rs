use crate::constants::{DETAIL_PATH, EXERCISE_LINK_SELECTOR};
use crate::errors::AppResult;
use crate::models::ResourceIdentifier;
use scraper::{Html, Selector};
use std::sync::OnceLock;
use tracing::debug;
use url::Url;

/// Cached CSS selector for diary exercise links.
/// Compiled once at initialization for performance.
static EXERCISE_LINK_SELECTOR_CACHED: OnceLock<Selector> = OnceLock::new();

/// Parses diary markup and extracts training session identifiers.
///
/// This function selects the `<a>` children of exercise entries
/// (`div.event.event-month.exercise`, matched on the exact class attribute),
/// resolves each `href` against `base_url`, and keeps only links under the
/// training detail path (`{base_url}/training/analysis2/`). The identifier
/// is whatever follows that prefix.
///
/// Links outside the prefix and links with an empty suffix are skipped
/// silently. Document order is preserved and duplicates are kept.
///
/// # Example
///
/// ```
/// use polar_flow_cli::discovery::parse_exercise_ids;
/// use url::Url;
///
/// # fn main() -> Result<(), polar_flow_cli::errors::AppError> {
/// let html = r#"
///     <div class="event event-month exercise"><a href="/training/analysis2/1001">Run</a></div>
/// "#;
/// let base = Url::parse("https://flow.polar.com")?;
/// let ids = parse_exercise_ids(html, &base)?;
/// assert_eq!(ids[0].as_str(), "1001");
/// # Ok(())
/// # }
/// ```
pub fn parse_exercise_ids(html: &str, base_url: &Url) -> AppResult<Vec<ResourceIdentifier>> {
    let document = Html::parse_document(html);

    let selector = EXERCISE_LINK_SELECTOR_CACHED.get_or_init(|| {
        Selector::parse(EXERCISE_LINK_SELECTOR)
            .expect("EXERCISE_LINK_SELECTOR is a valid CSS selector")
    });

    let prefix = base_url.join(DETAIL_PATH)?;
    let prefix = prefix.as_str();

    let mut ids = Vec::new();
    for href in document
        .select(selector)
        .filter_map(|el| el.value().attr("href"))
    {
        let Ok(target) = base_url.join(href) else {
            debug!(href = href, "Skipping unresolvable link");
            continue;
        };
        match target.as_str().strip_prefix(prefix) {
            Some(id) if !id.is_empty() => ids.push(ResourceIdentifier::new(id)),
            _ => debug!(href = href, "Skipping link outside the training detail path"),
        }
    }

    Ok(ids)
}
