use tracing::{info, warn};

use hushy_shared::api::KeywordList;
use hushy_shared::moderation::ModerationVerdict;

use crate::error::Result;
use crate::state::Context;

/// Keyword moderation. The backend can extend the built-in list; if it
/// cannot be reached the built-in list stays in force and content is
/// judged against it alone.
#[derive(Clone)]
pub struct ModerationService {
    ctx: Context,
}

impl ModerationService {
    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }

    /// Merge the backend keyword list into the local one. Returns the size
    /// of the resulting list.
    pub async fn refresh_keywords(&self) -> Result<usize> {
        match self.ctx.api.get::<KeywordList>("/api/moderation/keywords").await {
            Ok(list) => {
                let size = self.ctx.with_state(|s| {
                    s.keyword_filter.extend(&list.keywords);
                    s.keyword_filter.len()
                })?;
                info!(received = list.keywords.len(), size, "moderation keywords refreshed");
                Ok(size)
            }
            Err(e) => {
                warn!(error = %e, "keyword list unavailable, keeping the built-in one");
                self.ctx.with_state(|s| s.keyword_filter.len())
            }
        }
    }

    /// Judge `text` against the current keyword list.
    pub fn check_text(&self, text: &str) -> ModerationVerdict {
        // Fail open: without state there is nothing to check against.
        self.ctx
            .with_state(|s| s.keyword_filter.check_text(text))
            .unwrap_or(ModerationVerdict::Allowed)
    }
}
