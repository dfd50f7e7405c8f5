use bs_core::ScriptDocument;
use serde::{Deserialize, Serialize};

use crate::{checklist, compare};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "camelCase")]
pub enum PublishDecision {
    #[serde(rename_all = "camelCase")]
    Blocked { error_count: usize },
    NothingToPublish,
    /// Publishable once the operator accepts the warnings.
    NeedsConfirmation { warnings: usize, summary: String },
    Ready { summary: String },
}

impl PublishDecision {
    pub fn may_publish(&self, confirmed: bool) -> bool {
        match self {
            Self::Ready { .. } => true,
            Self::NeedsConfirmation { .. } => confirmed,
            Self::Blocked { .. } | Self::NothingToPublish => false,
        }
    }
}

pub fn plan_publish(
    draft: &ScriptDocument,
    published: Option<&ScriptDocument>,
) -> PublishDecision {
    let diff = compare(Some(draft), published);
    let report = checklist(draft, &diff);

    if !report.passed {
        return PublishDecision::Blocked {
            error_count: report.error_count,
        };
    }
    if diff.is_empty() {
        return PublishDecision::NothingToPublish;
    }

    let summary = diff.stats.summary();
    if report.warning_count > 0 {
        PublishDecision::NeedsConfirmation {
            warnings: report.warning_count,
            summary,
        }
    } else {
        PublishDecision::Ready { summary }
    }
}
