//! Lead ingestion: raw provider records become scored, normalized leads.

pub mod domain;
pub mod email;
pub mod normalizer;
pub mod pagination;
pub mod router;
pub mod scoring;
pub mod service;

pub use domain::{BusinessType, EmailVerificationStatus, Lead, LeadFilter};
pub use normalizer::{RawRecord, SearchContext, TagContext, TagScan};
pub use pagination::{dedup_by_company_name, split_list, PaginationDriver, SearchRequest};
pub use router::leads_router;
pub use service::LeadSearchService;

use crate::providers::ScrapedPost;
use normalizer::{Draft, ScoreBasis};

/// Resolves the contact email and score for a normalized draft.
pub fn enrich(draft: Draft) -> Lead {
    let Draft { mut lead, evidence } = draft;

    let domain = evidence.predict_from.as_ref().map(|_| lead.domain.as_str());
    let resolved = email::resolve(
        evidence.text.as_deref(),
        evidence.predict_from.as_deref().unwrap_or_default(),
        domain,
    );
    lead.raw_email = resolved.raw_email;
    lead.predicted_email = resolved.predicted_email;
    lead.email_verification_status = resolved.status;

    lead.score = match evidence.score {
        ScoreBasis::Fixed(score) => score.min(scoring::MAX_SCORE),
        ScoreBasis::Popularity(popularity) => scoring::popularity_score(popularity),
        ScoreBasis::Categorical { keyword } => scoring::categorical_score(&lead, &keyword),
    };

    lead
}

/// Normalize then enrich a single record.
pub fn ingest(record: RawRecord<'_>, index: usize) -> Option<Lead> {
    normalizer::normalize(record, index).map(enrich)
}

/// Turns a batch of scraped posts for one tag into leads, in batch order.
pub fn leads_from_posts(posts: Vec<ScrapedPost>, context: &TagContext) -> Vec<Lead> {
    posts
        .into_iter()
        .enumerate()
        .filter_map(|(index, post)| ingest(RawRecord::ScrapedPost { post, context }, index))
        .collect()
}
