use url::Url;

use super::domain::{
    BusinessType, EmailVerificationStatus, Lead, DOMAIN_SENTINEL, WEBSITE_SENTINEL,
};
use super::scoring::{Popularity, DEFAULT_POPULARITY_SCORE, WATCH_DISCOVERY_SCORE};
use crate::providers::{ScrapedPost, SearchResult};

const CAPTION_PREVIEW_CHARS: usize = 30;
const SOCIAL_DOMAIN: &str = "instagram.com";

/// Where a maps-search result came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchContext {
    pub term: String,
    pub city: String,
    pub country: String,
    pub page: usize,
}

/// How a tag was scanned. Watch scans need ids that stay stable between polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagScan {
    Watch,
    Hunt { started_at_millis: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagContext {
    pub tag: String,
    pub scan: TagScan,
}

/// A raw provider record paired with the context it was fetched under.
#[derive(Debug, Clone)]
pub enum RawRecord<'a> {
    SearchResult {
        result: SearchResult,
        context: &'a SearchContext,
    },
    ScrapedPost {
        post: ScrapedPost,
        context: &'a TagContext,
    },
}

/// How the lead's score should be derived once its email is known.
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreBasis {
    Fixed(u8),
    Popularity(Popularity),
    Categorical { keyword: String },
}

/// Signals the email resolver and scorer need, captured during normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct Evidence {
    /// Free text scanned for an explicit address.
    pub text: Option<String>,
    /// Name to predict an address from; `None` disables prediction.
    pub predict_from: Option<String>,
    pub score: ScoreBasis,
}

/// A lead with descriptive fields filled in; email and score still pending.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    pub lead: Lead,
    pub evidence: Evidence,
}

/// Normalizes one record. Returns `None` only for records too malformed to
/// describe a business; everything else is defaulted.
pub fn normalize(record: RawRecord<'_>, index: usize) -> Option<Draft> {
    match record {
        RawRecord::SearchResult { result, context } => {
            normalize_search_result(result, context, index)
        }
        RawRecord::ScrapedPost { post, context } => Some(normalize_post(post, context, index)),
    }
}

/// `(website, domain)` for a provider URL, falling back to the sentinels.
pub fn site_and_domain(raw: Option<&str>) -> (String, String) {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return (WEBSITE_SENTINEL.to_string(), DOMAIN_SENTINEL.to_string());
    };

    match Url::parse(raw).ok().and_then(|url| url.host_str().map(str::to_string)) {
        Some(host) => {
            let domain = host.strip_prefix("www.").unwrap_or(&host).to_string();
            (raw.to_string(), domain)
        }
        None => (WEBSITE_SENTINEL.to_string(), DOMAIN_SENTINEL.to_string()),
    }
}

fn normalize_search_result(
    result: SearchResult,
    context: &SearchContext,
    index: usize,
) -> Option<Draft> {
    let company_name = result
        .title
        .as_deref()
        .map(str::trim)
        .filter(|title| !title.is_empty())?
        .to_string();
    let (website, domain) = site_and_domain(result.website.as_deref());
    let country = if context.country.trim().is_empty() {
        "Local".to_string()
    } else {
        context.country.trim().to_string()
    };

    let score = match result.rating {
        Some(stars) => ScoreBasis::Popularity(Popularity::Rating(stars)),
        None => ScoreBasis::Categorical {
            keyword: context.term.clone(),
        },
    };

    let lead = Lead {
        id: format!(
            "lead-{}-{}-{}-{}",
            context.city, context.term, context.page, index
        ),
        company_name,
        website,
        country,
        region: context.city.clone(),
        business_type: BusinessType::from(context.term.as_str()),
        contact_name: "Store Manager".to_string(),
        contact_role: "Owner".to_string(),
        raw_email: None,
        domain,
        predicted_email: None,
        email_verification_status: EmailVerificationStatus::Unknown,
        score: 0,
        notes: Some(
            result
                .phone
                .filter(|phone| !phone.trim().is_empty())
                .unwrap_or_else(|| "No Phone".to_string()),
        ),
    };

    Some(Draft {
        lead,
        // A maps listing names no person, so prediction yields the generic inbox.
        evidence: Evidence {
            text: None,
            predict_from: Some(String::new()),
            score,
        },
    })
}

fn normalize_post(post: ScrapedPost, context: &TagContext, index: usize) -> Draft {
    let handle = post.handle().unwrap_or("Unknown").to_string();
    let caption = post.caption.clone().unwrap_or_default();
    let preview: String = caption.chars().take(CAPTION_PREVIEW_CHARS).collect();
    let tag = &context.tag;

    let (id, notes, score) = match context.scan {
        TagScan::Watch => {
            let item_id = post.id.clone().unwrap_or_else(|| index.to_string());
            (
                format!("watch-{tag}-{item_id}"),
                format!("NEW POST: \"{preview}...\""),
                ScoreBasis::Fixed(WATCH_DISCOVERY_SCORE),
            )
        }
        TagScan::Hunt { started_at_millis } => {
            let score = match post.likes_count {
                Some(likes) if likes != 0 => ScoreBasis::Popularity(Popularity::Likes(likes)),
                _ => ScoreBasis::Fixed(DEFAULT_POPULARITY_SCORE),
            };
            (
                format!("insta-{tag}-{index}-{started_at_millis}"),
                format!("Source: #{tag} | Post: \"{preview}...\""),
                score,
            )
        }
    };

    let lead = Lead {
        id,
        company_name: handle.clone(),
        website: format!("https://{SOCIAL_DOMAIN}/{handle}"),
        country: "Global".to_string(),
        region: "Instagram".to_string(),
        business_type: BusinessType::Other(format!("#{tag}")),
        contact_name: handle,
        contact_role: "Owner".to_string(),
        raw_email: None,
        domain: SOCIAL_DOMAIN.to_string(),
        predicted_email: None,
        email_verification_status: EmailVerificationStatus::Unknown,
        score: 0,
        notes: Some(notes),
    };

    Draft {
        lead,
        evidence: Evidence {
            text: Some(caption),
            predict_from: None,
            score,
        },
    }
}
