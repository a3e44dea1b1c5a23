use super::domain::{BusinessType, Lead};

pub const MAX_SCORE: u8 = 100;

/// Priority assigned to leads discovered by the watchtower.
pub const WATCH_DISCOVERY_SCORE: u8 = 90;
/// Used for social posts that report no like count.
pub const DEFAULT_POPULARITY_SCORE: u8 = 50;

const TIER_ONE_COUNTRIES: &[&str] = &["USA", "UK", "UAE"];
const TIER_TWO_COUNTRIES: &[&str] = &["France", "Germany", "Australia"];

const KEYWORD_BONUS: u32 = 15;

/// External popularity metric reported by a provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Popularity {
    /// Star rating on a 0-5 scale.
    Rating(f64),
    Likes(i64),
}

fn geographic_weight(country: &str) -> u32 {
    if TIER_ONE_COUNTRIES.contains(&country) {
        25
    } else if TIER_TWO_COUNTRIES.contains(&country) {
        20
    } else {
        10
    }
}

fn business_weight(business_type: &BusinessType) -> u32 {
    match business_type {
        BusinessType::Wholesaler => 25,
        BusinessType::Brand => 20,
        BusinessType::Retailer => 15,
        BusinessType::Broker | BusinessType::Other(_) => 0,
    }
}

fn completeness_weight(lead: &Lead) -> u32 {
    if lead.raw_email.as_deref().is_some_and(|email| !email.is_empty()) {
        20
    } else if lead.predicted_email.is_some() {
        10
    } else {
        0
    }
}

fn keyword_weight(company_name: &str, keyword: &str) -> u32 {
    let keyword = keyword.trim().to_lowercase();
    if !keyword.is_empty() && company_name.to_lowercase().contains(&keyword) {
        KEYWORD_BONUS
    } else {
        0
    }
}

/// Categorical score from geography, business type, email completeness and a
/// keyword match on the company name.
pub fn categorical_score(lead: &Lead, keyword: &str) -> u8 {
    let total = geographic_weight(&lead.country)
        + business_weight(&lead.business_type)
        + completeness_weight(lead)
        + keyword_weight(&lead.company_name, keyword);
    clamp(total as f64)
}

/// Maps a provider popularity metric onto the 0-100 range.
pub fn popularity_score(popularity: Popularity) -> u8 {
    match popularity {
        Popularity::Rating(stars) => clamp((stars * 20.0).round()),
        Popularity::Likes(likes) => clamp(likes as f64),
    }
}

fn clamp(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.clamp(0.0, f64::from(MAX_SCORE)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::leads::domain::EmailVerificationStatus;

    fn lead(country: &str, business_type: BusinessType) -> Lead {
        Lead {
            id: "lead-1".to_string(),
            company_name: "Antwerp Direct Diamonds".to_string(),
            website: "https://antwerp-direct.be".to_string(),
            country: country.to_string(),
            region: "Europe".to_string(),
            business_type,
            contact_name: "Elena Rossi".to_string(),
            contact_role: "Director".to_string(),
            raw_email: None,
            domain: "antwerp-direct.be".to_string(),
            predicted_email: None,
            email_verification_status: EmailVerificationStatus::Unknown,
            score: 0,
            notes: None,
        }
    }

    #[test]
    fn sums_tier_type_completeness_and_keyword() {
        let mut candidate = lead("USA", BusinessType::Wholesaler);
        candidate.raw_email = Some("elena@antwerp-direct.be".to_string());
        assert_eq!(categorical_score(&candidate, "diamonds"), 25 + 25 + 20 + 15);

        let mut predicted = lead("France", BusinessType::Brand);
        predicted.predicted_email = Some("elena.rossi@antwerp-direct.be".to_string());
        assert_eq!(categorical_score(&predicted, ""), 20 + 20 + 10);

        let bare = lead("Japan", BusinessType::Broker);
        assert_eq!(categorical_score(&bare, "gold"), 10);
    }

    #[test]
    fn raw_email_outweighs_prediction() {
        let mut both = lead("UK", BusinessType::Retailer);
        both.raw_email = Some("a@b.co".to_string());
        both.predicted_email = Some("c.d@b.co".to_string());
        let mut only_predicted = both.clone();
        only_predicted.raw_email = None;

        assert_eq!(categorical_score(&both, "") - categorical_score(&only_predicted, ""), 10);
    }

    #[test]
    fn popularity_maps_rating_and_likes_into_range() {
        assert_eq!(popularity_score(Popularity::Rating(4.6)), 92);
        assert_eq!(popularity_score(Popularity::Rating(9.0)), MAX_SCORE);
        assert_eq!(popularity_score(Popularity::Rating(-1.0)), 0);
        assert_eq!(popularity_score(Popularity::Rating(f64::NAN)), 0);
        assert_eq!(popularity_score(Popularity::Likes(42)), 42);
        assert_eq!(popularity_score(Popularity::Likes(15_000)), MAX_SCORE);
        assert_eq!(popularity_score(Popularity::Likes(-3)), 0);
    }

    #[test]
    fn every_weight_combination_stays_in_range() {
        let countries = ["USA", "Germany", "Nowhere"];
        let types = [
            BusinessType::Wholesaler,
            BusinessType::Brand,
            BusinessType::Retailer,
            BusinessType::Broker,
            BusinessType::Other("#gold".to_string()),
        ];
        for country in countries {
            for business_type in types.clone() {
                for (raw, predicted) in [(true, true), (true, false), (false, true), (false, false)] {
                    let mut candidate = lead(country, business_type.clone());
                    candidate.raw_email = raw.then(|| "x@y.z".to_string());
                    candidate.predicted_email = predicted.then(|| "p.q@y.z".to_string());
                    for keyword in ["", "antwerp", "missing"] {
                        assert!(categorical_score(&candidate, keyword) <= MAX_SCORE);
                    }
                }
            }
        }
    }
}
