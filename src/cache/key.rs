//! Cache keys for logical upstream requests.

use crate::types::Currency;

/// Identity of a logical request.
///
/// Every parameter that changes the upstream result is part of the key, so two
/// different queries can never share an entry and two identical queries always do.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// A page of the market listing.
    Coins {
        currency: Currency,
        page: u32,
        per_page: u32,
    },
    /// A page of the exchange listing.
    Exchanges { page: u32, per_page: u32 },
    /// Coin detail together with its 7-day chart.
    CoinDetail { id: String, currency: Currency },
    /// Price history for an arbitrary day range.
    CoinHistory {
        id: String,
        currency: Currency,
        days: u32,
    },
}

impl CacheKey {
    /// Name of the logical endpoint this key belongs to.
    pub fn endpoint(&self) -> &'static str {
        match self {
            CacheKey::Coins { .. } => "coins",
            CacheKey::Exchanges { .. } => "exchanges",
            CacheKey::CoinDetail { .. } => "coin-details",
            CacheKey::CoinHistory { .. } => "coin-history",
        }
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let endpoint = self.endpoint();
        match self {
            CacheKey::Coins {
                currency,
                page,
                per_page,
            } => write!(f, "{}-{}-{}-{}", endpoint, currency, page, per_page),
            CacheKey::Exchanges { page, per_page } => {
                write!(f, "{}-{}-{}", endpoint, page, per_page)
            }
            CacheKey::CoinDetail { id, currency } => {
                write!(f, "{}-{}-{}", endpoint, id, currency)
            }
            CacheKey::CoinHistory { id, currency, days } => {
                write!(f, "{}-{}-{}-{}", endpoint, id, currency, days)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_distinct_queries_do_not_collide() {
        let keys: HashSet<CacheKey> = [
            CacheKey::Coins {
                currency: Currency::Usd,
                page: 1,
                per_page: 50,
            },
            CacheKey::Coins {
                currency: Currency::Eur,
                page: 1,
                per_page: 50,
            },
            CacheKey::Coins {
                currency: Currency::Usd,
                page: 2,
                per_page: 50,
            },
            CacheKey::Exchanges {
                page: 1,
                per_page: 50,
            },
            CacheKey::CoinHistory {
                id: "bitcoin".into(),
                currency: Currency::Usd,
                days: 7,
            },
            CacheKey::CoinHistory {
                id: "bitcoin".into(),
                currency: Currency::Usd,
                days: 30,
            },
        ]
        .into_iter()
        .collect();

        assert_eq!(keys.len(), 6);
    }

    #[test]
    fn test_identical_queries_collide() {
        let a = CacheKey::CoinDetail {
            id: "ethereum".into(),
            currency: Currency::Gbp,
        };
        let b = CacheKey::CoinDetail {
            id: "ethereum".to_string(),
            currency: Currency::Gbp,
        };
        assert_eq!(a, b);
    }

    #[test]
    fn test_display() {
        let key = CacheKey::Coins {
            currency: Currency::Usd,
            page: 1,
            per_page: 50,
        };
        assert_eq!(key.to_string(), "coins-usd-1-50");
        let key = CacheKey::CoinHistory {
            id: "bitcoin".into(),
            currency: Currency::Eur,
            days: 90,
        };
        assert_eq!(key.to_string(), "coin-history-bitcoin-eur-90");
    }
}
