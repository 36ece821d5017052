//! Vote tiers, ticket bonus table, and list-row ids.

/// A purchasable (or sponsored) vote bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tier {
    /// Votes in the bundle.
    pub quantity: i64,
    /// Price in whole TZS. Zero for the sponsored tier.
    pub price: i64,
    /// Raffle tickets issued once the vote is confirmed.
    pub tickets: usize,
}

impl Tier {
    /// The sponsored tier: one free vote per user.
    pub fn is_free(&self) -> bool {
        self.price == 0
    }

    /// List-row id for this tier.
    pub fn row_id(&self) -> String {
        format!("{}{}", QUANTITY_PREFIX, self.quantity)
    }

    /// Row title, e.g. "Kura 10".
    pub fn title(&self) -> String {
        format!("Kura {}", self.quantity)
    }

    /// Row description with price and ticket count.
    pub fn description(&self) -> String {
        if self.is_free() {
            format!("Bure kwa udhamini - tiketi {}", self.tickets)
        } else {
            format!("TZS {} - tiketi {}", format_amount(self.price), self.tickets)
        }
    }
}

/// Tiers offered at quantity selection, in display order.
pub const TIERS: [Tier; 4] = [
    Tier {
        quantity: 1,
        price: 0,
        tickets: 1,
    },
    Tier {
        quantity: 5,
        price: 1000,
        tickets: 6,
    },
    Tier {
        quantity: 10,
        price: 2000,
        tickets: 12,
    },
    Tier {
        quantity: 50,
        price: 10000,
        tickets: 60,
    },
];

pub const COMEDIAN_PREFIX: &str = "comedian_";
pub const QUANTITY_PREFIX: &str = "quantity_";

/// Look up the tier for a quantity.
pub fn tier_for_quantity(quantity: i64) -> Option<&'static Tier> {
    TIERS.iter().find(|t| t.quantity == quantity)
}

/// Tickets issued for a confirmed vote of `quantity`.
///
/// Quantities outside the tier table get one ticket per vote.
pub fn ticket_count(quantity: i64) -> usize {
    tier_for_quantity(quantity)
        .map(|t| t.tickets)
        .unwrap_or_else(|| quantity.max(0) as usize)
}

/// List-row id for a comedian.
pub fn comedian_row_id(comedian_id: i64) -> String {
    format!("{}{}", COMEDIAN_PREFIX, comedian_id)
}

/// Name slug used by list rows sent before rows carried numeric ids:
/// lowercased, spaces replaced by underscores.
pub fn slugify(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

/// What a `comedian_...` row id refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComedianRef {
    Id(i64),
    Slug(String),
}

/// Parse a comedian row id.
pub fn parse_comedian_ref(row_id: &str) -> Option<ComedianRef> {
    let rest = row_id.strip_prefix(COMEDIAN_PREFIX)?;
    if rest.is_empty() {
        return None;
    }

    Some(match rest.parse::<i64>() {
        Ok(id) => ComedianRef::Id(id),
        Err(_) => ComedianRef::Slug(rest.to_lowercase()),
    })
}

/// Parse a `quantity_<n>` row id.
pub fn parse_quantity(row_id: &str) -> Option<i64> {
    row_id
        .strip_prefix(QUANTITY_PREFIX)?
        .parse::<i64>()
        .ok()
        .filter(|q| *q > 0)
}

/// Format an amount with thousands separators ("10,000").
pub fn format_amount(amount: i64) -> String {
    let digits = amount.abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if amount < 0 {
        out.insert(0, '-');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticket_bonus_table() {
        assert_eq!(ticket_count(1), 1);
        assert_eq!(ticket_count(5), 6);
        assert_eq!(ticket_count(10), 12);
        assert_eq!(ticket_count(50), 60);
        // Off-table quantities are 1:1
        assert_eq!(ticket_count(3), 3);
        assert_eq!(ticket_count(0), 0);
    }

    #[test]
    fn test_exactly_one_free_tier() {
        let free: Vec<_> = TIERS.iter().filter(|t| t.is_free()).collect();
        assert_eq!(free.len(), 1);
        assert_eq!(free[0].quantity, 1);
        assert_eq!(tier_for_quantity(10).map(|t| t.price), Some(2000));
    }

    #[test]
    fn test_tier_rows() {
        let tier = tier_for_quantity(50).unwrap();
        assert_eq!(tier.row_id(), "quantity_50");
        assert_eq!(tier.title(), "Kura 50");
        assert_eq!(tier.description(), "TZS 10,000 - tiketi 60");
    }

    #[test]
    fn test_parse_comedian_ref() {
        assert_eq!(parse_comedian_ref("comedian_7"), Some(ComedianRef::Id(7)));
        assert_eq!(
            parse_comedian_ref("comedian_Brother_K"),
            Some(ComedianRef::Slug("brother_k".to_string()))
        );
        assert_eq!(parse_comedian_ref("comedian_"), None);
        assert_eq!(parse_comedian_ref("quantity_5"), None);
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("quantity_10"), Some(10));
        assert_eq!(parse_quantity("quantity_0"), None);
        assert_eq!(parse_quantity("quantity_x"), None);
        assert_eq!(parse_quantity("comedian_10"), None);
    }

    #[test]
    fn test_slug_matches_names_with_punctuation() {
        // Names that a title-case reconstruction gets wrong.
        let names = ["Steve Mweusi", "MC Pilipili", "Mr. Bean", "O'Brian", "DJ-Kalo", "mkojani"];
        for name in names {
            let row = format!("{}{}", COMEDIAN_PREFIX, slugify(name));
            match parse_comedian_ref(&row) {
                Some(ComedianRef::Slug(slug)) => assert_eq!(slug, slugify(name), "{}", name),
                other => panic!("{} parsed as {:?}", name, other),
            }
        }
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0), "0");
        assert_eq!(format_amount(1000), "1,000");
        assert_eq!(format_amount(10000), "10,000");
        assert_eq!(format_amount(1234567), "1,234,567");
    }
}
