use crate::config::deal_thresholds::*;
use crate::types::{Action, GameRecord, Insight, Verdict};

const FREE_REASON: &str = "No cost to try. Decide based on tags and reviews instead of discounts.";
const NOT_ON_SALE_REASON: &str = "No discount detected. Consider waiting for a seasonal sale.";
const STRONG_REASON: &str = "Large discount: strong buy signal if you already like this genre.";
const MODEST_REASON: &str = "Discount is modest. You might get a better price during major sales.";

/// Score a record's deal quality. Rules are checked in order, first match wins:
/// free, then no usable discount, then the discount ladder.
///
/// An absent price counts as 0 (free). Discounts outside 0-100 are not
/// clamped and fall through the ladder as-is.
pub fn compute_insight(game: &GameRecord) -> Insight {
    let price = game.current_price.unwrap_or(0.0);
    if price == 0.0 {
        return Insight {
            verdict: Verdict::FreeToPlay,
            score: 85,
            reason: FREE_REASON,
            action: Action::TryItNow,
        };
    }

    let discount = match game.discount_percent {
        Some(d) if !d.is_nan() => d,
        _ => {
            return Insight {
                verdict: Verdict::NotOnSale,
                score: 55,
                reason: NOT_ON_SALE_REASON,
                action: Action::Wait,
            }
        }
    };

    let (verdict, score) = if discount >= AMAZING_MIN {
        (Verdict::AmazingDeal, 95)
    } else if discount >= GREAT_MIN {
        (Verdict::GreatDeal, 88)
    } else if discount >= GOOD_MIN {
        (Verdict::GoodDeal, 78)
    } else if discount >= SMALL_MIN {
        (Verdict::SmallDiscount, 68)
    } else {
        (Verdict::BarelyOnSale, 60)
    };

    let action = if discount >= BUY_MIN {
        Action::BuyNow
    } else {
        Action::Wait
    };

    let reason = if discount >= STRONG_SIGNAL_MIN {
        STRONG_REASON
    } else {
        MODEST_REASON
    };

    Insight {
        verdict,
        score,
        reason,
        action,
    }
}
