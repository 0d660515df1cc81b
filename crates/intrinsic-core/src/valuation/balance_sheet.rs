use serde::{Deserialize, Serialize};

use crate::FundamentalSnapshot;

/// Enterprise-to-equity bridge for the cash-flow method.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BalanceSheetAdjustment {
    pub total_discounted: f64,
    pub shares_outstanding: f64,
    pub intrinsic_per_share: f64,
    /// `(cash + short_term_investments) / shares`
    pub cash_per_share: f64,
    /// `(short_term_debt + long_term_debt) / shares`
    pub debt_per_share: f64,
    pub final_value: f64,
}

impl BalanceSheetAdjustment {
    /// `shares_outstanding` must already be known positive.
    pub fn compute(
        total_discounted: f64,
        shares_outstanding: f64,
        snapshot: &FundamentalSnapshot,
    ) -> Self {
        let amount = |value: Option<f64>| value.unwrap_or(0.0);

        let intrinsic_per_share = total_discounted / shares_outstanding;
        let cash_per_share =
            (amount(snapshot.cash) + amount(snapshot.short_term_investments)) / shares_outstanding;
        let debt_per_share =
            (amount(snapshot.short_term_debt) + amount(snapshot.long_term_debt)) / shares_outstanding;

        Self {
            total_discounted,
            shares_outstanding,
            intrinsic_per_share,
            cash_per_share,
            debt_per_share,
            final_value: intrinsic_per_share + cash_per_share - debt_per_share,
        }
    }
}
