// src/domain/portfolio.rs
// Portfolio valuation and unrealized P&L

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::models::{Account, Position};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// One holding as shown to a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionView {
    pub symbol: String,
    pub quantity: u64,
    pub average_price: Decimal,
    pub current_price: Decimal,
    pub total_investment: Decimal,
    pub current_value: Decimal,
    pub pnl: Decimal,
    pub pnl_percent: Decimal,
}

impl From<&Position> for PositionView {
    fn from(position: &Position) -> Self {
        let pnl = position.unrealized_pnl();
        let pnl_percent = if position.total_investment > Decimal::ZERO {
            (pnl / position.total_investment * HUNDRED).round_dp(2)
        } else {
            Decimal::ZERO
        };

        Self {
            symbol: position.symbol.clone(),
            quantity: position.quantity,
            average_price: position.average_price,
            current_price: position.mark_price(),
            total_investment: position.total_investment,
            current_value: position.current_value,
            pnl,
            pnl_percent,
        }
    }
}

/// Account-wide valuation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub currency: String,
    pub cash: Decimal,
    pub positions: Vec<PositionView>,
    pub market_value: Decimal,
    pub total_investment: Decimal,
    pub total_pnl: Decimal,
    pub total_pnl_percent: Decimal,
    pub net_worth: Decimal,
}

impl PortfolioSummary {
    /// Value the account at the marks stored on its positions
    pub fn from_account(account: &Account) -> Self {
        let positions: Vec<PositionView> = account
            .positions
            .values()
            .filter(|p| p.quantity > 0)
            .map(PositionView::from)
            .collect();

        let market_value: Decimal = positions.iter().map(|p| p.current_value).sum();
        let total_investment: Decimal = positions.iter().map(|p| p.total_investment).sum();
        let total_pnl: Decimal = positions.iter().map(|p| p.pnl).sum();

        let cost = market_value - total_pnl;
        let total_pnl_percent = if market_value > Decimal::ZERO && cost > Decimal::ZERO {
            (total_pnl / cost * HUNDRED).round_dp(2)
        } else {
            Decimal::ZERO
        };

        Self {
            currency: account.wallet.currency.clone(),
            cash: account.wallet.balance,
            positions,
            market_value,
            total_investment,
            total_pnl,
            total_pnl_percent,
            net_worth: account.wallet.balance + market_value,
        }
    }

    /// Value the account after re-marking positions at `prices`.
    /// Symbols missing from `prices` keep their last mark.
    pub fn with_prices(account: &Account, prices: &HashMap<String, Decimal>) -> Self {
        let mut marked = account.clone();
        mark_to_market(&mut marked, prices);
        Self::from_account(&marked)
    }
}

/// Re-mark every position with a known price. Returns how many were updated.
pub fn mark_to_market(account: &mut Account, prices: &HashMap<String, Decimal>) -> usize {
    let mut updated = 0;
    for position in account.positions.values_mut() {
        if let Some(price) = prices.get(&position.symbol) {
            match position.mark(*price) {
                Some(_) => updated += 1,
                None => log::warn!("Mark for {} at {} overflows, keeping last value", position.symbol, price),
            }
        }
    }
    updated
}
