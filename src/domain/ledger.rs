// src/domain/ledger.rs
// Weighted-average-cost ledger update

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::errors::{TradeError, TradeResult};
use crate::domain::models::{Account, AccountDelta, Position, Trade, TradeType, Transaction};

/// Apply one trade to `account` and return the resulting wallet, positions
/// and transaction list.
///
/// The account is only read. On any error the caller still holds the
/// untouched original, so a rejected trade never leaves partial state.
///
/// Every BUY re-bases `average_price` to `total_investment / quantity`; a
/// SELL shrinks the cost basis proportionally and leaves `average_price`
/// alone. The touched position is marked at the execution price, and
/// positions that reach zero units are dropped.
pub fn apply_trade(
    account: &Account,
    trade: &Trade,
    timestamp: DateTime<Utc>,
) -> TradeResult<AccountDelta> {
    validate(trade)?;

    let quantity = Decimal::from(trade.quantity);
    let total_amount = quantity.checked_mul(trade.price).ok_or_else(|| {
        TradeError::InvalidQuantity(format!(
            "{} x {} overflows the trade value",
            trade.quantity, trade.price
        ))
    })?;

    let mut wallet = account.wallet.clone();
    let mut positions = account.positions.clone();

    match trade.trade_type {
        TradeType::Buy => {
            if total_amount > wallet.balance {
                return Err(TradeError::InsufficientFunds {
                    required: total_amount,
                    available: wallet.balance,
                });
            }

            let position = positions
                .entry(trade.symbol.clone())
                .or_insert_with(|| Position::new(&trade.symbol));

            position.quantity = position.quantity.checked_add(trade.quantity).ok_or_else(|| {
                TradeError::InvalidQuantity(format!(
                    "holding {} units of {} would overflow",
                    trade.quantity, trade.symbol
                ))
            })?;
            position.total_investment = position
                .total_investment
                .checked_add(total_amount)
                .ok_or_else(|| overflow(trade, "cost basis"))?;
            position.average_price =
                position.total_investment / Decimal::from(position.quantity);
            position
                .mark(trade.price)
                .ok_or_else(|| overflow(trade, "position value"))?;

            wallet.balance -= total_amount;
        }
        TradeType::Sell => {
            let available = account.holdings(&trade.symbol);
            let position = match positions.get_mut(&trade.symbol) {
                Some(position) if position.quantity >= trade.quantity => position,
                _ => {
                    return Err(TradeError::InsufficientShares {
                        symbol: trade.symbol.clone(),
                        required: trade.quantity,
                        available,
                    })
                }
            };

            position.quantity -= trade.quantity;
            position.total_investment = Decimal::from(position.quantity) * position.average_price;
            position
                .mark(trade.price)
                .ok_or_else(|| overflow(trade, "position value"))?;

            wallet.balance = wallet
                .balance
                .checked_add(total_amount)
                .ok_or_else(|| overflow(trade, "cash balance"))?;
        }
    }

    positions.retain(|_, p| p.quantity > 0);

    let executed = Transaction {
        id: Uuid::new_v4(),
        symbol: trade.symbol.clone(),
        trade_type: trade.trade_type,
        quantity: trade.quantity,
        price: trade.price,
        total_amount,
        timestamp,
    };
    let mut transactions = account.transactions.clone();
    transactions.push(executed.clone());

    Ok(AccountDelta {
        wallet,
        positions,
        transactions,
        executed,
    })
}

/// Gain or loss locked in by selling `trade.quantity` units of a position
/// carried at `average_price`. Zero for buys.
pub fn realized_pnl(trade: &Trade, average_price: Decimal) -> Decimal {
    match trade.trade_type {
        TradeType::Buy => Decimal::ZERO,
        TradeType::Sell => Decimal::from(trade.quantity) * (trade.price - average_price),
    }
}

fn overflow(trade: &Trade, what: &str) -> TradeError {
    TradeError::InvalidPrice(format!(
        "{} {} at {} overflows the {}",
        trade.trade_type, trade.symbol, trade.price, what
    ))
}

fn validate(trade: &Trade) -> TradeResult<()> {
    if trade.symbol.trim().is_empty() {
        return Err(TradeError::InvalidSymbol(trade.symbol.clone()));
    }
    if trade.quantity == 0 {
        return Err(TradeError::InvalidQuantity(
            "quantity must be a positive integer".to_string(),
        ));
    }
    if trade.price <= Decimal::ZERO {
        return Err(TradeError::InvalidPrice(format!(
            "price must be positive, got {}",
            trade.price
        )));
    }
    Ok(())
}
