use serde::Deserialize;
use thiserror::Error;

/// One line of the shopper's cart; `amount` is in the currency's minor unit.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CartItem {
    pub id: String,
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatePaymentIntentRequest {
    pub items: Vec<CartItem>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CartError {
    #[error("cart is empty")]
    Empty,
    #[error("item `{id}` has non-positive amount {amount}")]
    NonPositiveAmount { id: String, amount: i64 },
    #[error("cart total overflows")]
    Overflow,
}

impl CreatePaymentIntentRequest {
    /// Sum of the item amounts, checked.
    pub fn total_amount(&self) -> Result<i64, CartError> {
        if self.items.is_empty() {
            return Err(CartError::Empty);
        }
        self.items.iter().try_fold(0i64, |total, item| {
            if item.amount <= 0 {
                return Err(CartError::NonPositiveAmount {
                    id: item.id.clone(),
                    amount: item.amount,
                });
            }
            total.checked_add(item.amount).ok_or(CartError::Overflow)
        })
    }
}
