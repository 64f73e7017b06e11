//! # Checkout Pre-Pass
//!
//! Pure preparation for the checkout transaction: validates the request
//! shape and collapses duplicate lines before the storage layer touches
//! anything.
//!
//! ## Why Group First?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Request:  [{A, 1}, {B, 2}, {A, 1}]                                     │
//! │                                                                         │
//! │  Without grouping the engine would check A's stock twice against the    │
//! │  partial quantity and write two line items for one product.             │
//! │                                                                         │
//! │  prepare() →  [(A, 2), (B, 2)]   (sorted by product id)                 │
//! │                                                                         │
//! │  Sorted order doubles as a stable lock-acquisition order, so two        │
//! │  concurrent checkouts touching {A, B} and {B, A} serialize instead of   │
//! │  deadlocking.                                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::validation::{validate_quantity, validate_uuid};

/// One requested line of a checkout: a product and how many units.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineRequest {
    pub product_id: String,
    pub qty: i64,
}

/// A validated, de-duplicated checkout line.
///
/// Produced only by [`prepare`]; quantities are positive and product ids
/// are well-formed UUIDs by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutLine {
    pub product_id: String,
    pub qty: i64,
}

/// Validates a checkout request and groups duplicate lines.
///
/// ## Rules
/// - The request must contain at least one line
/// - Every quantity must be positive
/// - Every product id must be a well-formed UUID
///
/// ## Returns
/// One [`CheckoutLine`] per distinct product, quantities summed, sorted
/// by product id.
///
/// ## Example
/// ```rust
/// use kiosk_core::checkout::{prepare, LineRequest};
///
/// let lines = prepare(&[
///     LineRequest { product_id: "7f9c24e8-3b13-4b6a-8a3a-000000000002".into(), qty: 1 },
///     LineRequest { product_id: "7f9c24e8-3b13-4b6a-8a3a-000000000001".into(), qty: 2 },
///     LineRequest { product_id: "7f9c24e8-3b13-4b6a-8a3a-000000000002".into(), qty: 3 },
/// ]).unwrap();
///
/// assert_eq!(lines.len(), 2);
/// assert_eq!(lines[0].qty, 2); // ...0001
/// assert_eq!(lines[1].qty, 4); // ...0002, 1 + 3
/// ```
pub fn prepare(lines: &[LineRequest]) -> Result<Vec<CheckoutLine>, ValidationError> {
    if lines.is_empty() {
        return Err(ValidationError::Empty {
            field: "items".to_string(),
        });
    }

    // BTreeMap gives the sorted-by-product-id order for free.
    let mut grouped: BTreeMap<String, i64> = BTreeMap::new();

    for line in lines {
        validate_uuid("productId", &line.product_id)?;
        validate_quantity(line.qty)?;

        *grouped.entry(line.product_id.clone()).or_insert(0) += line.qty;
    }

    Ok(grouped
        .into_iter()
        .map(|(product_id, qty)| CheckoutLine { product_id, qty })
        .collect())
}

// =============================================================================
// Unit Tests
// =============================================================================
