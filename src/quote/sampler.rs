//! Reaction-weighted random draw.

use crate::error::QuoteError;
use crate::quote::types::Message;

use rand::Rng;
use std::sync::Arc;

/// Weight of a message: its total reaction count plus `base_weight`.
pub fn message_weight(message: &Message, base_weight: u64) -> u64 {
    message.reaction_count().saturating_add(base_weight)
}

/// Draw one message with probability proportional to its weight.
///
/// Draws `r` uniformly from `[0, W)` and walks the pool subtracting weights
/// until `r` drops below the current entry's weight.
pub fn sample<'a, R: Rng>(
    pool: &'a [Arc<Message>],
    base_weight: u64,
    rng: &mut R,
) -> Result<&'a Arc<Message>, QuoteError> {
    let weights: Vec<u64> = pool
        .iter()
        .map(|message| message_weight(message, base_weight))
        .collect();
    let total = weights
        .iter()
        .fold(0u64, |total, weight| total.saturating_add(*weight));

    if pool.is_empty() || total == 0 {
        tracing::error!(
            pool_size = pool.len(),
            total_weight = total,
            "quote sampler called with an empty pool"
        );
        return Err(QuoteError::EmptyPool);
    }

    let mut remaining = rng.random_range(0..total);
    for (message, weight) in pool.iter().zip(weights) {
        if remaining < weight {
            return Ok(message);
        }
        remaining -= weight;
    }

    // Unreachable while `total` is the sum of the walked weights, barring
    // saturation at u64::MAX.
    pool.last().ok_or(QuoteError::EmptyPool)
}
