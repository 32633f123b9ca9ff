//! Ready-made reducers.
//!
//! Each constructor returns a closure suitable for `FunnelBuilder::with_reducer`.

use std::ops::Add;

use crate::error::Result;

/// The reducer of a funnel configured without one: every call contributes `()`.
#[inline]
pub fn unit(_acc: Option<()>, _args: ()) -> Result<()> {
    Ok(())
}

/// Keep only the most recent call's value (debounce-with-latest-argument).
pub fn latest<T>() -> impl FnMut(Option<T>, T) -> Result<T> {
    |_, value| Ok(value)
}

/// Collect every call's value, in call order.
pub fn collect<T>() -> impl FnMut(Option<Vec<T>>, T) -> Result<Vec<T>> {
    |acc, value| {
        let mut batch = acc.unwrap_or_default();
        batch.push(value);
        Ok(batch)
    }
}

/// Count calls.
pub fn count<T>() -> impl FnMut(Option<u64>, T) -> Result<u64> {
    |acc, _| Ok(acc.unwrap_or(0).saturating_add(1))
}

/// Sum call values.
pub fn sum<T>() -> impl FnMut(Option<T>, T) -> Result<T>
where
    T: Add<Output = T>,
{
    |acc, value| {
        Ok(match acc {
            Some(total) => total + value,
            None => value,
        })
    }
}
