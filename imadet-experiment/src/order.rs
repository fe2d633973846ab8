use rand::Rng;
use rand::seq::SliceRandom;

/// Source of trial and block orderings.
///
/// Every ordering decision in a session (tilt-class order, trial order within
/// a cycle, condition order) goes through one of these, so a seeded or fixed
/// implementation replays a session exactly.
pub trait TrialOrder {
    fn permute<T>(&mut self, items: &mut [T]);
}

impl<O: TrialOrder> TrialOrder for &mut O {
    fn permute<T>(&mut self, items: &mut [T]) {
        (**self).permute(items)
    }
}

/// Uniform shuffles drawn from `rng`
#[derive(Debug, Clone)]
pub struct ShuffledOrder<R: Rng> {
    rng: R,
}

impl<R: Rng> ShuffledOrder<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> TrialOrder for ShuffledOrder<R> {
    fn permute<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.rng);
    }
}

/// Leaves every sequence as built.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedOrder;

impl TrialOrder for FixedOrder {
    fn permute<T>(&mut self, _items: &mut [T]) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn fixed_order_is_identity() {
        let mut items = [1, 2, 3, 4];
        FixedOrder.permute(&mut items);
        assert_eq!(items, [1, 2, 3, 4]);
    }

    #[test]
    fn same_seed_replays_same_order() {
        let mut a = ShuffledOrder::new(ChaCha8Rng::seed_from_u64(7));
        let mut b = ShuffledOrder::new(ChaCha8Rng::seed_from_u64(7));
        let mut left: Vec<u32> = (0..32).collect();
        let mut right = left.clone();
        a.permute(&mut left);
        b.permute(&mut right);
        assert_eq!(left, right);

        let mut sorted = left.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..32).collect::<Vec<_>>());
    }
}
