use super::RotationStrategy;
use crate::calendar::Week;
use crate::model::{Guard, ShiftType};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Un ordre de passage par type de créneau, indexé comme `ShiftType::ALL`.
pub(super) struct Rotations<'a> {
    orders: [Vec<&'a Guard>; 3],
}

impl<'a> Rotations<'a> {
    /// Agent de garde pour `day` : round-robin sur l'ordre du type.
    pub(super) fn pick(&self, shift_type: ShiftType, day: u8) -> Option<&'a Guard> {
        let order = &self.orders[slot(shift_type)];
        if order.is_empty() {
            return None;
        }
        Some(order[usize::from(day) % order.len()])
    }
}

fn slot(shift_type: ShiftType) -> usize {
    match shift_type {
        ShiftType::Morning => 0,
        ShiftType::Afternoon => 1,
        ShiftType::Night => 2,
    }
}

/// Source d'ordres de rotation pour une génération complète.
pub(super) struct RotationBuilder {
    strategy: RotationStrategy,
    week: Week,
    rng: StdRng,
}

impl RotationBuilder {
    pub(super) fn new(strategy: RotationStrategy, week: Week) -> Self {
        let rng = match strategy {
            RotationStrategy::Shuffled { seed: Some(seed) } => StdRng::seed_from_u64(seed),
            _ => StdRng::from_entropy(),
        };
        Self {
            strategy,
            week,
            rng,
        }
    }

    pub(super) fn build<'a>(&mut self, pool: &[&'a Guard]) -> Rotations<'a> {
        let orders = ShiftType::ALL.map(|t| self.order(pool, t));
        Rotations { orders }
    }

    fn order<'a>(&mut self, pool: &[&'a Guard], shift_type: ShiftType) -> Vec<&'a Guard> {
        let mut order = pool.to_vec();
        if order.is_empty() {
            return order;
        }
        match self.strategy {
            RotationStrategy::Shuffled { .. } => order.shuffle(&mut self.rng),
            RotationStrategy::Staggered => {
                let offset = (self.week.number() as usize + slot(shift_type)) % order.len();
                order.rotate_left(offset);
            }
        }
        order
    }
}
