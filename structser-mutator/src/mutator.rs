use structser::{DefaultValue, Equatable, Serializable};

use crate::context::MutationContext;
use crate::random::RandomSource;
use crate::sampler::ChaoSampler;

/// A value that can be mutated in place.
///
/// `mutate` returns whether the value changed structurally. When the context enforces changes,
/// implementations must return true whenever their type admits any mutation that fits in the
/// remaining growth budget.
pub trait Mutatable: Serializable + DefaultValue + Equatable + Clone {
    fn mutate(&mut self, ctx: &mut MutationContext) -> bool;

    /// Re-establishes cross-field invariants after a complete mutation pass.
    ///
    /// Compound types recurse into their children before running their own hook.
    fn post_process(&mut self, _rand: &mut RandomSource) {}

    /// Mixes parts of `other` into `self`. Returns whether `self` changed.
    fn cross_over(&mut self, other: &Self, ctx: &mut MutationContext) -> bool {
        adopt(self, other, ctx)
    }
}

/// Replaces `value` with a copy of `other` if they differ and the growth fits the budget.
pub fn adopt<T: Mutatable>(value: &mut T, other: &T, ctx: &mut MutationContext) -> bool {
    if value.equals(other) {
        return false;
    }
    let growth = other.encoded_size().saturating_sub(value.encoded_size());
    if !ctx.try_grow(growth) {
        return false;
    }
    *value = other.clone();
    true
}

/// Mutates one of `count` fields, or with a small probability several distinct ones.
///
/// When changes are enforced and nothing changed, every field is tried once more in random
/// order before giving up.
pub fn mutate_fields<F>(ctx: &mut MutationContext, count: usize, mut mutate_field: F) -> bool
where
    F: FnMut(usize, &mut MutationContext) -> bool,
{
    if count == 0 {
        return false;
    }

    let settings = ctx.settings();
    let mut changed = false;
    if count > 1 && ctx.rand().chance(settings.multi_field_probability) {
        let mut order: Vec<usize> = (0..count).collect();
        ctx.rand().shuffle(&mut order);
        let picks = 2 + ctx.rand().uniform(count - 1);
        for &index in &order[..picks] {
            changed |= mutate_field(index, ctx);
        }
    } else {
        let index = ctx.rand().uniform(count);
        changed = mutate_field(index, ctx);
    }

    if changed || !ctx.enforce_changes() {
        return changed;
    }

    let mut order: Vec<usize> = (0..count).collect();
    ctx.rand().shuffle(&mut order);
    order.into_iter().any(|index| mutate_field(index, ctx))
}

/// Crosses each of `count` fields with probability 1/2.
pub fn cross_fields<F>(ctx: &mut MutationContext, count: usize, mut cross_field: F) -> bool
where
    F: FnMut(usize, &mut MutationContext) -> bool,
{
    let mut changed = false;
    for index in 0..count {
        if ctx.rand().chance(0.5) {
            changed |= cross_field(index, ctx);
        }
    }
    changed
}

/// A tagged union whose variants can be enumerated and defaulted individually.
pub trait SumType: Mutatable {
    const VARIANT_COUNT: usize;

    fn variant_index(&self) -> usize;

    /// The variant with the given index and a default payload.
    fn variant_default(index: usize) -> Self;

    /// Mutates the active variant's payload, keeping the tag.
    fn mutate_payload(&mut self, ctx: &mut MutationContext) -> bool;
}

pub fn mutate_sum<T: SumType>(value: &mut T, ctx: &mut MutationContext) -> bool {
    let settings = ctx.settings();
    if T::VARIANT_COUNT > 1
        && ctx.rand().chance(settings.switch_variant_probability)
        && switch_variant(value, ctx)
    {
        return true;
    }

    let changed = value.mutate_payload(ctx);
    if changed || !ctx.enforce_changes() {
        return changed;
    }
    switch_variant(value, ctx)
}

/// Switches to a different variant whose default payload fits in the budget.
pub fn switch_variant<T: SumType>(value: &mut T, ctx: &mut MutationContext) -> bool {
    let current = value.variant_index();
    let size = value.encoded_size();

    let mut sampler = ChaoSampler::new();
    for index in (0..T::VARIANT_COUNT).filter(|index| *index != current) {
        let candidate = T::variant_default(index);
        if ctx.can_grow(candidate.encoded_size().saturating_sub(size)) {
            sampler.add(ctx.rand(), candidate, 1);
        }
    }

    let Some(mut fresh) = sampler.get_sample() else {
        return false;
    };
    ctx.try_grow(fresh.encoded_size().saturating_sub(size));

    let settings = ctx.settings();
    if ctx.rand().chance(settings.fresh_payload_probability) {
        ctx.relaxed(|ctx| fresh.mutate_payload(ctx));
    }
    *value = fresh;
    true
}

impl<T: Mutatable> SumType for Option<T> {
    const VARIANT_COUNT: usize = 2;

    fn variant_index(&self) -> usize {
        self.is_some() as usize
    }

    fn variant_default(index: usize) -> Self {
        match index {
            0 => None,
            _ => Some(T::default_value()),
        }
    }

    fn mutate_payload(&mut self, ctx: &mut MutationContext) -> bool {
        match self {
            Some(value) => value.mutate(ctx),
            None => false,
        }
    }
}

impl<T: Mutatable> Mutatable for Option<T> {
    fn mutate(&mut self, ctx: &mut MutationContext) -> bool {
        mutate_sum(self, ctx)
    }

    fn post_process(&mut self, rand: &mut RandomSource) {
        if let Some(value) = self {
            value.post_process(rand);
        }
    }

    fn cross_over(&mut self, other: &Self, ctx: &mut MutationContext) -> bool {
        match (self.as_mut(), other) {
            (Some(value), Some(other)) => value.cross_over(other, ctx),
            _ => adopt(self, other, ctx),
        }
    }
}

macro_rules! impl_tuple {
    ($count:expr; $($name:ident $idx:tt),+) => {
        impl<$($name: Mutatable),+> Mutatable for ($($name,)+) {
            fn mutate(&mut self, ctx: &mut MutationContext) -> bool {
                mutate_fields(ctx, $count, |index, ctx| match index {
                    $($idx => self.$idx.mutate(ctx),)+
                    _ => false,
                })
            }

            fn post_process(&mut self, rand: &mut RandomSource) {
                $(self.$idx.post_process(rand);)+
            }

            fn cross_over(&mut self, other: &Self, ctx: &mut MutationContext) -> bool {
                cross_fields(ctx, $count, |index, ctx| match index {
                    $($idx => self.$idx.cross_over(&other.$idx, ctx),)+
                    _ => false,
                })
            }
        }
    };
}

impl_tuple!(1; A 0);
impl_tuple!(2; A 0, B 1);
impl_tuple!(3; A 0, B 1, C 2);
impl_tuple!(4; A 0, B 1, C 2, D 3);
impl_tuple!(5; A 0, B 1, C 2, D 3, E 4);
impl_tuple!(6; A 0, B 1, C 2, D 3, E 4, F 5);
impl_tuple!(7; A 0, B 1, C 2, D 3, E 4, F 5, G 6);
impl_tuple!(8; A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7);
impl_tuple!(9; A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7, I 8);
impl_tuple!(10; A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7, I 8, J 9);
impl_tuple!(11; A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7, I 8, J 9, K 10);
impl_tuple!(12; A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7, I 8, J 9, K 10, L 11);
