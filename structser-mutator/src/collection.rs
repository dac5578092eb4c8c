use structser::{EnumSet, Enumeration, Equatable, MAX_SEQUENCE_LEN};

use crate::context::MutationContext;
use crate::mutator::{cross_fields, mutate_fields, Mutatable};
use crate::primitive::random_char;
use crate::random::RandomSource;
use crate::sampler::ChaoSampler;

#[derive(Debug, Clone, Copy, PartialEq)]
enum SequenceMutation {
    Insert,
    Delete,
    Duplicate(usize),
    Swap,
    MutateElement,
}

/// How the elements of a sequence are generated, sized and mutated.
trait Elements<T> {
    /// Budget charged when `element` is added to the sequence.
    fn cost(&self, element: &T) -> usize;

    fn min_insert_cost(&self) -> usize;

    /// A new element, with its cost already charged. `None` if the budget does not allow one.
    fn fresh(&self, ctx: &mut MutationContext) -> Option<T>;

    fn mutate_element(&self, element: &mut T, ctx: &mut MutationContext) -> bool;

    fn same(&self, a: &T, b: &T) -> bool;
}

struct Values;

impl<T: Mutatable> Elements<T> for Values {
    fn cost(&self, element: &T) -> usize {
        // Zero-sized elements still cost a byte so that the sequence length stays bounded
        std::cmp::max(element.encoded_size(), 1)
    }

    fn min_insert_cost(&self) -> usize {
        <Self as Elements<T>>::cost(self, &T::default_value())
    }

    fn fresh(&self, ctx: &mut MutationContext) -> Option<T> {
        let mut element = T::default_value();
        if !ctx.try_grow(<Self as Elements<T>>::cost(self, &element)) {
            return None;
        }
        let settings = ctx.settings();
        if ctx.rand().chance(settings.fresh_payload_probability) {
            ctx.relaxed(|ctx| element.mutate(ctx));
        }
        Some(element)
    }

    fn mutate_element(&self, element: &mut T, ctx: &mut MutationContext) -> bool {
        element.mutate(ctx)
    }

    fn same(&self, a: &T, b: &T) -> bool {
        a.equals(b)
    }
}

struct Chars;

impl Elements<char> for Chars {
    fn cost(&self, element: &char) -> usize {
        element.len_utf8()
    }

    fn min_insert_cost(&self) -> usize {
        1
    }

    fn fresh(&self, ctx: &mut MutationContext) -> Option<char> {
        let mut c = random_char(ctx.rand());
        if !ctx.can_grow(c.len_utf8()) {
            // Printable ASCII fits any non-zero budget
            c = (b' ' + ctx.rand().uniform(95) as u8) as char;
        }
        ctx.try_grow(c.len_utf8()).then_some(c)
    }

    fn mutate_element(&self, element: &mut char, ctx: &mut MutationContext) -> bool {
        let mut c = *element;
        if !c.mutate(ctx) {
            return false;
        }
        // Text is sized in UTF-8 bytes, so a wider character grows the encoding
        if !ctx.try_grow(c.len_utf8().saturating_sub(element.len_utf8())) {
            return false;
        }
        *element = c;
        true
    }

    fn same(&self, a: &char, b: &char) -> bool {
        a == b
    }
}

fn sample_sequence_mutation<T, E: Elements<T>>(
    elements: &[T],
    ops: &E,
    ctx: &mut MutationContext,
) -> Option<SequenceMutation> {
    let len = elements.len();
    let room = len < MAX_SEQUENCE_LEN;
    let mut sampler = ChaoSampler::new();

    if room && ctx.can_grow(ops.min_insert_cost()) {
        sampler.add(ctx.rand(), SequenceMutation::Insert, 1);
    }
    if len > 0 {
        sampler.add(ctx.rand(), SequenceMutation::Delete, 1);
        sampler.add(ctx.rand(), SequenceMutation::MutateElement, 2);

        let source = ctx.rand().uniform(len);
        if room && ctx.can_grow(ops.cost(&elements[source])) {
            sampler.add(ctx.rand(), SequenceMutation::Duplicate(source), 1);
        }
    }
    if len > 1 {
        sampler.add(ctx.rand(), SequenceMutation::Swap, 1);
    }

    sampler.get_sample()
}

fn insert<T, E: Elements<T>>(elements: &mut Vec<T>, ops: &E, ctx: &mut MutationContext) -> bool {
    if elements.len() >= MAX_SEQUENCE_LEN {
        return false;
    }
    let Some(element) = ops.fresh(ctx) else {
        return false;
    };
    let index = ctx.rand().uniform(elements.len() + 1);
    elements.insert(index, element);
    true
}

fn delete<T>(elements: &mut Vec<T>, rand: &mut RandomSource) -> bool {
    if elements.is_empty() {
        return false;
    }
    let index = rand.uniform(elements.len());
    elements.remove(index);
    true
}

fn mutate_sequence<T: Clone, E: Elements<T>>(
    elements: &mut Vec<T>,
    ops: &E,
    ctx: &mut MutationContext,
) -> bool {
    let changed = match sample_sequence_mutation(elements.as_slice(), ops, ctx) {
        Some(SequenceMutation::Insert) => insert(elements, ops, ctx),
        Some(SequenceMutation::Delete) => delete(elements, ctx.rand()),
        Some(SequenceMutation::Duplicate(source)) => {
            let copy = elements[source].clone();
            if ctx.try_grow(ops.cost(&copy)) {
                let index = ctx.rand().uniform(elements.len() + 1);
                elements.insert(index, copy);
                true
            } else {
                false
            }
        }
        Some(SequenceMutation::Swap) => {
            let a = ctx.rand().uniform(elements.len());
            let b = ctx.rand().uniform(elements.len());
            elements.swap(a, b);
            !ops.same(&elements[a], &elements[b])
        }
        Some(SequenceMutation::MutateElement) => {
            let index = ctx.rand().uniform(elements.len());
            ops.mutate_element(&mut elements[index], ctx)
        }
        None => false,
    };

    if changed || !ctx.enforce_changes() {
        return changed;
    }

    // Length changes are the only mutations guaranteed to be observable
    delete(elements, ctx.rand()) || insert(elements, ops, ctx)
}

/// Joins a prefix of `elements` with a suffix of `other` if the growth fits.
fn splice_sequence<T: Clone, E: Elements<T>>(
    elements: &mut Vec<T>,
    other: &[T],
    ops: &E,
    ctx: &mut MutationContext,
) -> bool {
    let keep = ctx.rand().uniform(elements.len() + 1);
    let from = ctx.rand().uniform(other.len() + 1);
    let take = std::cmp::min(other.len() - from, MAX_SEQUENCE_LEN.saturating_sub(keep));

    let removed: usize = elements[keep..].iter().map(|e| ops.cost(e)).sum();
    let added: usize = other[from..from + take].iter().map(|e| ops.cost(e)).sum();
    if !ctx.try_grow(added.saturating_sub(removed)) {
        return false;
    }

    let unchanged = elements.len() - keep == take
        && elements[keep..]
            .iter()
            .zip(&other[from..from + take])
            .all(|(a, b)| ops.same(a, b));

    elements.truncate(keep);
    elements.extend_from_slice(&other[from..from + take]);
    !unchanged
}

impl<T: Mutatable> Mutatable for Vec<T> {
    fn mutate(&mut self, ctx: &mut MutationContext) -> bool {
        mutate_sequence(self, &Values, ctx)
    }

    fn post_process(&mut self, rand: &mut RandomSource) {
        for element in self.iter_mut() {
            element.post_process(rand);
        }
    }

    fn cross_over(&mut self, other: &Self, ctx: &mut MutationContext) -> bool {
        splice_sequence(self, other, &Values, ctx)
    }
}

impl Mutatable for String {
    fn mutate(&mut self, ctx: &mut MutationContext) -> bool {
        let mut chars: Vec<char> = self.chars().collect();
        let changed = mutate_sequence(&mut chars, &Chars, ctx);
        if changed {
            *self = chars.into_iter().collect();
        }
        changed
    }

    fn cross_over(&mut self, other: &Self, ctx: &mut MutationContext) -> bool {
        let mut chars: Vec<char> = self.chars().collect();
        let other: Vec<char> = other.chars().collect();
        let changed = splice_sequence(&mut chars, &other, &Chars, ctx);
        if changed {
            *self = chars.into_iter().collect();
        }
        changed
    }
}

impl<T: Mutatable, const N: usize> Mutatable for [T; N] {
    fn mutate(&mut self, ctx: &mut MutationContext) -> bool {
        mutate_fields(ctx, N, |index, ctx| self[index].mutate(ctx))
    }

    fn post_process(&mut self, rand: &mut RandomSource) {
        for element in self.iter_mut() {
            element.post_process(rand);
        }
    }

    fn cross_over(&mut self, other: &Self, ctx: &mut MutationContext) -> bool {
        cross_fields(ctx, N, |index, ctx| self[index].cross_over(&other[index], ctx))
    }
}

impl<E: Enumeration> Mutatable for EnumSet<E> {
    fn mutate(&mut self, ctx: &mut MutationContext) -> bool {
        if E::COUNT == 0 {
            return false;
        }
        let member = E::from_ordinal(ctx.rand().uniform(E::COUNT));
        self.toggle(member);
        true
    }

    fn cross_over(&mut self, other: &Self, ctx: &mut MutationContext) -> bool {
        let mask = ctx.rand().next_u64();
        let mixed = Self::from_bits((self.bits() & !mask) | (other.bits() & mask));
        let changed = !mixed.equals(self);
        *self = mixed;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use structser::{decode, encode, Serializable};

    fn assert_round_trips<T: Mutatable + std::fmt::Debug>(value: &T) {
        let bytes = encode(value);
        assert_eq!(bytes.len(), value.encoded_size());
        let decoded: T = decode(&bytes);
        assert!(decoded.equals(value), "{:?} did not round trip", value);
    }

    #[test]
    fn test_vec_growth_is_bounded_by_budget() {
        for seed in 0..200 {
            let mut value: Vec<u32> = vec![1, 2, 3];
            let before = value.encoded_size();
            let mut ctx = MutationContext::new(seed, 10, 1024);
            for _ in 0..20 {
                value.mutate(&mut ctx);
            }
            assert!(value.encoded_size() <= before + 10);
            assert_round_trips(&value);
        }
    }

    #[test]
    fn test_empty_string_changes_with_one_byte_budget() {
        for seed in 0..1000 {
            let mut value = String::new();
            let mut ctx = MutationContext::new(seed, 1, 1024);
            assert!(value.mutate(&mut ctx), "seed {seed} produced no change");
            assert_eq!(value.len(), 1);
            assert!(value.is_ascii());
        }
    }

    #[test]
    fn test_empty_string_without_budget_cannot_change() {
        let mut value = String::new();
        let mut ctx = MutationContext::new(0, 0, 1024);
        assert!(!value.mutate(&mut ctx));
        assert!(value.is_empty());
    }

    #[test]
    fn test_empty_vec_without_budget_cannot_change() {
        let mut value: Vec<u64> = Vec::new();
        let mut ctx = MutationContext::new(0, 7, 1024);
        assert!(!value.mutate(&mut ctx));
        assert!(value.is_empty());

        let mut ctx = MutationContext::new(0, 8, 1024);
        assert!(value.mutate(&mut ctx));
        assert_eq!(value.len(), 1);
    }

    #[test]
    fn test_vec_of_units_changes_length() {
        for seed in 0..100 {
            let mut value: Vec<()> = vec![(), ()];
            let mut ctx = MutationContext::new(seed, 0, 1024);
            assert!(value.mutate(&mut ctx));
            assert_eq!(value.len(), 1);
        }
    }

    #[test]
    fn test_string_stays_valid_and_bounded() {
        for seed in 0..200 {
            let mut value = String::from("héllo");
            let before = value.encoded_size();
            let mut ctx = MutationContext::new(seed, 6, 1024);
            for _ in 0..10 {
                value.mutate(&mut ctx);
            }
            assert!(value.encoded_size() <= before + 6);
            assert_round_trips(&value);
        }
    }

    #[test]
    fn test_string_enforced_change() {
        for seed in 0..200 {
            let mut value = String::from("ab");
            let mut ctx = MutationContext::new(seed, 0, 1024);
            assert!(value.mutate(&mut ctx));
            assert_ne!(value, "ab");
        }
    }

    #[test]
    fn test_array_changes_one_element() {
        let mut value = [0u8; 8];
        let mut ctx = MutationContext::with_settings(
            RandomSource::new(9),
            0,
            1024,
            crate::config::MutationSettings {
                multi_field_probability: 0.0,
                ..Default::default()
            },
        );
        assert!(value.mutate(&mut ctx));
        assert_eq!(value.iter().filter(|b| **b != 0).count(), 1);
    }

    #[test]
    fn test_vec_splice() {
        let mut ctx = MutationContext::new(21, 1024, 1024);
        let other: Vec<u8> = vec![9, 9, 9];
        let mut seen_mixed = false;
        for _ in 0..100 {
            let mut value: Vec<u8> = vec![1, 1, 1];
            value.cross_over(&other, &mut ctx);
            seen_mixed |= value.contains(&1) && value.contains(&9);
            assert!(value.iter().all(|b| *b == 1 || *b == 9));
        }
        assert!(seen_mixed);
    }

    #[test]
    fn test_splice_respects_budget() {
        let mut ctx = MutationContext::new(4, 0, 1024);
        for _ in 0..100 {
            let mut value = String::from("ab");
            value.cross_over(&String::from("xyzxyz"), &mut ctx);
            assert!(value.len() <= 2);
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Color {
        Red,
        Green,
        Blue,
    }

    impl Enumeration for Color {
        const COUNT: usize = 3;

        fn ordinal(self) -> usize {
            self as usize
        }

        fn from_ordinal(ordinal: usize) -> Self {
            [Color::Red, Color::Green, Color::Blue][ordinal % Self::COUNT]
        }
    }

    #[test]
    fn test_set_toggles_one_member() {
        let mut ctx = MutationContext::new(8, 0, 1024);
        for _ in 0..100 {
            let mut set: EnumSet<Color> = [Color::Green].into_iter().collect();
            assert!(set.mutate(&mut ctx));
            let flipped = (set.bits() ^ 0b010).count_ones();
            assert_eq!(flipped, 1);
            assert_round_trips(&set);
        }
    }
}
