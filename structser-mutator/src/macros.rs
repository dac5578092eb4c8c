//! Declaration macros that give a user type its encoding, default, equality and mutation.
//!
//! Each macro takes an ordinary type definition and implements [`Serializable`],
//! [`DefaultValue`], [`Equatable`] and [`Mutatable`] for it. Derives are left to the caller;
//! `Clone` is required. An optional trailing `post_process = path;` registers a hook of type
//! `fn(&mut T, &mut RandomSource)` that runs after the children have been post-processed.
//!
//! Every declaration also evaluates the type's nesting depth, so a type that contains itself
//! (directly or through sequences, options or other declared types) is rejected at compile
//! time with a cycle error.
//!
//! [`Serializable`]: structser::Serializable
//! [`DefaultValue`]: structser::DefaultValue
//! [`Equatable`]: structser::Equatable
//! [`Mutatable`]: crate::Mutatable
//! [`RandomSource`]: crate::RandomSource

/// Declares a product type: a struct whose named fields are encoded back to back in
/// declaration order.
///
/// ```
/// use structser_mutator::product;
///
/// product! {
///     #[derive(Debug, Clone, PartialEq)]
///     pub struct Header {
///         pub version: u8,
///         pub length: u32,
///         pub name: String,
///     }
/// }
/// ```
#[macro_export]
macro_rules! product {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $($(#[$field_meta:meta])* $field_vis:vis $field:ident : $ty:ty),* $(,)?
        }
        $(post_process = $hook:path;)?
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $($(#[$field_meta])* $field_vis $field: $ty),*
        }

        const _: usize = <$name as $crate::structser::Serializable>::NESTING_DEPTH;

        #[allow(unused_variables)]
        impl $crate::structser::Serializable for $name {
            const NESTING_DEPTH: usize = 1 + $crate::structser::deepest(&[
                $(<$ty as $crate::structser::Serializable>::NESTING_DEPTH),*
            ]);

            fn decode(reader: &mut $crate::structser::Reader<'_>) -> Self {
                Self {
                    $($field: <$ty as $crate::structser::Serializable>::decode(reader)),*
                }
            }

            fn encode(&self, out: &mut Vec<u8>) {
                $($crate::structser::Serializable::encode(&self.$field, out);)*
            }

            fn encoded_size(&self) -> usize {
                0 $(+ $crate::structser::Serializable::encoded_size(&self.$field))*
            }
        }

        impl $crate::structser::DefaultValue for $name {
            fn default_value() -> Self {
                Self {
                    $($field: <$ty as $crate::structser::DefaultValue>::default_value()),*
                }
            }
        }

        #[allow(unused_variables)]
        impl $crate::structser::Equatable for $name {
            fn equals(&self, other: &Self) -> bool {
                true $(&& $crate::structser::Equatable::equals(&self.$field, &other.$field))*
            }
        }

        #[allow(unused_mut, unused_assignments, unused_variables)]
        impl $crate::Mutatable for $name {
            fn mutate(&mut self, ctx: &mut $crate::MutationContext) -> bool {
                let count = <[&str]>::len(&[$(stringify!($field)),*]);
                $crate::mutate_fields(ctx, count, |index, ctx| {
                    let mut position = 0;
                    $(
                        if index == position {
                            return $crate::Mutatable::mutate(&mut self.$field, ctx);
                        }
                        position += 1;
                    )*
                    false
                })
            }

            fn post_process(&mut self, rand: &mut $crate::RandomSource) {
                $($crate::Mutatable::post_process(&mut self.$field, rand);)*
                $($hook(self, rand);)?
            }

            fn cross_over(&mut self, other: &Self, ctx: &mut $crate::MutationContext) -> bool {
                let count = <[&str]>::len(&[$(stringify!($field)),*]);
                $crate::cross_fields(ctx, count, |index, ctx| {
                    let mut position = 0;
                    $(
                        if index == position {
                            return $crate::Mutatable::cross_over(
                                &mut self.$field,
                                &other.$field,
                                ctx,
                            );
                        }
                        position += 1;
                    )*
                    false
                })
            }
        }
    };
}

/// Declares a sum type: an enum whose variants each carry named fields.
///
/// Variants are written with braces, `Empty {}` for a variant without payload. On the wire
/// the value is a one-byte tag (reduced modulo the variant count) followed by the variant's
/// fields in declaration order. The first variant is the default.
///
/// ```
/// use structser_mutator::sum;
///
/// sum! {
///     #[derive(Debug, Clone, PartialEq)]
///     pub enum Command {
///         Ping {},
///         Write { offset: u32, data: Vec<u8> },
///     }
/// }
/// ```
#[macro_export]
macro_rules! sum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident { $($field:ident : $ty:ty),* $(,)? }
            ),+ $(,)?
        }
        $(post_process = $hook:path;)?
    ) => {
        $(#[$meta])*
        $vis enum $name {
            $($(#[$variant_meta])* $variant { $($field: $ty),* }),+
        }

        const _: () = assert!(
            <[&str]>::len(&[$(stringify!($variant)),+]) <= 256,
            "a sum type has at most 256 variants"
        );

        const _: usize = <$name as $crate::structser::Serializable>::NESTING_DEPTH;

        #[allow(unused_mut, unused_assignments, unused_variables)]
        impl $crate::structser::Serializable for $name {
            const NESTING_DEPTH: usize = 1 + $crate::structser::deepest(&[
                $(1 + $crate::structser::deepest(&[
                    $(<$ty as $crate::structser::Serializable>::NESTING_DEPTH),*
                ])),+
            ]);

            fn decode(reader: &mut $crate::structser::Reader<'_>) -> Self {
                let tag = reader.read_u8() as usize
                    % <Self as $crate::SumType>::VARIANT_COUNT;
                let mut position = 0;
                $(
                    if tag == position {
                        return $name::$variant {
                            $($field: <$ty as $crate::structser::Serializable>::decode(reader)),*
                        };
                    }
                    position += 1;
                )+
                <Self as $crate::SumType>::variant_default(0)
            }

            fn encode(&self, out: &mut Vec<u8>) {
                out.push(<Self as $crate::SumType>::variant_index(self) as u8);
                match self {
                    $($name::$variant { $($field),* } => {
                        $($crate::structser::Serializable::encode($field, out);)*
                    })+
                }
            }

            fn encoded_size(&self) -> usize {
                1 + match self {
                    $($name::$variant { $($field),* } => {
                        0 $(+ $crate::structser::Serializable::encoded_size($field))*
                    })+
                }
            }
        }

        impl $crate::structser::DefaultValue for $name {
            fn default_value() -> Self {
                <Self as $crate::SumType>::variant_default(0)
            }
        }

        impl $crate::structser::Equatable for $name {
            fn equals(&self, other: &Self) -> bool {
                $(
                    if let $name::$variant { $($field),* } = self {
                        let mine = ($($field,)*);
                        if let $name::$variant { $($field),* } = other {
                            return $crate::structser::Equatable::equals(&mine, &($($field,)*));
                        }
                        return false;
                    }
                )+
                false
            }
        }

        #[allow(unused_mut, unused_assignments, unused_variables)]
        impl $crate::SumType for $name {
            const VARIANT_COUNT: usize = <[&str]>::len(&[$(stringify!($variant)),+]);

            fn variant_index(&self) -> usize {
                let mut position = 0;
                $(
                    if let $name::$variant { .. } = self {
                        return position;
                    }
                    position += 1;
                )+
                position
            }

            fn variant_default(index: usize) -> Self {
                let mut position = 0;
                $(
                    if index == position {
                        return $name::$variant {
                            $($field: <$ty as $crate::structser::DefaultValue>::default_value()),*
                        };
                    }
                    position += 1;
                )+
                Self::variant_default(0)
            }

            fn mutate_payload(&mut self, ctx: &mut $crate::MutationContext) -> bool {
                match self {
                    $($name::$variant { $($field),* } => {
                        let count = <[&str]>::len(&[$(stringify!($field)),*]);
                        $crate::mutate_fields(ctx, count, |index, ctx| {
                            let mut position = 0;
                            $(
                                if index == position {
                                    return $crate::Mutatable::mutate(&mut *$field, ctx);
                                }
                                position += 1;
                            )*
                            false
                        })
                    })+
                }
            }
        }

        #[allow(unused_mut, unused_assignments, unused_variables)]
        impl $crate::Mutatable for $name {
            fn mutate(&mut self, ctx: &mut $crate::MutationContext) -> bool {
                $crate::mutate_sum(self, ctx)
            }

            fn post_process(&mut self, rand: &mut $crate::RandomSource) {
                match self {
                    $($name::$variant { $($field),* } => {
                        $($crate::Mutatable::post_process($field, rand);)*
                    })+
                }
                $($hook(self, rand);)?
            }

            fn cross_over(&mut self, other: &Self, ctx: &mut $crate::MutationContext) -> bool {
                if <Self as $crate::SumType>::variant_index(self)
                    != <Self as $crate::SumType>::variant_index(other)
                {
                    return $crate::adopt(self, other, ctx);
                }
                match self {
                    $($name::$variant { $($field),* } => {
                        let count = <[&str]>::len(&[$(stringify!($field)),*]);
                        $crate::cross_fields(ctx, count, |index, ctx| {
                            let mut position = 0;
                            $(
                                if index == position {
                                    if let $name::$variant { $field: theirs, .. } = other {
                                        return $crate::Mutatable::cross_over(
                                            &mut *$field,
                                            theirs,
                                            ctx,
                                        );
                                    }
                                }
                                position += 1;
                            )*
                            false
                        })
                    })+
                }
            }
        }
    };
}

/// Declares a fieldless enumeration, usable on its own as a sum type and as the member
/// type of an [`EnumSet`](structser::EnumSet). Enumerations are limited to 64 members and
/// must derive `Clone` and `Copy`.
///
/// ```
/// use structser_mutator::enumeration;
///
/// enumeration! {
///     #[derive(Debug, Clone, Copy, PartialEq)]
///     pub enum Permission { Read, Write, Execute }
/// }
/// ```
#[macro_export]
macro_rules! enumeration {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($(#[$variant_meta:meta])* $variant:ident),+ $(,)?
        }
        $(post_process = $hook:path;)?
    ) => {
        $(#[$meta])*
        $vis enum $name {
            $($(#[$variant_meta])* $variant),+
        }

        const _: () = assert!(
            <[&str]>::len(&[$(stringify!($variant)),+]) <= 64,
            "an enumeration has at most 64 members"
        );

        impl $crate::structser::Enumeration for $name {
            const COUNT: usize = <[&str]>::len(&[$(stringify!($variant)),+]);

            fn ordinal(self) -> usize {
                self as usize
            }

            fn from_ordinal(ordinal: usize) -> Self {
                const MEMBERS: &[$name] = &[$($name::$variant),+];
                MEMBERS[ordinal % MEMBERS.len()]
            }
        }

        impl $crate::structser::Serializable for $name {
            const NESTING_DEPTH: usize = 1;

            fn decode(reader: &mut $crate::structser::Reader<'_>) -> Self {
                <Self as $crate::structser::Enumeration>::from_ordinal(reader.read_u8() as usize)
            }

            fn encode(&self, out: &mut Vec<u8>) {
                out.push(<Self as $crate::structser::Enumeration>::ordinal(*self) as u8);
            }

            fn encoded_size(&self) -> usize {
                1
            }
        }

        impl $crate::structser::DefaultValue for $name {
            fn default_value() -> Self {
                <Self as $crate::structser::Enumeration>::from_ordinal(0)
            }
        }

        impl $crate::structser::Equatable for $name {
            fn equals(&self, other: &Self) -> bool {
                <Self as $crate::structser::Enumeration>::ordinal(*self)
                    == <Self as $crate::structser::Enumeration>::ordinal(*other)
            }
        }

        impl $crate::SumType for $name {
            const VARIANT_COUNT: usize = <Self as $crate::structser::Enumeration>::COUNT;

            fn variant_index(&self) -> usize {
                <Self as $crate::structser::Enumeration>::ordinal(*self)
            }

            fn variant_default(index: usize) -> Self {
                <Self as $crate::structser::Enumeration>::from_ordinal(index)
            }

            fn mutate_payload(&mut self, _ctx: &mut $crate::MutationContext) -> bool {
                false
            }
        }

        impl $crate::Mutatable for $name {
            // Members carry no payload, so the only mutation is picking another member
            fn mutate(&mut self, ctx: &mut $crate::MutationContext) -> bool {
                $crate::switch_variant(self, ctx)
            }

            fn post_process(&mut self, rand: &mut $crate::RandomSource) {
                $($hook(self, rand);)?
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use structser::{decode, encode, DefaultValue, EnumSet, Enumeration, Equatable, Serializable};

    use crate::{MutationContext, Mutatable, RandomSource, SumType};

    product! {
        #[derive(Debug, Clone, PartialEq)]
        struct Pair {
            a: i32,
            b: bool,
        }
    }

    product! {
        #[derive(Debug, Clone, PartialEq)]
        struct Empty {}
    }

    sum! {
        #[derive(Debug, Clone, PartialEq)]
        enum Shape {
            Point {},
            Circle { radius: u16 },
            Polygon { sides: Vec<(i8, i8)>, closed: bool },
        }
    }

    enumeration! {
        #[derive(Debug, Clone, Copy, PartialEq)]
        enum Level { Low, Mid, High }
    }

    fn force_probe(packet: &mut Probe, _rand: &mut RandomSource) {
        if packet.kind == Level::High {
            packet.label = String::from("probe");
        }
    }

    product! {
        #[derive(Debug, Clone, PartialEq)]
        struct Probe {
            kind: Level,
            label: String,
            levels: EnumSet<Level>,
        }
        post_process = force_probe;
    }

    #[test]
    fn test_product_partial_fill() {
        let value: Pair = decode(&[0xFF, 0x00]);
        assert_eq!(value, Pair { a: 255, b: false });
        assert_eq!(encode(&value), vec![0xFF, 0x00, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_product_layout() {
        let value = Pair { a: -1, b: true };
        assert_eq!(encode(&value), vec![0xFF, 0xFF, 0xFF, 0xFF, 0x01]);
        assert_eq!(value.encoded_size(), 5);
        assert_eq!(<Pair as Serializable>::NESTING_DEPTH, 2);
    }

    #[test]
    fn test_empty_product() {
        let mut value = Empty::default_value();
        assert_eq!(value.encoded_size(), 0);
        let mut ctx = MutationContext::new(0, 100, 100);
        assert!(!value.mutate(&mut ctx));
        assert!(value.equals(&Empty {}));
    }

    #[test]
    fn test_sum_tag_modulo() {
        // Tag 4 selects variant 4 % 3 == 1
        let value: Shape = decode(&[0x04, 0x2A, 0x00]);
        assert_eq!(value, Shape::Circle { radius: 42 });
        assert_eq!(encode(&value), vec![0x01, 0x2A, 0x00]);
        assert_eq!(<Shape as SumType>::VARIANT_COUNT, 3);
    }

    #[test]
    fn test_sum_default_and_empty_decode() {
        assert_eq!(Shape::default_value(), Shape::Point {});
        assert_eq!(decode::<Shape>(&[]), Shape::Point {});
        assert_eq!(
            Shape::variant_default(2),
            Shape::Polygon {
                sides: vec![],
                closed: false
            }
        );
    }

    #[test]
    fn test_sum_equality() {
        let a = Shape::Polygon {
            sides: vec![(1, 2)],
            closed: true,
        };
        assert!(a.equals(&a.clone()));
        assert!(!a.equals(&Shape::Polygon {
            sides: vec![(1, 2)],
            closed: false
        }));
        assert!(!Shape::Circle { radius: 0 }.equals(&Shape::Point {}));
    }

    #[test]
    fn test_sum_variant_coverage() {
        let mut value = Shape::Point {};
        let mut ctx = MutationContext::new(17, 1 << 16, 1 << 16);
        let mut seen = [false; 3];
        for _ in 0..10_000 {
            value.mutate(&mut ctx);
            seen[value.variant_index()] = true;
        }
        assert_eq!(seen, [true, true, true]);
    }

    #[test]
    fn test_enumeration() {
        assert_eq!(<Level as Enumeration>::COUNT, 3);
        assert_eq!(decode::<Level>(&[0x05]), Level::High);
        assert_eq!(Level::default_value(), Level::Low);

        let mut ctx = MutationContext::new(3, 0, 0);
        for _ in 0..100 {
            let mut level = Level::Mid;
            assert!(level.mutate(&mut ctx));
            assert_ne!(level, Level::Mid);
        }
    }

    #[test]
    fn test_post_process_hook_runs() {
        let mut value = Probe {
            kind: Level::High,
            label: String::from("x"),
            levels: EnumSet::new(),
        };
        let mut rand = RandomSource::new(0);
        value.post_process(&mut rand);
        assert_eq!(value.label, "probe");
    }

    #[test]
    fn test_sum_cross_over_same_variant() {
        let mut ctx = MutationContext::new(2, 1024, 1024);
        let other = Shape::Polygon {
            sides: vec![(5, 5)],
            closed: true,
        };
        let mut crossed = false;
        for _ in 0..50 {
            let mut value = Shape::Polygon {
                sides: vec![],
                closed: false,
            };
            crossed |= value.cross_over(&other, &mut ctx);
            assert_eq!(value.variant_index(), 2);
        }
        assert!(crossed);
    }
}
