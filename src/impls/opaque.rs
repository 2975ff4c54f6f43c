use crate::info::{NonGenericTypeInfoCell, OpaqueInfo, TypeInfo, Typed};
use crate::reflection::{Reflect, impl_reflect_cast_fn};

/// Implements [`Typed`] and [`Reflect`] for a scalar with `Default`,
/// `FromStr`, `Clone`, `PartialEq` and `Debug`.
macro_rules! impl_reflect_opaque {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Typed for $ty {
                fn type_info() -> &'static TypeInfo {
                    static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
                    CELL.get_or_init(|| {
                        TypeInfo::Opaque(
                            OpaqueInfo::new::<$ty>()
                                .with_default(|| Box::new(<$ty>::default()))
                                .with_from_text(|s| {
                                    s.parse::<$ty>()
                                        .ok()
                                        .map(|v| Box::new(v) as Box<dyn Reflect>)
                                }),
                        )
                    })
                }
            }

            impl Reflect for $ty {
                impl_reflect_cast_fn!(Opaque);

                #[inline]
                fn reflect_type_info(&self) -> &'static TypeInfo {
                    Self::type_info()
                }

                #[inline]
                fn reflect_clone(&self) -> Box<dyn Reflect> {
                    Box::new(self.clone())
                }

                fn reflect_partial_eq(&self, other: &dyn Reflect) -> Option<bool> {
                    other.downcast_ref::<Self>().map(|other| self == other)
                }

                fn reflect_debug(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                    core::fmt::Debug::fmt(self, f)
                }
            }
        )*
    };
}

impl_reflect_opaque!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, String,
);
