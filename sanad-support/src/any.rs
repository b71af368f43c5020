//! Upcasting helpers for trait objects that need to be viewed as [`Any`].

use std::any::Any;

/// Exposes a value as `dyn Any` so that a trait object built on top of
/// this trait can be downcast to its concrete type.
///
/// Blanket-implemented for every `'static` type. When calling through a
/// trait object, use the fully qualified form
/// (`<dyn MyTrait as AsAny>::as_any_mut(obj)`) so that method resolution
/// does not pick the implementation for the smart pointer itself.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Name of the concrete type behind the trait object.
    fn concrete_type_name(&self) -> &'static str;
}

impl<T: Any> AsAny for T {
    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline]
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    #[inline]
    fn concrete_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::any::TypeId;

    trait Shape: AsAny {
        fn sides(&self) -> u32;
    }

    struct Square;

    impl Shape for Square {
        fn sides(&self) -> u32 {
            4
        }
    }

    #[test]
    fn trait_object_reports_concrete_type() {
        let mut boxed: Box<dyn Shape> = Box::new(Square);
        assert_eq!(boxed.sides(), 4);

        let any = <dyn Shape as AsAny>::as_any_mut(boxed.as_mut());
        assert_eq!((*any).type_id(), TypeId::of::<Square>());
        assert!(any.downcast_mut::<Square>().is_some());
    }

    #[test]
    fn concrete_name_is_not_the_box() {
        let boxed: Box<dyn Shape> = Box::new(Square);
        let name = <dyn Shape as AsAny>::concrete_type_name(boxed.as_ref());
        assert!(name.ends_with("Square"));
    }
}
