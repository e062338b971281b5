use std::any::Any;

/// Trait for type-erased values that can be cloned.
///
/// This trait combines `Any` with `Clone` capability, allowing values to be
/// cloned without knowing their concrete type at compile time.
pub(crate) trait CloneableAny: Any + Send {
    /// Clone the value into a new boxed trait object.
    fn clone_box(&self) -> Box<dyn CloneableAny>;

    /// Convert into a boxed `Any` for downcasting.
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send>;
}

impl<T> CloneableAny for T
where
    T: Clone + Send + 'static,
{
    fn clone_box(&self) -> Box<dyn CloneableAny> {
        Box::new(self.clone())
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct StashState {
        created: bool,
        label: String,
    }

    #[test]
    fn clone_box_creates_independent_copy() {
        let original: Box<dyn CloneableAny> = Box::new(StashState {
            created: true,
            label: "autostash".to_string(),
        });
        let cloned = original.clone_box();

        let original_value = original
            .into_any()
            .downcast::<StashState>()
            .expect("downcast to StashState");
        let cloned_value = cloned
            .into_any()
            .downcast::<StashState>()
            .expect("downcast to StashState");

        assert_eq!(*original_value, *cloned_value);
        assert!(cloned_value.created);
    }

    #[test]
    fn into_any_rejects_wrong_type() {
        let boxed: Box<dyn CloneableAny> = Box::new(Some("abc123".to_string()));

        let result = boxed.into_any().downcast::<String>();
        assert!(result.is_err());
    }
}
