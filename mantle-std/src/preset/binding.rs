use mantle_core::{BoxError, ManagedObject};

/// A live binding that a preset attaches to a property.
///
/// The binding engine decides how the value flows; the preset only tells it
/// which object and property to drive.
pub trait Binding: 'static {
    /// Bind to `property` of `target`.
    fn bind_to(&self, target: &ManagedObject, property: &str) -> Result<(), BoxError>;
}

impl<F> Binding for F
where
    F: Fn(&ManagedObject, &str) -> Result<(), BoxError> + 'static,
{
    fn bind_to(&self, target: &ManagedObject, property: &str) -> Result<(), BoxError> {
        self(target, property)
    }
}
