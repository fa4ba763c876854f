//! Registry trait for self-registering implementations.
//!
//! Pluggable backends (currently storage) implement this trait to declare the
//! name they are configured under and the factory that builds them.

/// Base trait for implementation registries.
pub trait ImplementationRegistry {
	/// The name used in configuration files to reference this implementation,
	/// for example `"memory"` for `[storage.implementations.memory]`.
	const NAME: &'static str;

	/// The factory function type this implementation provides.
	type Factory;

	/// Get the factory function for this implementation.
	fn factory() -> Self::Factory;
}
