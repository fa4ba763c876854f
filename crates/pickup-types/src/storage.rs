//! Storage-related types for the pickup system.

/// Storage namespaces for the different record collections.
///
/// Keys are built as `<namespace>:<id>`. The `UsersBy*` namespaces are
/// uniqueness claims mapping a phone number or email to a user id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
	/// User records keyed by id.
	Users,
	/// Phone number claims.
	UsersByPhone,
	/// Email claims.
	UsersByEmail,
	/// Catalog products keyed by id.
	Products,
	/// Orders keyed by id.
	Orders,
}

impl StorageKey {
	/// Returns the string representation of the storage key.
	pub fn as_str(&self) -> &'static str {
		match self {
			StorageKey::Users => "users",
			StorageKey::UsersByPhone => "users_by_phone",
			StorageKey::UsersByEmail => "users_by_email",
			StorageKey::Products => "products",
			StorageKey::Orders => "orders",
		}
	}
}
