mod access;
mod events;
mod identity;
mod profile;

pub use access::{AccessItem, Account, Entitlement};
pub use events::{AuditEvent, ChangeType, IdentityEvent};
pub use identity::{Identity, Reference};
pub use profile::{
    AttributeMapping, AttributeTransform, IdentityAttributeConfig, IdentityProfile,
    TransformDefinition,
};

use serde::{Deserialize, Deserializer};

/// Treats an explicit `null` like an absent field.
fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
