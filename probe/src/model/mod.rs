//! Data model shared by every component: type identities, declared types, values, objects and
//! entity records

mod entity;
mod object;
mod type_name;
mod value;
mod value_type;

pub use entity::{Capability, CapabilityId, Entity, EntityId};
pub use object::{Member, MemberKind, Object, ShaderChannels, ShaderProperty};
pub use type_name::{ModuleOrigin, TypeCategory, TypeDescriptor, TypeName};
pub use value::{ResourceHandle, Value};
pub use value_type::{EnumType, ValueType, VectorKind};
