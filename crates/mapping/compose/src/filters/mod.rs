//! Shipped interceptors.

mod namespace;
mod object_override;
mod parameters;
mod static_init;

pub use namespace::NamespaceFilter;
pub use object_override::ObjectOverrideFilter;
pub use parameters::ParameterNameFilter;
pub use static_init::StaticInitializerFilter;
