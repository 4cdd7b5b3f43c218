//! Dynamic object model for objdiff.
//!
//! The diff engine compares object graphs built from [`Value`]s. This crate
//! defines those values, their runtime [`ValueType`]s, and the
//! [`Introspector`] capability that exposes a bean type's properties.
//!
//! # Key Types
//!
//! - [`Value`] -- Any node of an object graph (scalars, arrays, collections, maps, beans)
//! - [`ValueType`] -- Runtime type classification used for differ dispatch
//! - [`Bean`] / [`BeanEquality`] -- Named property tables and their equality semantics
//! - [`Collection`] / [`Map`] / [`Array`] -- Container payloads
//! - [`PropertyDescriptor`] / [`TypeInfo`] / [`Introspector`] -- Property discovery

pub mod bean;
pub mod container;
pub mod error;
pub mod introspect;
mod reentry;
pub mod types;
pub mod value;

pub use bean::{Bean, BeanEquality};
pub use container::{Array, Collection, Map};
pub use error::{AccessError, AccessResult};
pub use introspect::{DefaultIntrospector, Getter, Introspector, PropertyDescriptor, Setter, TypeInfo};
pub use types::{ArrayKind, CollectionKind, MapKind, PrimitiveKind, ValueType};
pub use value::{ArrayRef, BeanRef, CollectionRef, MapRef, Primitive, Shared, Value};
