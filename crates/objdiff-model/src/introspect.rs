//! Property discovery for bean types.
//!
//! An [`Introspector`] turns a bean type into an ordered set of
//! [`PropertyDescriptor`]s. The diff engine only consumes descriptors; how
//! they are produced (a registered schema, the instance's own property
//! table, hand-written closures) is up to the implementation.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::error::{AccessError, AccessResult};
use crate::types::ValueType;
use crate::value::Value;

/// Reads a property from a non-null target.
pub type Getter = Arc<dyn Fn(&Value) -> AccessResult<Value> + Send + Sync>;

/// Writes a property on a non-null target.
pub type Setter = Arc<dyn Fn(&Value, Value) -> AccessResult<()> + Send + Sync>;

/// Describes one property of a bean type.
#[derive(Clone)]
pub struct PropertyDescriptor {
    name: String,
    declared_type: Option<ValueType>,
    tags: BTreeSet<String>,
    getter: Getter,
    setter: Option<Setter>,
}

impl PropertyDescriptor {
    /// A read-only property backed by `getter`.
    pub fn new<F>(name: impl Into<String>, getter: F) -> Self
    where
        F: Fn(&Value) -> AccessResult<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            declared_type: None,
            tags: BTreeSet::new(),
            getter: Arc::new(getter),
            setter: None,
        }
    }

    /// A read-write property stored in the bean's own property table.
    pub fn bean_field(name: impl Into<String>) -> Self {
        let name = name.into();
        let read_name = name.clone();
        let write_name = name.clone();
        Self::new(name, move |target| match target {
            Value::Bean(bean) => Ok(bean.borrow().get(&read_name).cloned().unwrap_or_default()),
            other => Err(AccessError::PropertyRead {
                property: read_name.clone(),
                target_type: type_label(other),
                reason: "target is not a bean".into(),
            }),
        })
        .with_setter(move |target, value| match target {
            Value::Bean(bean) => {
                bean.borrow_mut().set(write_name.clone(), value);
                Ok(())
            }
            other => Err(AccessError::PropertyWrite {
                property: write_name.clone(),
                target_type: type_label(other),
                reason: "target is not a bean".into(),
            }),
        })
    }

    pub fn with_setter<F>(mut self, setter: F) -> Self
    where
        F: Fn(&Value, Value) -> AccessResult<()> + Send + Sync + 'static,
    {
        self.setter = Some(Arc::new(setter));
        self
    }

    /// Declares the static type of the property. A primitive declared type
    /// takes precedence over runtime types during type resolution.
    pub fn with_declared_type(mut self, declared_type: ValueType) -> Self {
        self.declared_type = Some(declared_type);
        self
    }

    /// Attaches a free-form tag (used for categories and inclusion rules).
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declared_type(&self) -> Option<&ValueType> {
        self.declared_type.as_ref()
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    pub fn is_writable(&self) -> bool {
        self.setter.is_some()
    }

    /// Reads the property. A null target yields null without invoking the
    /// getter.
    pub fn read(&self, target: &Value) -> AccessResult<Value> {
        if target.is_null() {
            return Ok(Value::Null);
        }
        (self.getter)(target)
    }

    /// Writes the property. Fails for null targets and read-only properties.
    pub fn write(&self, target: &Value, value: Value) -> AccessResult<()> {
        let Some(setter) = &self.setter else {
            return Err(AccessError::PropertyWrite {
                property: self.name.clone(),
                target_type: type_label(target),
                reason: "property is read-only".into(),
            });
        };
        if target.is_null() {
            return Err(AccessError::PropertyWrite {
                property: self.name.clone(),
                target_type: type_label(target),
                reason: "target is null".into(),
            });
        }
        setter(target, value)
    }
}

impl fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("name", &self.name)
            .field("declared_type", &self.declared_type)
            .field("tags", &self.tags)
            .field("writable", &self.is_writable())
            .finish()
    }
}

/// The ordered property set of a type.
#[derive(Clone, Debug)]
pub struct TypeInfo {
    value_type: ValueType,
    properties: Vec<PropertyDescriptor>,
}

impl TypeInfo {
    pub fn new(value_type: ValueType) -> Self {
        Self {
            value_type,
            properties: Vec::new(),
        }
    }

    pub fn with_property(mut self, property: PropertyDescriptor) -> Self {
        self.properties.push(property);
        self
    }

    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name() == name)
    }
}

/// Discovers the properties of a type.
///
/// `samples` are the non-null instances about to be compared; dynamic
/// implementations may derive the property set from them.
pub trait Introspector: Send + Sync {
    fn introspect(&self, value_type: &ValueType, samples: &[&Value]) -> AccessResult<TypeInfo>;
}

/// Registered schemas first, then the instances' own property tables.
#[derive(Clone, Debug, Default)]
pub struct DefaultIntrospector {
    schemas: HashMap<String, TypeInfo>,
}

impl DefaultIntrospector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the property set of a bean type. Non-bean schemas are
    /// ignored.
    pub fn register(&mut self, schema: TypeInfo) {
        if let Some(name) = schema.value_type().bean_name() {
            self.schemas.insert(name.to_string(), schema);
        }
    }

    pub fn with_schema(mut self, schema: TypeInfo) -> Self {
        self.register(schema);
        self
    }
}

impl Introspector for DefaultIntrospector {
    fn introspect(&self, value_type: &ValueType, samples: &[&Value]) -> AccessResult<TypeInfo> {
        let Some(name) = value_type.bean_name() else {
            return Ok(TypeInfo::new(value_type.clone()));
        };
        if let Some(schema) = self.schemas.get(name) {
            return Ok(schema.clone());
        }

        let mut seen = BTreeSet::new();
        let mut info = TypeInfo::new(value_type.clone());
        for sample in samples {
            if let Value::Bean(bean) = sample {
                for property in bean.borrow().property_names() {
                    if seen.insert(property.to_string()) {
                        info = info.with_property(PropertyDescriptor::bean_field(property));
                    }
                }
            }
        }
        Ok(info)
    }
}

fn type_label(value: &Value) -> String {
    value
        .value_type()
        .map(|t| t.to_string())
        .unwrap_or_else(|| "null".to_string())
}
