use actorlib::TypeDescriptor;
use proptest::prelude::*;
use std::collections::BTreeMap;

/// Strategy for generating valid parameter names
pub fn field_name_strategy() -> impl Strategy<Value = String> {
    "[a-z_][a-z0-9_]{0,15}"
}

/// Strategy for generating scalar type descriptors
pub fn scalar_type_strategy() -> impl Strategy<Value = TypeDescriptor> {
    prop_oneof![
        Just(TypeDescriptor::Int),
        Just(TypeDescriptor::Float),
        Just(TypeDescriptor::Bool),
        Just(TypeDescriptor::Str),
        Just(TypeDescriptor::Any),
    ]
}

/// Strategy for generating nested type descriptors
pub fn type_descriptor_strategy() -> impl Strategy<Value = TypeDescriptor> {
    scalar_type_strategy().prop_recursive(3, 16, 4, |inner| {
        prop_oneof![
            inner.clone().prop_map(TypeDescriptor::list),
            inner.clone().prop_map(TypeDescriptor::optional),
            prop::collection::btree_map(field_name_strategy(), inner, 1..4)
                .prop_map(TypeDescriptor::dict),
        ]
    })
}

/// Strategy for generating distinct parameter declarations
pub fn param_set_strategy() -> impl Strategy<Value = BTreeMap<String, TypeDescriptor>> {
    prop::collection::btree_map(field_name_strategy(), scalar_type_strategy(), 0..6)
}

/// Strategy for generating handler symbols
pub fn symbol_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z_][a-zA-Z0-9_]{0,31}"
}
