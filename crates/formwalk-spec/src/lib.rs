#![allow(missing_docs)]

pub mod doc;
pub mod normalize;
pub mod registry;
pub mod response;
pub mod schema;
pub mod validate;
pub mod value;
pub mod visibility;

pub use doc::{
    Condition, ConditionOperator, ConditionalLogic, FieldDoc, FieldType, FormDoc, FormSettings,
    GroupDoc, ValidationRules,
};
pub use normalize::{Field, Form, NavigationMode, SchemaError, Scope, normalize};
pub use registry::{TypeProfile, ValueShape, defaults_for};
pub use response::{Meta, ResponseSet};
pub use schema::{answers_schema, document_schema};
pub use validate::{
    ErrorKind, ValidationError, ValidationReport, is_blank, validate_all, validate_field,
    validate_many,
};
pub use value::{FieldValue, ValueMap};
pub use visibility::{VisibilityMap, is_visible, resolve_visibility};
