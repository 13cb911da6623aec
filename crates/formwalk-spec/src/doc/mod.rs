pub mod field;
pub mod form;
pub mod logic;

pub use field::{FieldDoc, FieldType, ValidationRules};
pub use form::{FormDoc, FormSettings, GroupDoc};
pub use logic::{Condition, ConditionOperator, ConditionalLogic};
