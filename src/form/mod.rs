//! Form generation engine - derives controls, defaults, validation and
//! request values from an endpoint's parameter list

pub mod controls;
pub mod pairing;
pub mod session;
pub mod validate;

pub use controls::{select_control, ControlDescriptor};
pub use pairing::{derive_pairs, pair_key, RangePair};
pub use session::{FormItem, FormSession};
pub use validate::{synthesize_values, validate_form, ParamValue};
