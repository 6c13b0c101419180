pub mod value;
pub mod parameter;
pub mod arm;
pub mod observation;
pub mod errors;

pub use value::*;
pub use parameter::*;
pub use arm::*;
pub use observation::*;
pub use errors::*;
