pub mod alert;
pub mod enums;
pub mod hospital;
pub mod patient;

pub use alert::*;
pub use enums::*;
pub use hospital::*;
pub use patient::*;
