pub mod linear;
pub mod square;
pub mod error_function;
pub mod error_calculation;

pub use linear::LinearError;
pub use square::SquareError;
pub use error_function::ErrorFunction;
pub use error_calculation::{ErrorCalculation, ErrorMode};
