pub mod chromosome;
pub mod contact;
pub mod kinds;

// re-export for cleaner imports
pub use self::chromosome::Chromosome;
pub use self::contact::ContactRecord;
pub use self::kinds::{MatrixType, Normalization, Unit};
