// Adapters layer: concrete invoice sources behind the `InvoiceSource` port.

pub mod file;
pub mod suiteql;

pub use file::JsonFileSource;
pub use suiteql::SuiteQlSource;
