pub mod attachment;
pub mod config;
pub mod error;
pub mod form;
pub mod format;
pub mod list_view;
pub mod model;
pub mod profile;
pub mod registry;
pub mod statement;
pub mod store;

pub use attachment::Attachment;
pub use config::Config;
pub use error::{Error, Result};
pub use form::{FormController, FormState, Submission};
pub use format::MoneyFormat;
pub use list_view::ListView;
pub use model::{CompanySettings, EmployeeDetails, Expense, ExpenseId};
pub use registry::ExpenseRegistry;
pub use statement::{build_statement, deliver, Delivery, OutputMode, Statement, StatementRequest};
pub use store::Store;
