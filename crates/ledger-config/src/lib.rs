//! ledger-config
//!
//! Workspace path layout and category/budget configuration. Reads
//! `config/categories.yml`; carries no business logic.

pub mod categories;
pub mod error;
pub mod model;
pub mod paths;

pub use categories::{BudgetPeriod, CategoriesConfig, Category, CategoryBudget, Subcategory};
pub use error::ConfigError;
pub use model::Config;
pub use paths::WorkspaceLayout;
