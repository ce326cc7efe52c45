use std::fs;
use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriod {
    Monthly,
    Yearly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBudget {
    pub amount: Decimal,
    pub period: BudgetPeriod,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subcategory {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub budget: Option<CategoryBudget>,
    #[serde(default)]
    pub tax_deductible: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub subcategories: Vec<Subcategory>,
    #[serde(default)]
    pub budget: Option<CategoryBudget>,
    #[serde(default)]
    pub tax_deductible: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoriesConfig {
    pub categories: Vec<Category>,
}

impl CategoriesConfig {
    /// Loads and validates `config/categories.yml`. Rejects any
    /// category or subcategory name containing `:`, since that
    /// character is reserved to separate category and subcategory in
    /// downstream reporting (e.g. `Housing:Utilities`).
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        let config: CategoriesConfig = serde_yaml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for category in &self.categories {
            if category.name.contains(':') {
                return Err(ConfigError::Validation(format!(
                    "category name `{}` must not contain ':'",
                    category.name
                )));
            }
            for sub in &category.subcategories {
                if sub.name.contains(':') {
                    return Err(ConfigError::Validation(format!(
                        "subcategory name `{}` must not contain ':'",
                        sub.name
                    )));
                }
            }
        }
        Ok(())
    }

    /// All categories (and their subcategories, qualified as
    /// `Category:Subcategory`) that carry a `budget`.
    pub fn budgeted(&self) -> Vec<(String, CategoryBudget)> {
        let mut out = Vec::new();
        for category in &self.categories {
            if let Some(budget) = &category.budget {
                out.push((category.name.clone(), budget.clone()));
            }
            for sub in &category.subcategories {
                if let Some(budget) = &sub.budget {
                    out.push((format!("{}:{}", category.name, sub.name), budget.clone()));
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn loads_valid_categories() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "categories:\n  - name: Housing\n    subcategories:\n      - name: Utilities\n        budget:\n          amount: \"150.00\"\n          period: monthly\n"
        )
        .unwrap();
        let config = CategoriesConfig::load(file.path()).unwrap();
        assert_eq!(config.categories.len(), 1);
        assert_eq!(config.budgeted().len(), 1);
        assert_eq!(config.budgeted()[0].0, "Housing:Utilities");
    }

    #[test]
    fn rejects_colon_in_name() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "categories:\n  - name: \"Housing:Rent\"\n").unwrap();
        let err = CategoriesConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }
}
