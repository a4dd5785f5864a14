use std::path::Path;

use tracing::info;

use crate::attachment::Attachment;
use crate::error::Result;
use crate::model::{CompanySettings, EmployeeDetails};
use crate::store::{Store, COMPANY_SETTINGS_KEY, EMPLOYEE_DETAILS_KEY};

pub fn load_company_settings(store: &Store) -> Result<CompanySettings> {
    store.load_or_default(COMPANY_SETTINGS_KEY)
}

pub fn load_employee_details(store: &Store) -> Result<EmployeeDetails> {
    store.load_or_default(EMPLOYEE_DETAILS_KEY)
}

/// Replaces the company settings. Without a new logo file the previous logo
/// is carried over.
pub fn save_company_settings(store: &Store, name: &str, logo_file: Option<&Path>) -> Result<CompanySettings> {
    let logo = match logo_file {
        Some(path) => Some(Attachment::from_file(path)?),
        None => load_company_settings(store)?.logo,
    };
    let settings = CompanySettings {
        name: name.trim().to_string(),
        logo,
    };
    store.save(COMPANY_SETTINGS_KEY, &settings)?;
    info!(has_logo = settings.logo.is_some(), "company settings saved");
    Ok(settings)
}

pub fn save_employee_details(store: &Store, details: &EmployeeDetails) -> Result<()> {
    store.save(EMPLOYEE_DETAILS_KEY, details)?;
    info!(emp_code = %details.emp_code, "employee details saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn company_logo_survives_name_only_save() {
        let dir = tempfile::tempdir().unwrap();
        let logo_path = dir.path().join("logo.png");
        std::fs::write(&logo_path, b"not really a png").unwrap();

        let store = Store::open_in_memory().unwrap();
        let first = save_company_settings(&store, "Acme", Some(&logo_path)).unwrap();
        assert_eq!(first.logo.as_ref().unwrap().mime(), "image/png");

        let second = save_company_settings(&store, " Acme Ltd ", None).unwrap();
        assert_eq!(second.name, "Acme Ltd");
        assert_eq!(second.logo, first.logo);
        assert_eq!(load_company_settings(&store).unwrap(), second);
    }

    #[test]
    fn employee_details_overwrite_wholesale() {
        let store = Store::open_in_memory().unwrap();
        let a = EmployeeDetails {
            emp_code: "E1".into(),
            emp_name: "Asha".into(),
            department: "Ops".into(),
            ..Default::default()
        };
        save_employee_details(&store, &a).unwrap();
        let b = EmployeeDetails {
            emp_code: "E2".into(),
            ..Default::default()
        };
        save_employee_details(&store, &b).unwrap();
        assert_eq!(load_employee_details(&store).unwrap(), b);
    }

    #[test]
    fn empty_store_yields_empty_profile() {
        let store = Store::open_in_memory().unwrap();
        assert_eq!(load_company_settings(&store).unwrap(), CompanySettings::default());
        assert_eq!(load_employee_details(&store).unwrap(), EmployeeDetails::default());
    }
}
