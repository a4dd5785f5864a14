use std::path::PathBuf;

use tracing::info;

use crate::attachment::Attachment;
use crate::error::{Error, Result};
use crate::format::parse_ymd;
use crate::model::{Expense, ExpenseId};
use crate::registry::ExpenseRegistry;

pub const ADD_LABEL: &str = "Add Expense";
pub const UPDATE_LABEL: &str = "Update Expense";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormState {
    Idle,
    Editing(ExpenseId),
}

/// Raw field values, as typed by the user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseForm {
    pub date: String,
    pub category: String,
    pub amount: String,
    pub details: String,
    /// Newly chosen file; read only when the form is submitted.
    pub attachment_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentPreview {
    pub mime: String,
    pub kind: &'static str,
}

impl AttachmentPreview {
    fn of(a: &Attachment) -> Self {
        Self {
            mime: a.mime(),
            kind: a.kind_label(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    Created(ExpenseId),
    Updated(ExpenseId),
}

#[derive(Debug)]
pub struct FormController {
    state: FormState,
    pub fields: ExpenseForm,
    preview: Option<AttachmentPreview>,
}

impl Default for FormController {
    fn default() -> Self {
        Self::new()
    }
}

impl FormController {
    pub fn new() -> Self {
        Self {
            state: FormState::Idle,
            fields: ExpenseForm::default(),
            preview: None,
        }
    }

    pub fn state(&self) -> FormState {
        self.state
    }

    pub fn submit_label(&self) -> &'static str {
        match self.state {
            FormState::Idle => ADD_LABEL,
            FormState::Editing(_) => UPDATE_LABEL,
        }
    }

    pub fn preview(&self) -> Option<&AttachmentPreview> {
        self.preview.as_ref()
    }

    pub fn begin_edit(&mut self, registry: &ExpenseRegistry<'_>, id: ExpenseId) -> Result<Option<&AttachmentPreview>> {
        let expense = registry.get(&id).ok_or_else(|| Error::not_found(&id))?;
        self.fields = ExpenseForm {
            date: expense.date.clone(),
            category: expense.category.clone(),
            amount: expense.amount.to_string(),
            details: expense.details.clone(),
            attachment_file: None,
        };
        self.preview = expense.attachment.as_ref().map(AttachmentPreview::of);
        self.state = FormState::Editing(id);
        Ok(self.preview.as_ref())
    }

    pub fn cancel(&mut self) {
        self.reset();
    }

    /// Drops the attachment of the record being edited right away, without
    /// waiting for the form to be submitted.
    pub fn remove_attachment(&mut self, registry: &mut ExpenseRegistry<'_>) -> Result<bool> {
        let FormState::Editing(id) = self.state else {
            return Ok(false);
        };
        self.preview = None;
        registry.clear_attachment(&id)
    }

    pub fn submit(&mut self, registry: &mut ExpenseRegistry<'_>) -> Result<Submission> {
        let (date, amount) = self.validate()?;

        let chosen = match self.fields.attachment_file.as_deref() {
            Some(path) => Some(Attachment::from_file(path)?),
            None => None,
        };

        let submission = match self.state {
            FormState::Idle => {
                let record = self.build_record(date, amount, chosen);
                let id = registry.append(record)?;
                info!(%id, "expense added");
                Submission::Created(id)
            }
            FormState::Editing(id) => {
                let existing = registry.get(&id).ok_or_else(|| Error::not_found(&id))?;
                let attachment = chosen.or_else(|| existing.attachment.clone());
                let record = self.build_record(date, amount, attachment);
                registry.replace(&id, record)?;
                info!(%id, "expense updated");
                Submission::Updated(id)
            }
        };

        self.reset();
        Ok(submission)
    }

    fn validate(&self) -> Result<(String, f64)> {
        let date = self.fields.date.trim();
        if parse_ymd(date).is_none() {
            return Err(Error::Validation(format!("Date must be YYYY-MM-DD, got {date:?}.")));
        }
        let amount: f64 = self
            .fields
            .amount
            .trim()
            .parse()
            .map_err(|_| Error::Validation(format!("Amount must be a number, got {:?}.", self.fields.amount)))?;
        if !amount.is_finite() || amount < 0.0 {
            return Err(Error::Validation("Amount must be zero or greater.".to_string()));
        }
        Ok((date.to_string(), amount))
    }

    fn build_record(&self, date: String, amount: f64, attachment: Option<Attachment>) -> Expense {
        Expense {
            id: ExpenseId::default(),
            date,
            category: self.fields.category.trim().to_string(),
            amount,
            details: self.fields.details.trim().to_string(),
            attachment,
        }
    }

    fn reset(&mut self) {
        self.state = FormState::Idle;
        self.fields = ExpenseForm::default();
        self.preview = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Store, EXPENSES_KEY};

    fn fill(form: &mut FormController, date: &str, amount: &str, details: &str) {
        form.fields.date = date.to_string();
        form.fields.category = "Meals".to_string();
        form.fields.amount = amount.to_string();
        form.fields.details = details.to_string();
    }

    #[test]
    fn idle_submit_appends_one_record() {
        let store = Store::open_in_memory().unwrap();
        let mut reg = ExpenseRegistry::load(&store).unwrap();
        let mut form = FormController::new();
        assert_eq!(form.submit_label(), ADD_LABEL);

        fill(&mut form, "2024-06-01", "99.5", "Team lunch");
        let res = form.submit(&mut reg).unwrap();

        assert!(matches!(res, Submission::Created(_)));
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.expenses()[0].amount, 99.5);
        assert_eq!(form.fields, ExpenseForm::default());
    }

    #[test]
    fn editing_submit_overwrites_only_that_record() {
        let store = Store::open_in_memory().unwrap();
        let mut reg = ExpenseRegistry::load(&store).unwrap();
        let mut form = FormController::new();
        for d in ["a", "b", "c"] {
            fill(&mut form, "2024-06-01", "10", d);
            form.submit(&mut reg).unwrap();
        }
        let target = reg.id_at(2).unwrap();

        form.begin_edit(&reg, target).unwrap();
        assert_eq!(form.state(), FormState::Editing(target));
        assert_eq!(form.submit_label(), UPDATE_LABEL);
        assert_eq!(form.fields.details, "b");

        form.fields.amount = "12.25".to_string();
        let res = form.submit(&mut reg).unwrap();

        assert_eq!(res, Submission::Updated(target));
        assert_eq!(reg.len(), 3);
        assert_eq!(reg.expenses()[1].amount, 12.25);
        assert_eq!(reg.expenses()[0].amount, 10.0);
        assert_eq!(reg.expenses()[2].amount, 10.0);
        assert_eq!(form.state(), FormState::Idle);
    }

    #[test]
    fn edit_without_new_file_keeps_existing_attachment() {
        let store = Store::open_in_memory().unwrap();
        let mut reg = ExpenseRegistry::load(&store).unwrap();
        let receipt = Attachment::from_bytes("image/jpeg", b"jpeg");
        let id = reg
            .append(Expense {
                id: ExpenseId::default(),
                date: "2024-06-02".into(),
                category: "Travel".into(),
                amount: 40.0,
                details: "Taxi".into(),
                attachment: Some(receipt.clone()),
            })
            .unwrap();

        let mut form = FormController::new();
        let preview = form.begin_edit(&reg, id).unwrap().cloned();
        assert_eq!(preview.unwrap().mime, "image/jpeg");

        form.fields.details = "Taxi to airport".into();
        form.submit(&mut reg).unwrap();
        assert_eq!(reg.get(&id).unwrap().attachment.as_ref(), Some(&receipt));
    }

    #[test]
    fn removing_attachment_persists_before_submit() {
        let store = Store::open_in_memory().unwrap();
        let mut reg = ExpenseRegistry::load(&store).unwrap();
        let id = reg
            .append(Expense {
                id: ExpenseId::default(),
                date: "2024-06-02".into(),
                category: "Travel".into(),
                amount: 40.0,
                details: "Taxi".into(),
                attachment: Some(Attachment::from_bytes("application/pdf", b"%PDF")),
            })
            .unwrap();

        let mut form = FormController::new();
        form.begin_edit(&reg, id).unwrap();
        assert!(form.remove_attachment(&mut reg).unwrap());
        assert!(form.preview().is_none());

        let stored: Vec<Expense> = store.load_or_default(EXPENSES_KEY).unwrap();
        assert!(stored[0].attachment.is_none());

        // Cancelling afterwards does not bring it back.
        form.cancel();
        assert!(reg.get(&id).unwrap().attachment.is_none());
        assert_eq!(form.state(), FormState::Idle);
    }

    #[test]
    fn remove_attachment_while_idle_is_noop() {
        let store = Store::open_in_memory().unwrap();
        let mut reg = ExpenseRegistry::load(&store).unwrap();
        let mut form = FormController::new();
        assert!(!form.remove_attachment(&mut reg).unwrap());
    }

    #[test]
    fn new_file_attachment_is_read_on_submit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bill.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();

        let store = Store::open_in_memory().unwrap();
        let mut reg = ExpenseRegistry::load(&store).unwrap();
        let mut form = FormController::new();
        fill(&mut form, "2024-06-03", "5", "Parking");
        form.fields.attachment_file = Some(path);
        form.submit(&mut reg).unwrap();

        let a = reg.expenses()[0].attachment.as_ref().unwrap();
        assert_eq!(a.mime(), "application/pdf");
        assert_eq!(a.decode().unwrap(), b"%PDF-1.4");
    }

    #[test]
    fn unreadable_file_leaves_registry_untouched() {
        let store = Store::open_in_memory().unwrap();
        let mut reg = ExpenseRegistry::load(&store).unwrap();
        let mut form = FormController::new();
        fill(&mut form, "2024-06-03", "5", "Parking");
        form.fields.attachment_file = Some(PathBuf::from("/no/such/receipt.png"));

        assert!(matches!(form.submit(&mut reg), Err(Error::Attachment(_))));
        assert!(reg.is_empty());
        assert_eq!(form.fields.details, "Parking");
    }

    #[test]
    fn invalid_fields_are_rejected() {
        let store = Store::open_in_memory().unwrap();
        let mut reg = ExpenseRegistry::load(&store).unwrap();
        let mut form = FormController::new();

        fill(&mut form, "2024-06-03", "abc", "x");
        assert!(matches!(form.submit(&mut reg), Err(Error::Validation(_))));
        fill(&mut form, "2024-06-03", "-1", "x");
        assert!(matches!(form.submit(&mut reg), Err(Error::Validation(_))));
        fill(&mut form, "03/06/2024", "1", "x");
        assert!(matches!(form.submit(&mut reg), Err(Error::Validation(_))));
        fill(&mut form, "2024-06-03", "0", "free sample");
        assert!(form.submit(&mut reg).is_ok());
        assert_eq!(reg.len(), 1);
    }
}
