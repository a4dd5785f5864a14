use tracing::info;

use crate::error::{Error, Result};
use crate::model::{Expense, ExpenseId};
use crate::store::{Store, EXPENSES_KEY};

type ChangeListener<'s> = Box<dyn FnMut(&[Expense]) + 's>;

/// Ordered expense list with write-through persistence. Every mutation
/// rewrites the whole `expenses` value and then notifies the listener.
pub struct ExpenseRegistry<'s> {
    store: &'s Store,
    expenses: Vec<Expense>,
    on_change: Option<ChangeListener<'s>>,
}

impl<'s> ExpenseRegistry<'s> {
    pub fn load(store: &'s Store) -> Result<Self> {
        let mut expenses: Vec<Expense> = store.load_or_default(EXPENSES_KEY)?;

        let mut rekeyed = 0usize;
        for e in expenses.iter_mut().filter(|e| e.id.is_nil()) {
            e.id = ExpenseId::new();
            rekeyed += 1;
        }

        let registry = Self {
            store,
            expenses,
            on_change: None,
        };
        if rekeyed > 0 {
            info!(count = rekeyed, "assigned ids to legacy expense records");
            registry.persist()?;
        }
        Ok(registry)
    }

    pub fn set_on_change(&mut self, listener: impl FnMut(&[Expense]) + 's) {
        self.on_change = Some(Box::new(listener));
    }

    pub fn expenses(&self) -> &[Expense] {
        &self.expenses
    }

    pub fn iter(&self) -> impl Iterator<Item = &Expense> {
        self.expenses.iter()
    }

    pub fn len(&self) -> usize {
        self.expenses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expenses.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.expenses.iter().map(|e| e.amount).sum()
    }

    pub fn get(&self, id: &ExpenseId) -> Option<&Expense> {
        self.expenses.iter().find(|e| &e.id == id)
    }

    /// Zero-based position of `id`.
    pub fn position_of(&self, id: &ExpenseId) -> Option<usize> {
        self.expenses.iter().position(|e| &e.id == id)
    }

    /// Resolves a 1-based display position (as shown in the table) to an id.
    pub fn id_at(&self, position: usize) -> Result<ExpenseId> {
        position
            .checked_sub(1)
            .and_then(|i| self.expenses.get(i))
            .map(|e| e.id)
            .ok_or_else(|| Error::no_position(position))
    }

    pub fn append(&mut self, mut record: Expense) -> Result<ExpenseId> {
        if record.id.is_nil() {
            record.id = ExpenseId::new();
        }
        let id = record.id;
        self.expenses.push(record);
        self.commit("append")?;
        Ok(id)
    }

    /// Overwrites the record in place. The stored id wins over `record.id`.
    pub fn replace(&mut self, id: &ExpenseId, mut record: Expense) -> Result<()> {
        let idx = self.position_of(id).ok_or_else(|| Error::not_found(id))?;
        record.id = *id;
        self.expenses[idx] = record;
        self.commit("replace")
    }

    pub fn remove(&mut self, id: &ExpenseId) -> Result<Expense> {
        let idx = self.position_of(id).ok_or_else(|| Error::not_found(id))?;
        let removed = self.expenses.remove(idx);
        self.commit("remove")?;
        Ok(removed)
    }

    /// Returns whether there was an attachment to clear.
    pub fn clear_attachment(&mut self, id: &ExpenseId) -> Result<bool> {
        let idx = self.position_of(id).ok_or_else(|| Error::not_found(id))?;
        let had = self.expenses[idx].attachment.take().is_some();
        self.commit("clear_attachment")?;
        Ok(had)
    }

    fn persist(&self) -> Result<()> {
        self.store.save(EXPENSES_KEY, &self.expenses)
    }

    fn commit(&mut self, op: &'static str) -> Result<()> {
        self.persist()?;
        info!(op, count = self.expenses.len(), "expenses saved");
        if let Some(listener) = self.on_change.as_mut() {
            listener(&self.expenses);
        }
        Ok(())
    }
}
