//! draft rows of the bill form

use derive_more::{Display, Error};
use crate::desk::model::draft::{DraftField, DraftLineItem};

#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub(crate) enum EditorError {
    #[display("row index {index} out of bounds for {len} rows")]
    InvalidArgument { index: usize, len: usize },
}

/// Ordered draft rows. Never empty: every update returns a new list and
/// refuses to drop the last row.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DraftItemList(Vec<DraftLineItem>);

impl Default for DraftItemList {
    fn default() -> Self {
        Self(vec![DraftLineItem::default()])
    }
}

impl DraftItemList {
    /// list from pre-filled rows, an empty input gives the single blank row
    pub fn from_rows(rows: Vec<DraftLineItem>) -> Self {
        if rows.is_empty() {
            return Self::default();
        }
        Self(rows)
    }

    pub fn rows(&self) -> &[DraftLineItem] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn with_row_added(&self) -> Self {
        let mut rows = self.0.clone();
        rows.push(DraftLineItem::default());
        Self(rows)
    }

    /// Removing the only row is a no-op.
    pub fn with_row_removed(&self, index: usize) -> Result<Self, EditorError> {
        self.check_index(index)?;
        if self.0.len() == 1 {
            return Ok(self.clone());
        }
        let mut rows = self.0.clone();
        rows.remove(index);
        Ok(Self(rows))
    }

    pub fn with_field(&self, index: usize, field: DraftField, value: impl Into<String>) -> Result<Self, EditorError> {
        self.check_index(index)?;
        let value = value.into();
        let rows = self
            .0
            .iter()
            .enumerate()
            .map(|(i, row)| match i == index {
                true => row.with_field(field, value.clone()),
                false => row.clone(),
            })
            .collect();
        Ok(Self(rows))
    }

    /// Running total. Blank or unparsable fields count as zero.
    pub fn total(&self) -> f64 {
        self.0.iter().map(DraftLineItem::subtotal_or_zero).sum()
    }

    fn check_index(&self, index: usize) -> Result<(), EditorError> {
        match index < self.0.len() {
            true => Ok(()),
            false => Err(EditorError::InvalidArgument { index, len: self.0.len() }),
        }
    }
}

/// Holds the current draft list of an open form and swaps it on every edit.
#[derive(Debug, Default)]
pub(crate) struct ItemEditor {
    items: DraftItemList,
}

impl ItemEditor {
    pub fn new(items: DraftItemList) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &DraftItemList {
        &self.items
    }

    pub fn add_row(&mut self) {
        self.items = self.items.with_row_added();
    }

    pub fn remove_row(&mut self, index: usize) -> Result<(), EditorError> {
        self.items = self.items.with_row_removed(index)?;
        Ok(())
    }

    pub fn set_field(&mut self, index: usize, field: DraftField, value: impl Into<String>) -> Result<(), EditorError> {
        self.items = self.items.with_field(index, field, value)?;
        Ok(())
    }

    pub fn compute_total(&self) -> f64 {
        self.items.total()
    }

    /// back to a single blank row
    pub fn reset(&mut self) {
        self.items = DraftItemList::default();
    }
}
