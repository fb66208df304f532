//! Forward-only cursor consumed by the projector.

use crate::value::RawValue;
use async_trait::async_trait;
use thiserror::Error;

/// A stateful, forward-only iterator over a result set.
///
/// The owner of the cursor releases it (by dropping it) once projection is
/// done, whether it succeeded or not.
#[async_trait]
pub trait Cursor: Send {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Column names in result order. Fixed for the lifetime of the cursor.
    fn columns(&mut self) -> Result<Vec<String>, Self::Error>;

    /// Move to the next row. `Ok(false)` means the result set is exhausted.
    async fn advance(&mut self) -> Result<bool, Self::Error>;

    /// Fill `slots` (one per column, in column order) from the current row.
    fn scan(&mut self, slots: &mut [RawValue]) -> Result<(), Self::Error>;

    /// Terminal error state, checked once after exhaustion.
    fn finish(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct CursorFault(pub String);

/// Cursor over rows already held in memory.
///
/// Each phase can be made to fail, which is how callers (and tests) simulate
/// a driver that breaks mid-stream.
#[derive(Debug, Default)]
pub struct MemoryCursor {
    columns: Vec<String>,
    rows: Vec<Vec<RawValue>>,
    /// Index of the current row; `None` before the first advance.
    position: Option<usize>,
    column_fault: Option<CursorFault>,
    advance_fault: Option<(usize, CursorFault)>,
    scan_fault: Option<(usize, CursorFault)>,
    terminal_fault: Option<CursorFault>,
}

impl MemoryCursor {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>, rows: Vec<Vec<RawValue>>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows,
            ..Self::default()
        }
    }

    /// Column metadata retrieval fails.
    pub fn fail_columns(mut self, msg: impl Into<String>) -> Self {
        self.column_fault = Some(CursorFault(msg.into()));
        self
    }

    /// Advancing onto row `row` (0-based) fails.
    pub fn fail_advance_at(mut self, row: usize, msg: impl Into<String>) -> Self {
        self.advance_fault = Some((row, CursorFault(msg.into())));
        self
    }

    /// Scanning row `row` (0-based) fails.
    pub fn fail_scan_at(mut self, row: usize, msg: impl Into<String>) -> Self {
        self.scan_fault = Some((row, CursorFault(msg.into())));
        self
    }

    /// The terminal error check reports a fault after exhaustion.
    pub fn fail_on_finish(mut self, msg: impl Into<String>) -> Self {
        self.terminal_fault = Some(CursorFault(msg.into()));
        self
    }
}

#[async_trait]
impl Cursor for MemoryCursor {
    type Error = CursorFault;

    fn columns(&mut self) -> Result<Vec<String>, CursorFault> {
        match &self.column_fault {
            Some(fault) => Err(fault.clone()),
            None => Ok(self.columns.clone()),
        }
    }

    async fn advance(&mut self) -> Result<bool, CursorFault> {
        let next = self.position.map_or(0, |p| p + 1);
        if let Some((row, fault)) = &self.advance_fault {
            if *row == next {
                return Err(fault.clone());
            }
        }
        if next >= self.rows.len() {
            self.position = Some(self.rows.len());
            return Ok(false);
        }
        self.position = Some(next);
        Ok(true)
    }

    fn scan(&mut self, slots: &mut [RawValue]) -> Result<(), CursorFault> {
        let current = self
            .position
            .filter(|p| *p < self.rows.len())
            .ok_or_else(|| CursorFault("scan called without a current row".into()))?;
        if let Some((row, fault)) = &self.scan_fault {
            if *row == current {
                return Err(fault.clone());
            }
        }
        let values = &self.rows[current];
        if values.len() != slots.len() {
            return Err(CursorFault(format!(
                "expected {} destination slots, row has {} values",
                slots.len(),
                values.len()
            )));
        }
        slots.clone_from_slice(values);
        Ok(())
    }

    fn finish(&mut self) -> Result<(), CursorFault> {
        match &self.terminal_fault {
            Some(fault) => Err(fault.clone()),
            None => Ok(()),
        }
    }
}
