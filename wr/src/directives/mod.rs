//! Built-in directive catalog
//!
//! `get-date` is the reference directive; the others cover the common
//! column operations a multi-step script needs.

mod drop_columns;
mod fill_null_or_empty;
mod get_date;
mod parse_as_date;
mod rename;

pub use drop_columns::DropColumns;
pub use fill_null_or_empty::FillNullOrEmpty;
pub use get_date::{DateOp, GetDate};
pub use parse_as_date::ParseAsDate;
pub use rename::Rename;

use crate::directive::{DirectiveFactory, DirectiveInfo};

/// Metadata and factories for every built-in directive
pub fn builtin() -> Vec<(DirectiveInfo, DirectiveFactory)> {
    vec![
        (GetDate::info(), GetDate::boxed as DirectiveFactory),
        (ParseAsDate::info(), ParseAsDate::boxed as DirectiveFactory),
        (Rename::info(), Rename::boxed as DirectiveFactory),
        (DropColumns::info(), DropColumns::boxed as DirectiveFactory),
        (FillNullOrEmpty::info(), FillNullOrEmpty::boxed as DirectiveFactory),
    ]
}
