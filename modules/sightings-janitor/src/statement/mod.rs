//! Time/Location statement validation.
//!
//! A statement is read from a post's text in three steps: [`extract`] pulls
//! the raw `Time`/`Date` and `Location` values out of one text block,
//! [`temporal`] checks the time value for a date and a time of day, and
//! [`classify`] turns that into a verdict and picks the best verdict across
//! the post's body, the author's comments, and the title.

pub mod classify;
pub mod extract;
pub mod temporal;

pub use classify::{classify_fields, Classification, StatementClassifier, StatementIssue, StatementKind};
pub use extract::{extract, FieldExtraction, StatementSource};
pub use temporal::{analyze, TemporalTokens};
