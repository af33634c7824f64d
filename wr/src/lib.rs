//! Wrangler - directive execution engine for tabular row data
//!
//! A directive script is a sequence of named transformation steps. Each step
//! declares its argument grammar as a [`UsageDefinition`]; the engine tokenizes
//! the script, binds every invocation to its grammar and initializes the
//! directives before any row is touched. A configured [`Pipeline`] then threads
//! row batches through the directives in script order and reconciles the
//! result against an output [`Schema`].
//!
//! # Architecture
//!
//! ```text
//! script text ─► script::parse ─► Statement ─► token::tokenize ─► [Token]
//!                                                                  │
//!             DirectiveRegistry ─► UsageDefinition::bind ◄─────────┘
//!                                          │
//!                                      Arguments ─► Directive::initialize
//!
//! rows ─► Directive 1 ─► Directive 2 ─► ... ─► Schema::reconcile ─► [Record]
//! ```
//!
//! # Example
//!
//! ```ignore
//! use wrangler::{Pipeline, PipelineContext, Schema};
//!
//! let mut pipeline = Pipeline::new();
//! pipeline.configure("parse-as-date :ts\nget-date :ts :dow day-of-week", &PipelineContext::default())?;
//! let records = pipeline.execute(rows, &schema)?;
//! ```

pub mod arguments;
pub mod cli;
pub mod config;
pub mod context;
pub mod directive;
pub mod directives;
pub mod error;
pub mod pipeline;
pub mod row;
pub mod schema;
pub mod script;
pub mod token;
pub mod usage;
pub mod value;

pub use arguments::Arguments;
pub use context::{ExecutorContext, PipelineContext};
pub use directive::{Directive, DirectiveFactory, DirectiveInfo, DirectiveRegistry};
pub use error::{DirectiveExecutionError, DirectiveParseError, PipelineError, TokenizeError};
pub use pipeline::{Pipeline, PipelineState};
pub use row::Row;
pub use schema::{Field, FieldType, Record, Schema};
pub use script::Statement;
pub use token::{Numeric, Token, TokenType};
pub use usage::{Slot, UsageDefinition, UsageDefinitionBuilder};
pub use value::Value;
