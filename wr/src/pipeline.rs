//! Pipeline - configures directives from a script and runs row batches through them

use tracing::{debug, info, warn};

use crate::context::{ExecutorContext, PipelineContext};
use crate::directive::Directive;
use crate::error::{DirectiveParseError, PipelineError};
use crate::row::Row;
use crate::schema::{Record, Schema};
use crate::script;

/// Lifecycle state of a pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Unconfigured,
    Configured,
}

/// A configured directive and where it came from
struct Step {
    line: usize,
    directive: Box<dyn Directive>,
}

/// Ordered chain of configured directives
///
/// `configure` must succeed before `execute`. Reconfiguring tears down the
/// previous directives first; a failed configuration leaves the pipeline
/// unconfigured with every created directive destroyed. Dropping a
/// configured pipeline destroys its directives.
pub struct Pipeline {
    steps: Vec<Step>,
    state: PipelineState,
    context: ExecutorContext,
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            state: PipelineState::Unconfigured,
            context: ExecutorContext::default(),
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Number of configured directives
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Names of the configured directives, in execution order
    pub fn directives(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.directive.name()).collect()
    }

    /// Execution context shared by all directives (counters, lookups)
    pub fn context(&self) -> &ExecutorContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut ExecutorContext {
        &mut self.context
    }

    /// Parse, bind and initialize every directive in `script`
    ///
    /// Nothing is kept unless every invocation succeeds.
    pub fn configure(&mut self, script: &str, ctx: &PipelineContext) -> Result<(), DirectiveParseError> {
        debug!(pipeline = %ctx.name, "Pipeline::configure: called");
        self.close();

        let statements = script::parse(script)?;
        let mut steps: Vec<Step> = Vec::with_capacity(statements.len());

        for statement in &statements {
            if let Err(e) = Self::build_step(statement, ctx, &mut steps) {
                warn!(line = statement.line, error = %e, "Pipeline::configure: failed");
                for step in steps.iter_mut() {
                    step.directive.destroy();
                }
                return Err(e);
            }
        }

        info!(pipeline = %ctx.name, directives = steps.len(), "Pipeline configured");
        self.steps = steps;
        self.context = ctx.executor_context();
        self.state = PipelineState::Configured;
        Ok(())
    }

    // The new directive is pushed before initialize so that a failure
    // still sees it destroyed by the caller.
    fn build_step(
        statement: &script::Statement,
        ctx: &PipelineContext,
        steps: &mut Vec<Step>,
    ) -> Result<(), DirectiveParseError> {
        let (usage, directive) = match (ctx.registry.usage(&statement.name), ctx.registry.create(&statement.name)) {
            (Some(usage), Some(directive)) => (usage, directive),
            _ => {
                return Err(DirectiveParseError::UnknownDirective {
                    name: statement.name.clone(),
                    line: statement.line,
                });
            }
        };

        let args = usage
            .bind(statement.tokens()?)
            .map_err(|e| e.at_line(statement.line))?;

        steps.push(Step {
            line: statement.line,
            directive,
        });
        if let Some(step) = steps.last_mut() {
            step.directive
                .initialize(&args)
                .map_err(|e| e.at_line(statement.line))?;
        }
        debug!(directive = %statement.name, line = statement.line, "Pipeline::build_step: initialized");
        Ok(())
    }

    /// Run the directives over `rows` without schema reconciliation
    ///
    /// The output of step *i* is the input of step *i+1*.
    pub fn execute_rows(&mut self, rows: Vec<Row>) -> Result<Vec<Row>, PipelineError> {
        if self.state != PipelineState::Configured {
            return Err(PipelineError::NotConfigured);
        }
        debug!(rows = rows.len(), steps = self.steps.len(), "Pipeline::execute_rows: called");
        self.context.increment("rows.in", rows.len() as u64);

        let mut rows = rows;
        for (idx, step) in self.steps.iter_mut().enumerate() {
            rows = step
                .directive
                .execute(rows, &mut self.context)
                .map_err(|source| {
                    warn!(step = idx, line = step.line, error = %source, "Pipeline::execute_rows: directive failed");
                    PipelineError::Execution { step: idx, source }
                })?;
            let counter = format!("directive.{}.rows", step.directive.name());
            self.context.increment(&counter, rows.len() as u64);
        }

        self.context.increment("rows.out", rows.len() as u64);
        Ok(rows)
    }

    /// Run the directives over `rows`, then reconcile against `schema`
    pub fn execute(&mut self, rows: Vec<Row>, schema: &Schema) -> Result<Vec<Record>, PipelineError> {
        let rows = self.execute_rows(rows)?;
        schema.reconcile(&rows)
    }

    /// Destroy all directives, drop the execution context and return to the
    /// unconfigured state
    pub fn close(&mut self) {
        if !self.steps.is_empty() {
            debug!(steps = self.steps.len(), "Pipeline::close: destroying directives");
        }
        for step in self.steps.iter_mut() {
            step.directive.destroy();
        }
        self.steps.clear();
        self.context = ExecutorContext::default();
        self.state = PipelineState::Unconfigured;
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arguments::Arguments;
    use crate::directive::{DirectiveInfo, DirectiveRegistry};
    use crate::error::DirectiveExecutionError;
    use crate::schema::{Field, FieldType};
    use crate::token::TokenType;
    use crate::usage::UsageDefinition;
    use crate::value::Value;
    use chrono::{TimeZone, Utc};
    use std::cell::RefCell;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static DESTROYED: AtomicUsize = AtomicUsize::new(0);

    // Per test thread, so parallel tests do not see each other's calls
    thread_local! {
        static LOG: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
    }

    /// Appends its tag to a `trace` column and records lifecycle calls
    #[derive(Default)]
    struct Tracer {
        tag: String,
    }

    impl Directive for Tracer {
        fn name(&self) -> &'static str {
            "trace"
        }

        fn define(&self) -> Result<UsageDefinition, DirectiveParseError> {
            UsageDefinition::builder("trace").define("tag", TokenType::Identifier).build()
        }

        fn initialize(&mut self, args: &Arguments) -> Result<(), DirectiveParseError> {
            let tag = args.identifier("tag")?;
            LOG.with(|log| log.borrow_mut().push(format!("init:{}", tag)));
            if tag == "bad" {
                return Err(DirectiveParseError::InvalidArgument {
                    directive: "trace".to_string(),
                    slot: "tag".to_string(),
                    reason: "bad tag".to_string(),
                });
            }
            self.tag = tag.to_string();
            Ok(())
        }

        fn execute(
            &mut self,
            mut rows: Vec<Row>,
            _ctx: &mut ExecutorContext,
        ) -> Result<Vec<Row>, DirectiveExecutionError> {
            if self.tag == "boom" {
                return Err(DirectiveExecutionError::new("trace", "boom").at_row(0));
            }
            for row in rows.iter_mut() {
                let trace = match row.value("trace") {
                    Some(Value::String(s)) => format!("{}>{}", s, self.tag),
                    _ => self.tag.clone(),
                };
                row.add_or_set("trace", trace);
            }
            Ok(rows)
        }

        fn destroy(&mut self) {
            DESTROYED.fetch_add(1, Ordering::SeqCst);
            LOG.with(|log| log.borrow_mut().push(format!("destroy:{}", self.tag)));
        }
    }

    fn tracer() -> Box<dyn Directive> {
        Box::new(Tracer::default())
    }

    fn context() -> PipelineContext {
        let mut registry = DirectiveRegistry::standard();
        registry.register(DirectiveInfo::new("trace", "test"), tracer).unwrap();
        PipelineContext::new("test").with_registry(registry)
    }

    fn take_log() -> Vec<String> {
        LOG.with(|log| std::mem::take(&mut *log.borrow_mut()))
    }

    #[test]
    fn test_execute_before_configure_fails() {
        let mut pipeline = Pipeline::new();
        assert_eq!(pipeline.state(), PipelineState::Unconfigured);

        let err = pipeline.execute_rows(vec![Row::new()]).unwrap_err();
        assert_eq!(err, PipelineError::NotConfigured);
    }

    #[test]
    fn test_directives_run_in_declaration_order() {
        let mut pipeline = Pipeline::new();
        pipeline.configure("trace a\ntrace b; trace c", &context()).unwrap();

        let out = pipeline
            .execute_rows(vec![Row::new().with("id", 1), Row::new().with("id", 2)])
            .unwrap();

        assert_eq!(pipeline.directives(), vec!["trace", "trace", "trace"]);
        for row in &out {
            assert_eq!(row.value("trace"), Some(&Value::from("a>b>c")));
        }
        assert_eq!(pipeline.context().counter("rows.in"), 2);
        assert_eq!(pipeline.context().counter("rows.out"), 2);
        assert_eq!(pipeline.context().counter("directive.trace.rows"), 6);
    }

    #[test]
    fn test_unknown_directive_fails_before_rows() {
        let mut pipeline = Pipeline::new();
        let err = pipeline.configure("trace a\nfrobnicate :x", &context()).unwrap_err();

        assert_eq!(
            err,
            DirectiveParseError::UnknownDirective {
                name: "frobnicate".to_string(),
                line: 2
            }
        );
        assert_eq!(pipeline.state(), PipelineState::Unconfigured);
        assert!(pipeline.is_empty());
        assert_eq!(pipeline.execute_rows(Vec::new()).unwrap_err(), PipelineError::NotConfigured);
    }

    #[test]
    fn test_failed_configure_destroys_created_directives() {
        take_log();
        let mut pipeline = Pipeline::new();
        let err = pipeline.configure("trace first\ntrace bad\ntrace never", &context()).unwrap_err();

        assert!(matches!(err, DirectiveParseError::Statement { line: 2, .. }));
        let log = take_log();
        assert!(log.contains(&"destroy:first".to_string()));
        assert!(!log.iter().any(|l| l == "destroy:never"));
        assert_eq!(pipeline.state(), PipelineState::Unconfigured);
    }

    #[test]
    fn test_too_few_arguments_never_initialize() {
        take_log();
        let mut pipeline = Pipeline::new();
        let err = pipeline.configure("trace", &context()).unwrap_err();

        assert!(matches!(
            err,
            DirectiveParseError::Statement { line: 1, ref source }
                if matches!(**source, DirectiveParseError::MissingArgument { .. })
        ));
        assert!(!take_log().iter().any(|l| l.starts_with("init:")));

        pipeline.configure("trace ok", &context()).unwrap();
        assert_eq!(take_log(), vec!["init:ok".to_string()]);
    }

    #[test]
    fn test_failed_reconfigure_resets_context() {
        let mut pipeline = Pipeline::new();
        pipeline.configure("drop :x", &context()).unwrap();
        pipeline.execute_rows(vec![Row::new().with("x", 1)]).unwrap();
        assert_eq!(pipeline.context().counter("rows.in"), 1);

        pipeline.configure("frobnicate :x", &context()).unwrap_err();

        assert_eq!(pipeline.state(), PipelineState::Unconfigured);
        assert!(pipeline.context().counters().is_empty());
    }

    #[test]
    fn test_bind_error_reports_line() {
        let mut pipeline = Pipeline::new();
        let err = pipeline.configure("\nget-date :only", &context()).unwrap_err();

        assert!(matches!(err, DirectiveParseError::Statement { line: 2, .. }));
        assert!(err.to_string().contains("missing required argument 'destination'"));
    }

    #[test]
    fn test_execution_error_names_directive_and_row() {
        let mut pipeline = Pipeline::new();
        pipeline.configure("trace ok\ntrace boom", &context()).unwrap();

        let err = pipeline.execute_rows(vec![Row::new()]).unwrap_err();

        assert_eq!(err.directive(), Some("trace"));
        assert_eq!(err.row(), Some(0));
        assert!(matches!(err, PipelineError::Execution { step: 1, .. }));
    }

    #[test]
    fn test_reconfigure_and_close_destroy_previous_directives() {
        let before = DESTROYED.load(Ordering::SeqCst);
        let mut pipeline = Pipeline::new();
        pipeline.configure("trace x; trace y", &context()).unwrap();
        pipeline.configure("trace z", &context()).unwrap();
        assert!(DESTROYED.load(Ordering::SeqCst) >= before + 2);
        assert_eq!(pipeline.len(), 1);

        let before = DESTROYED.load(Ordering::SeqCst);
        drop(pipeline);
        assert!(DESTROYED.load(Ordering::SeqCst) > before);
    }

    #[test]
    fn test_empty_batch_has_no_side_effects_on_rows() {
        let mut pipeline = Pipeline::new();
        pipeline.configure("get-date :a :b dow", &context()).unwrap();
        assert!(pipeline.execute_rows(Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn test_execute_reconciles_against_schema() {
        let mut pipeline = Pipeline::new();
        pipeline
            .configure("get-date :source_col :dest_col day-of-week", &PipelineContext::default())
            .unwrap();

        let day = Utc.with_ymd_and_hms(2017, 3, 14, 0, 0, 0).unwrap();
        let schema = Schema::new(
            "out",
            vec![
                Field::new("source_col", FieldType::Timestamp),
                Field::new("dest_col", FieldType::Int),
            ],
        );

        let records = pipeline.execute(vec![Row::new().with("source_col", day)], &schema).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("dest_col"), Some(&Value::Int(2)));
        assert_eq!(records[0].get("source_col"), Some(&Value::Timestamp(day)));
    }

    #[test]
    fn test_execute_reconcile_failure() {
        let mut pipeline = Pipeline::new();
        pipeline.configure("drop :id", &PipelineContext::default()).unwrap();
        let schema = Schema::new("out", vec![Field::new("id", FieldType::Long)]);

        let err = pipeline.execute(vec![Row::new().with("id", 1)], &schema).unwrap_err();
        assert!(matches!(err, PipelineError::Reconcile { row: 0, ref column, .. } if column == "id"));
    }
}
