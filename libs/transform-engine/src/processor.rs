use std::collections::HashMap;

use transform_api::error::Location;
use transform_api::format::{SinkData, SinkEncoder, SourceData, SourceDecoder};
use transform_api::value::Value;

use crate::config::{FaultPolicy, TransformConfig};
use crate::context::Context;
use crate::error::{EvalError, TransformError};
use crate::registry::registry;
use crate::statement::{CompiledStatement, compile};

/// One decoder, one compiled statement, one encoder.
///
/// Everything is fixed at construction; a processor can be shared across
/// threads and used concurrently.
pub struct TransformProcessor<I: ?Sized, O> {
    decoder: Box<dyn SourceDecoder<I>>,
    encoder: Box<dyn SinkEncoder<O>>,
    statement: CompiledStatement,
    fault_policy: FaultPolicy,
    params: HashMap<String, Value>,
}

enum RowOutcome {
    Emit(SinkData),
    Skip,
}

impl<I: ?Sized, O> TransformProcessor<I, O> {
    /// Compile `config.sql` against the decoder's source fields and the
    /// encoder's sink fields.
    pub fn create(
        config: &TransformConfig,
        decoder: Box<dyn SourceDecoder<I>>,
        encoder: Box<dyn SinkEncoder<O>>,
    ) -> Result<Self, TransformError> {
        let statement = compile(&config.sql, registry(), decoder.fields(), encoder.fields())?;
        let params = config
            .params
            .iter()
            .map(|(name, value)| (name.clone(), Value::from(value)))
            .collect();
        tracing::info!(
            columns = ?statement.column_names().collect::<Vec<_>>(),
            fault_policy = ?config.fault_policy,
            "transform processor created"
        );
        Ok(Self {
            decoder,
            encoder,
            statement,
            fault_policy: config.fault_policy,
            params,
        })
    }

    pub fn statement(&self) -> &CompiledStatement {
        &self.statement
    }

    /// Decode `input`, evaluate the statement for every decoded row and
    /// encode each surviving row. The processing time is taken once per call.
    pub fn transform(
        &self,
        input: &I,
        extra_params: &HashMap<String, Value>,
    ) -> Result<Vec<O>, TransformError> {
        let context = Context::now().with_params(&self.params).with_params(extra_params);
        self.transform_with(input, &context)
    }

    /// Like [`transform`](Self::transform) with a caller-built context.
    /// Static config params are layered under the context's own params.
    pub fn transform_in(&self, input: &I, context: &Context) -> Result<Vec<O>, TransformError> {
        let context = Context::new(context.processing_time())
            .with_params(&self.params)
            .with_params(context.params());
        self.transform_with(input, &context)
    }

    fn transform_with(&self, input: &I, context: &Context) -> Result<Vec<O>, TransformError> {
        let source = self.decoder.decode(input).map_err(TransformError::Decode)?;
        let mut outputs = Vec::with_capacity(source.row_count());
        for row in 0..source.row_count() {
            match self.evaluate_row(source.as_ref(), row, context)? {
                RowOutcome::Emit(sink) => {
                    let record = self
                        .encoder
                        .encode(&sink)
                        .map_err(|e| TransformError::Encode(e.at(Location::Row(row))))?;
                    outputs.push(record);
                }
                RowOutcome::Skip => {}
            }
        }
        tracing::trace!(rows = source.row_count(), outputs = outputs.len(), "record transformed");
        Ok(outputs)
    }

    fn evaluate_row(
        &self,
        source: &dyn SourceData,
        row: usize,
        context: &Context,
    ) -> Result<RowOutcome, TransformError> {
        if let Some(predicate) = &self.statement.predicate {
            match predicate.evaluate(source, row, context) {
                Ok(Value::Bool(true)) => {}
                Ok(_) => return Ok(RowOutcome::Skip),
                // A faulting filter never admits the row.
                Err(e) => return self.on_fault("where", row, e).map(|_| RowOutcome::Skip),
            }
        }

        let mut sink = SinkData::with_capacity(self.statement.columns.len());
        for column in &self.statement.columns {
            let value = match column.parser.evaluate(source, row, context) {
                Ok(value) => value,
                Err(e) => match self.on_fault(&column.name, row, e)? {
                    Some(value) => value,
                    None => return Ok(RowOutcome::Skip),
                },
            };
            sink.push(column.name.clone(), value);
        }
        Ok(RowOutcome::Emit(sink))
    }

    /// Apply the fault policy: `Err` aborts the call, `Ok(Some)` is the
    /// replacement value, `Ok(None)` drops the row.
    fn on_fault(&self, field: &str, row: usize, error: EvalError) -> Result<Option<Value>, TransformError> {
        match self.fault_policy {
            FaultPolicy::Abort => Err(TransformError::Eval {
                field: field.to_string(),
                row,
                source: error,
            }),
            FaultPolicy::NullField => {
                tracing::warn!(field, row, error = %error, "evaluation fault, field set to null");
                Ok(Some(Value::Null))
            }
            FaultPolicy::SkipRow => {
                tracing::warn!(field, row, error = %error, "evaluation fault, row skipped");
                Ok(None)
            }
        }
    }
}
