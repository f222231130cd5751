use std::collections::HashMap;

use format_avro::AvroDecoder;
use format_csv::{CsvDecoder, CsvEncoder};
use format_json::{JsonDecoder, JsonEncoder};
use format_kv::{KvDecoder, KvEncoder};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader};
use transform_api::format::{SinkEncoder, SourceDecoder};
use transform_engine::TransformProcessor;

use crate::config::{Framing, RunArgs, RunnerConfig, SinkConfig, SourceConfig};
use crate::error::RunnerError;

type Processor = TransformProcessor<[u8], String>;

pub async fn run(args: RunArgs) -> Result<(), RunnerError> {
    let config = RunnerConfig::load(&args.config)?;
    tracing::info!(config = %args.config, framing = ?config.framing, "loaded config");
    let processor = build_processor(&config)?;

    let input: Box<dyn AsyncRead + Unpin + Send> = match &args.input {
        Some(path) => Box::new(tokio::fs::File::open(path).await?),
        None => Box::new(tokio::io::stdin()),
    };
    let mut stdout = tokio::io::stdout();
    let mut stats = Stats::default();

    match config.framing {
        Framing::Whole => {
            let mut reader = BufReader::new(input);
            let mut record = Vec::new();
            reader.read_to_end(&mut record).await?;
            let outputs = process_record(&processor, &record, &mut stats);
            write_outputs(&mut stdout, &outputs).await?;
        }
        Framing::Lines => {
            let mut lines = BufReader::new(input).lines();
            let shutdown = tokio::signal::ctrl_c();
            tokio::pin!(shutdown);
            loop {
                tokio::select! {
                    line = lines.next_line() => {
                        let Some(line) = line? else { break };
                        if line.trim().is_empty() {
                            continue;
                        }
                        let outputs = process_record(&processor, line.as_bytes(), &mut stats);
                        write_outputs(&mut stdout, &outputs).await?;
                    }
                    signal = &mut shutdown => {
                        signal?;
                        tracing::info!("interrupted, stopping");
                        break;
                    }
                }
            }
        }
    }
    stdout.flush().await?;
    tracing::info!(
        records = stats.records,
        outputs = stats.outputs,
        failed = stats.failed,
        "run finished"
    );
    Ok(())
}

#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct Stats {
    pub records: usize,
    pub outputs: usize,
    pub failed: usize,
}

pub(crate) fn build_processor(config: &RunnerConfig) -> Result<Processor, RunnerError> {
    let decoder: Box<dyn SourceDecoder<[u8]>> = match &config.source {
        SourceConfig::Csv(s) => Box::new(CsvDecoder::from_config(s.fields.clone(), &s.options)?),
        SourceConfig::Kv(s) => Box::new(KvDecoder::from_config(s.fields.clone(), &s.options)?),
        SourceConfig::Json(s) => Box::new(JsonDecoder::from_config(s.fields.clone(), &s.options)?),
        SourceConfig::Avro(s) => Box::new(AvroDecoder::from_config(s.fields.clone(), &s.options)?),
    };
    let encoder: Box<dyn SinkEncoder<String>> = match &config.sink {
        SinkConfig::Csv(s) => Box::new(CsvEncoder::from_config(s.fields.clone(), &s.options)?),
        SinkConfig::Kv(s) => Box::new(KvEncoder::from_config(s.fields.clone(), &s.options)?),
        SinkConfig::Json(s) => Box::new(JsonEncoder::new(s.fields.clone())),
    };
    Ok(TransformProcessor::create(&config.transform, decoder, encoder)?)
}

/// Transform one record. Failures are logged and counted; the run goes on.
pub(crate) fn process_record(processor: &Processor, record: &[u8], stats: &mut Stats) -> Vec<String> {
    stats.records += 1;
    match processor.transform(record, &HashMap::new()) {
        Ok(outputs) => {
            stats.outputs += outputs.len();
            outputs
        }
        Err(e) => {
            stats.failed += 1;
            tracing::warn!(record = stats.records, error = %e, "record failed");
            Vec::new()
        }
    }
}

async fn write_outputs(out: &mut tokio::io::Stdout, outputs: &[String]) -> Result<(), RunnerError> {
    for line in outputs {
        out.write_all(line.as_bytes()).await?;
        out.write_all(b"\n").await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(sql: &str) -> RunnerConfig {
        RunnerConfig::parse(&format!(
            r#"
            [transform]
            sql = "{sql}"

            [source]
            format = "csv"
            fields = [{{ name = "numeric1" }}, {{ name = "numeric2" }}]

            [sink]
            format = "kv"
            fields = [{{ name = "result" }}]
            "#
        ))
        .unwrap()
    }

    #[test]
    fn processes_records_and_counts_failures() {
        let processor = build_processor(&config("select numeric1 / numeric2 as result from source")).unwrap();
        let mut stats = Stats::default();
        assert_eq!(process_record(&processor, b"6|3", &mut stats), vec!["result=2".to_string()]);
        assert!(process_record(&processor, b"1|0", &mut stats).is_empty());
        assert_eq!(stats, Stats { records: 2, outputs: 1, failed: 1 });
    }

    #[test]
    fn bad_statement_fails_startup() {
        assert!(matches!(
            build_processor(&config("select nope(numeric1) from source")),
            Err(RunnerError::Transform(_))
        ));
    }
}
