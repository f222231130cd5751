//! End-to-end runs: pipe-delimited records in, `result=...` records out.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use format_csv::{CsvDecoder, CsvOptions};
use format_json::JsonDecoder;
use format_kv::{KvEncoder, KvOptions};
use transform_api::schema::{Field, string_fields};
use transform_api::value::Value;
use transform_engine::{
    CompileError, CompiledStatement, Context, FaultPolicy, FunctionRegistry, TransformConfig, TransformError,
    TransformProcessor,
};

fn numeric_processor(config: TransformConfig) -> Result<TransformProcessor<str, String>, TransformError> {
    TransformProcessor::create(
        &config,
        Box::new(CsvDecoder::new(
            string_fields(&["numeric1", "numeric2", "numeric3", "numeric4"]),
            CsvOptions::default(),
        )),
        Box::new(KvEncoder::new(string_fields(&["result"]), KvOptions::default())),
    )
}

fn run(sql: &str, record: &str) -> Vec<String> {
    let processor = numeric_processor(TransformConfig::new(sql)).unwrap();
    processor.transform(record, &HashMap::new()).unwrap()
}

fn single(sql: &str, record: &str) -> String {
    let mut out = run(sql, record);
    assert_eq!(out.len(), 1, "{sql} over {record}");
    out.remove(0)
}

#[test]
fn atan2d_in_degrees() {
    let sql = "select atan2d(numeric1, numeric2) as result from source";
    assert_eq!(single(sql, "1|1"), "result=45.0");
    assert_eq!(single(sql, "1|0"), "result=90.0");
    assert_eq!(single(sql, "0|-1"), "result=180.0");
}

#[test]
fn logarithms() {
    assert_eq!(single("select log(numeric1) as result from source", "1"), "result=0.0");
    let sql = "select log(numeric1, numeric2) as result from source";
    assert_eq!(single(sql, "2|8"), "result=3.0");
    assert_eq!(single(sql, "10|100"), "result=2.0");
    assert_eq!(single(sql, "|100"), "result=");
}

#[test]
fn array_position_scenarios() {
    assert_eq!(
        single("select array_position(array('he', 7, 'xxd'), 'he') as result from source", "0"),
        "result=1"
    );
    assert_eq!(
        single("select array_position(array('he', 7, ''), '_') as result from source", "0"),
        "result=0"
    );
    assert_eq!(
        single("select array_position(array(numeric1, numeric2), numeric2) as result from source", "a|b"),
        "result=2"
    );
    // empty cell as the needle
    assert_eq!(
        single("select array_position(array(numeric1, 'x'), numeric2) as result from source", "a|"),
        "result="
    );
}

#[test]
fn array_except_scenarios() {
    let sql = "select array_except(array(numeric1, numeric2, numeric1, numeric3), array(numeric4)) as result from source";
    assert_eq!(single(sql, "a|b|c|c"), "result=[a, b]");
    assert_eq!(single(sql, "a|a|a|a"), "result=");
}

#[test]
fn where_clause_filters_rows() {
    let sql = "select numeric1 as result from source where numeric2 > 10";
    assert_eq!(run(sql, "x|11"), vec!["result=x".to_string()]);
    assert!(run(sql, "x|5").is_empty());
    // null predicate
    assert!(run(sql, "x|").is_empty());
}

#[test]
fn repeated_evaluation_is_stable() {
    let processor = numeric_processor(TransformConfig::new(
        "select concat(numeric1, '@', now()) as result from source",
    ))
    .unwrap();
    let ts = Utc.with_ymd_and_hms(2024, 3, 15, 10, 30, 45).unwrap();
    let context = Context::new(ts);
    let first = processor.transform_in("a", &context).unwrap();
    let second = processor.transform_in("a", &context).unwrap();
    assert_eq!(first, vec!["result=a@2024-03-15 10:30:45".to_string()]);
    assert_eq!(first, second);
}

#[test]
fn fault_policies() {
    let sql = "select numeric1 / numeric2 as result from source";
    let abort = numeric_processor(TransformConfig::new(sql)).unwrap();
    assert!(matches!(abort.transform("1|0", &HashMap::new()), Err(TransformError::Eval { .. })));

    let null_field = numeric_processor(TransformConfig::new(sql).with_fault_policy(FaultPolicy::NullField)).unwrap();
    assert_eq!(null_field.transform("1|0", &HashMap::new()).unwrap(), vec!["result=".to_string()]);

    let skip = numeric_processor(TransformConfig::new(sql).with_fault_policy(FaultPolicy::SkipRow)).unwrap();
    assert!(skip.transform("1|0", &HashMap::new()).unwrap().is_empty());
}

#[test]
fn caller_params_are_visible() {
    let processor = numeric_processor(TransformConfig::new(
        "select concat(\"$ctx.prefix\", numeric1) as result from source",
    ))
    .unwrap();
    let params = HashMap::from([("prefix".to_string(), Value::from("id-"))]);
    assert_eq!(processor.transform("7", &params).unwrap(), vec!["result=id-7".to_string()]);
}

#[test]
fn compile_errors() {
    let check = |sql: &str| match numeric_processor(TransformConfig::new(sql)) {
        Err(TransformError::Compile(e)) => e,
        Err(other) => panic!("{sql}: unexpected {other}"),
        Ok(_) => panic!("{sql}: compiled"),
    };
    assert!(matches!(check("select nosuch(numeric1) from source"), CompileError::UnknownFunction(_)));
    assert!(matches!(check("select atan2d(numeric1) from source"), CompileError::ArityMismatch { .. }));
    assert!(matches!(check("select numeric9 from source"), CompileError::UnknownColumn(_)));
    assert!(matches!(check("select numeric1 from source group by numeric1"), CompileError::InvalidStatement(_)));
}

#[test]
fn json_rows_path_expands_records() {
    let processor = TransformProcessor::<str, String>::create(
        &TransformConfig::new("select concat(id, ':', qty * 2) as result from source where qty > 0"),
        Box::new(
            JsonDecoder::new(
                vec![Field::new("id").with_path("$root.order"), Field::new("qty")],
                Some("lines"),
            )
            .unwrap(),
        ),
        Box::new(KvEncoder::new(string_fields(&["result"]), KvOptions::default())),
    )
    .unwrap();
    let outputs = processor
        .transform(r#"{"order": "o1", "lines": [{"qty": 2}, {"qty": 0}, {"qty": 5}]}"#, &HashMap::new())
        .unwrap();
    assert_eq!(outputs, vec!["result=o1:4".to_string(), "result=o1:10".to_string()]);
}

const fn assert_send_sync<T: Send + Sync + ?Sized>() {}

const _: () = {
    assert_send_sync::<TransformProcessor<str, String>>();
    assert_send_sync::<TransformProcessor<[u8], String>>();
    assert_send_sync::<CompiledStatement>();
    assert_send_sync::<FunctionRegistry>();
};

#[test]
fn shared_processor_evaluates_concurrently() {
    let processor = Arc::new(
        numeric_processor(TransformConfig::new(
            "select concat(atan2d(numeric1, numeric2), '/', upper(numeric3), '/', now()) as result from source",
        ))
        .unwrap(),
    );
    let context = Context::new(Utc.with_ymd_and_hms(2024, 3, 15, 10, 30, 45).unwrap());
    let records = ["1|1|a", "1|0|b", "0|-1|c"];
    let expected: Vec<Vec<String>> = records
        .iter()
        .map(|r| processor.transform_in(r, &context).unwrap())
        .collect();
    assert_eq!(expected[0], vec!["result=45.0/A/2024-03-15 10:30:45".to_string()]);

    std::thread::scope(|scope| {
        let workers: Vec<_> = (0..8)
            .map(|_| {
                let processor = Arc::clone(&processor);
                let context = &context;
                scope.spawn(move || {
                    (0..50)
                        .map(|i| {
                            let n = i % records.len();
                            (n, processor.transform_in(records[n], context).unwrap())
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        for worker in workers {
            for (n, outputs) in worker.join().unwrap() {
                assert_eq!(outputs, expected[n]);
            }
        }
    });
}
