//! Generic JSON transformer
//!
//! `{"level":40,"time":"<ISO-8601>","msg":"..",<data fields>,"error":{..},"ctx":{..}}`

use crate::core::timestamp::to_iso8601;
use crate::core::transformer::{ctx_object, split_error, to_json_line};
use crate::core::{LogRecord, Transformer};
use serde_json::Value;

/// One JSON object per line, severity as its numeric rank
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonTransformer;

impl JsonTransformer {
    pub fn new() -> Self {
        Self
    }
}

impl Transformer for JsonTransformer {
    fn transform(&self, record: &LogRecord) -> String {
        let (mut object, error) = split_error(record);

        object.insert("level".to_string(), Value::from(record.level.rank()));
        object.insert("time".to_string(), Value::String(to_iso8601(&record.time)));
        if let Some(msg) = &record.msg {
            object.insert("msg".to_string(), Value::String(msg.clone()));
        }
        if let Some(error) = error {
            object.insert("error".to_string(), error);
        }
        if let Some(ctx) = ctx_object(record, &[]) {
            object.insert("ctx".to_string(), ctx);
        }

        to_json_line(object)
    }

    fn name(&self) -> &str {
        "json"
    }
}
