use serde::Serialize;
use serde_json::{Map, Number, Value};
use thiserror::Error;

use crate::domain::report::Report;

#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("failed to encode field `{field}`: {source}")]
    Serialize {
        field: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode field `{field}`: {value} is not a finite number")]
    NonFiniteNumber { field: String, value: f64 },
}

impl EncodingError {
    pub fn field(&self) -> &str {
        match self {
            Self::Serialize { field, .. } | Self::NonFiniteNumber { field, .. } => field,
        }
    }
}

/// Insertion-ordered JSON object whose every insert reports the failing key path.
struct ObjectBuilder {
    path: Option<&'static str>,
    fields: Map<String, Value>,
}

impl ObjectBuilder {
    fn root() -> Self {
        Self {
            path: None,
            fields: Map::new(),
        }
    }

    fn nested(path: &'static str) -> Self {
        Self {
            path: Some(path),
            fields: Map::new(),
        }
    }

    fn field_path(&self, key: &str) -> String {
        match self.path {
            Some(parent) => format!("{parent}.{key}"),
            None => key.to_string(),
        }
    }

    fn add<T: Serialize>(mut self, key: &'static str, value: T) -> Result<Self, EncodingError> {
        let value = serde_json::to_value(value).map_err(|source| EncodingError::Serialize {
            field: self.field_path(key),
            source,
        })?;
        self.fields.insert(key.to_string(), value);
        Ok(self)
    }

    fn add_float(mut self, key: &'static str, value: f64) -> Result<Self, EncodingError> {
        let number = Number::from_f64(value).ok_or_else(|| EncodingError::NonFiniteNumber {
            field: self.field_path(key),
            value,
        })?;
        self.fields.insert(key.to_string(), Value::Number(number));
        Ok(self)
    }

    fn add_object(mut self, key: &'static str, object: ObjectBuilder) -> Self {
        self.fields.insert(key.to_string(), object.build());
        self
    }

    fn build(self) -> Value {
        Value::Object(self.fields)
    }
}

/// Encodes a report into the collector's body schema. Key order is part of the wire format.
pub fn encode_report(report: &Report) -> Result<Value, EncodingError> {
    let allocated = ObjectBuilder::nested("allocated_ressources")
        .add("cpu", report.cpu)?
        .add("mem", report.mem)?
        .add("gpu", report.gpu)?;

    let cost_tier = ObjectBuilder::nested("cost_tier")
        .add("name", &report.qos_name)?
        .add_float("factor", report.usage_factor)?;

    let body = ObjectBuilder::root()
        .add("job_id", report.job_id)?
        .add("user_id", report.user_id)?
        .add("account", &report.account)?
        .add("cluster", &report.cluster)?
        .add("partition", &report.partition)?
        .add("state", report.job_state.name())?
        .add_object("allocated_ressources", allocated)
        .add("allocated_billing_factor", report.billing)?
        .add("start_time", report.start_time)?
        .add("end_time", report.end_time)?
        .add("billed_time", report.elapsed)?
        .add_object("cost_tier", cost_tier)
        .add("total_cost", report.total_cost)?
        .add("priority", report.priority)?
        .build();

    tracing::debug!(job_id = report.job_id, body = %body, "report encoded");

    Ok(body)
}
