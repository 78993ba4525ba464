//! Canonical JSON format: the schedule's dict form, pretty-printed.

use plandiff_model::Schedule;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{FormatError, FormatResult};
use crate::format::ScheduleFormat;
use crate::source::Source;

pub struct JsonFormat;

impl JsonFormat {
    /// Parse without serde_json's nesting limit; task trees may be
    /// arbitrarily deep.
    fn parse(source: &Source) -> FormatResult<Value> {
        let mut de = serde_json::Deserializer::from_slice(&source.data);
        de.disable_recursion_limit();
        let parsed = Value::deserialize(&mut de).and_then(|value| de.end().map(|()| value));
        parsed.map_err(|e| FormatError::Parse {
            format: "json".into(),
            source_name: source.name.clone(),
            message: e.to_string(),
        })
    }
}

impl ScheduleFormat for JsonFormat {
    fn name(&self) -> &str {
        "json"
    }

    fn is_valid_source(&self, source: &Source) -> bool {
        match Self::parse(source) {
            Ok(Value::Object(map)) => map.get("tasks").is_some_and(Value::is_array),
            _ => false,
        }
    }

    fn import(&self, source: &Source) -> FormatResult<Schedule> {
        let value = Self::parse(source)?;
        let mut schedule = Schedule::from_value(value)?;
        schedule.normalize();
        Ok(schedule)
    }

    fn export(&self, schedule: &Schedule) -> FormatResult<Vec<u8>> {
        let value = schedule.to_value()?;
        let mut out = serde_json::to_vec_pretty(&value).map_err(plandiff_model::ModelError::from)?;
        out.push(b'\n');
        Ok(out)
    }
}
