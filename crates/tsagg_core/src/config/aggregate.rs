use std::collections::HashMap;
use std::sync::LazyLock;

use serde::Deserialize;
use tsagg_error::{DbError, Result, ResultExt};

use crate::arrays::scalar::ScalarValue;
use crate::buffer::buffer_manager::TrackedBufferManager;

pub const DEFAULT_GROUP_ARRAY_MIN_CAPACITY: u64 = 1024;

const MAX_GROUP_ARRAY_MIN_CAPACITY: u64 = 1 << 24;

/// Configuration for grouped aggregates.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AggregateConfig {
    /// Max bytes all accumulators sharing a buffer manager may reserve. Zero
    /// means unlimited.
    pub memory_limit: u64,
    /// Slots to allocate the first time a group array grows.
    pub group_array_min_capacity: u64,
}

impl Default for AggregateConfig {
    fn default() -> Self {
        AggregateConfig {
            memory_limit: 0,
            group_array_min_capacity: DEFAULT_GROUP_ARRAY_MIN_CAPACITY,
        }
    }
}

impl AggregateConfig {
    /// Load a config from a JSON object. Missing keys use their defaults.
    pub fn from_json(s: &str) -> Result<Self> {
        let conf: Self = serde_json::from_str(s).context("failed to parse aggregate config")?;
        GroupArrayMinCapacity::validate_value(conf.group_array_min_capacity)?;
        Ok(conf)
    }

    /// Build a buffer manager enforcing the configured memory limit.
    pub fn buffer_manager(&self) -> TrackedBufferManager {
        match self.memory_limit {
            0 => TrackedBufferManager::unlimited(),
            limit => TrackedBufferManager::new(Some(usize::try_from(limit).unwrap_or(usize::MAX))),
        }
    }

    pub fn group_array_min_capacity(&self) -> usize {
        usize::try_from(self.group_array_min_capacity).unwrap_or(usize::MAX)
    }

    pub fn set_from_scalar(&mut self, name: &str, value: ScalarValue) -> Result<()> {
        let func = lookup_setting(name)?;
        (func.set)(value, self)
    }

    pub fn get_as_scalar(&self, name: &str) -> Result<ScalarValue> {
        let func = lookup_setting(name)?;
        Ok((func.get)(self))
    }

    pub fn reset(&mut self, name: &str) -> Result<()> {
        let func = lookup_setting(name)?;
        let scalar = (func.get)(&Self::default());
        (func.set)(scalar, self)
    }

    pub fn reset_all(&mut self) {
        *self = Self::default();
    }

    /// Names and descriptions of all settings, sorted by name.
    pub fn settings() -> Vec<(&'static str, &'static str)> {
        let mut settings: Vec<_> = GET_SET_FUNCTIONS
            .iter()
            .map(|(name, func)| (*name, func.description))
            .collect();
        settings.sort_unstable();
        settings
    }
}

fn lookup_setting(name: &str) -> Result<&'static SettingFunctions> {
    GET_SET_FUNCTIONS
        .get(name)
        .ok_or_else(|| DbError::invalid_argument(format!("Missing setting for '{name}'")))
}

struct SettingFunctions {
    description: &'static str,
    set: fn(scalar: ScalarValue, conf: &mut AggregateConfig) -> Result<()>,
    get: fn(conf: &AggregateConfig) -> ScalarValue,
}

impl SettingFunctions {
    const fn new<S: AggregateSetting>() -> Self {
        SettingFunctions {
            description: S::DESCRIPTION,
            set: S::set_from_scalar as _,
            get: S::get_as_scalar as _,
        }
    }
}

fn insert_setting<S: AggregateSetting>(map: &mut HashMap<&'static str, SettingFunctions>) {
    if map.insert(S::NAME, SettingFunctions::new::<S>()).is_some() {
        panic!("Duplicate settings names: {}", S::NAME);
    }
}

static GET_SET_FUNCTIONS: LazyLock<HashMap<&'static str, SettingFunctions>> = LazyLock::new(|| {
    let mut map = HashMap::new();

    insert_setting::<MemoryLimit>(&mut map);
    insert_setting::<GroupArrayMinCapacity>(&mut map);

    map
});

pub trait AggregateSetting: Sync + Send + 'static {
    const NAME: &'static str;
    const DESCRIPTION: &'static str;

    fn set_from_scalar(scalar: ScalarValue, conf: &mut AggregateConfig) -> Result<()>;
    fn get_as_scalar(conf: &AggregateConfig) -> ScalarValue;
}

fn u64_as_scalar(v: u64) -> ScalarValue {
    ScalarValue::Int64(i64::try_from(v).unwrap_or(i64::MAX))
}

pub struct MemoryLimit;

impl AggregateSetting for MemoryLimit {
    const NAME: &'static str = "memory_limit";
    const DESCRIPTION: &'static str =
        "Max bytes aggregate state may reserve, zero for no limit";

    fn set_from_scalar(scalar: ScalarValue, conf: &mut AggregateConfig) -> Result<()> {
        conf.memory_limit = scalar.try_as_u64()?;
        Ok(())
    }

    fn get_as_scalar(conf: &AggregateConfig) -> ScalarValue {
        u64_as_scalar(conf.memory_limit)
    }
}

pub struct GroupArrayMinCapacity;

impl GroupArrayMinCapacity {
    pub fn validate_value(val: u64) -> Result<()> {
        if val > MAX_GROUP_ARRAY_MIN_CAPACITY {
            return Err(DbError::invalid_argument(format!(
                "Group array minimum capacity cannot be greater than {MAX_GROUP_ARRAY_MIN_CAPACITY}"
            )));
        }
        Ok(())
    }
}

impl AggregateSetting for GroupArrayMinCapacity {
    const NAME: &'static str = "group_array_min_capacity";
    const DESCRIPTION: &'static str =
        "Number of group slots to allocate the first time aggregate state grows";

    fn set_from_scalar(scalar: ScalarValue, conf: &mut AggregateConfig) -> Result<()> {
        let val = scalar.try_as_u64()?;
        Self::validate_value(val)?;
        conf.group_array_min_capacity = val;
        Ok(())
    }

    fn get_as_scalar(conf: &AggregateConfig) -> ScalarValue {
        u64_as_scalar(conf.group_array_min_capacity)
    }
}

#[cfg(test)]
mod tests {
    use tsagg_error::ErrorKind;

    use super::*;
    use crate::buffer::buffer_manager::BufferManager;

    #[test]
    fn set_setting_exists() {
        let mut conf = AggregateConfig::default();
        conf.set_from_scalar("memory_limit", ScalarValue::Int64(4096))
            .unwrap();

        let val = conf.get_as_scalar("memory_limit").unwrap();
        assert_eq!(ScalarValue::Int64(4096), val);
        assert_eq!(4096, conf.memory_limit);
    }

    #[test]
    fn set_setting_not_exists() {
        let mut conf = AggregateConfig::default();
        let err = conf
            .set_from_scalar("hello_world", ScalarValue::Int32(58))
            .unwrap_err();
        assert_eq!(ErrorKind::InvalidArgument, err.kind());
    }

    #[test]
    fn set_casts_value() {
        let mut conf = AggregateConfig::default();
        conf.set_from_scalar("group_array_min_capacity", ScalarValue::Int8(13))
            .unwrap();
        assert_eq!(13, conf.group_array_min_capacity);
    }

    #[test]
    fn set_rejects_bad_values() {
        let mut conf = AggregateConfig::default();
        conf.set_from_scalar("memory_limit", ScalarValue::Int64(-1))
            .unwrap_err();
        conf.set_from_scalar("memory_limit", ScalarValue::Boolean(true))
            .unwrap_err();
        conf.set_from_scalar("group_array_min_capacity", ScalarValue::Int64(1 << 30))
            .unwrap_err();
        assert_eq!(AggregateConfig::default(), conf);
    }

    #[test]
    fn reset_setting() {
        let mut conf = AggregateConfig::default();
        conf.set_from_scalar("group_array_min_capacity", ScalarValue::Int64(4))
            .unwrap();
        conf.set_from_scalar("memory_limit", ScalarValue::Int64(100))
            .unwrap();

        conf.reset("group_array_min_capacity").unwrap();
        assert_eq!(DEFAULT_GROUP_ARRAY_MIN_CAPACITY, conf.group_array_min_capacity);
        assert_eq!(100, conf.memory_limit);

        conf.reset_all();
        assert_eq!(AggregateConfig::default(), conf);
    }

    #[test]
    fn from_json_partial() {
        let conf = AggregateConfig::from_json(r#"{"memory_limit": 2048}"#).unwrap();
        assert_eq!(2048, conf.memory_limit);
        assert_eq!(DEFAULT_GROUP_ARRAY_MIN_CAPACITY, conf.group_array_min_capacity);

        AggregateConfig::from_json(r#"{"memory_limit": "lots"}"#).unwrap_err();
        AggregateConfig::from_json(r#"{"group_array_min_capacity": 1073741824}"#).unwrap_err();
    }

    #[test]
    fn buffer_manager_uses_limit() {
        let conf = AggregateConfig {
            memory_limit: 16,
            ..Default::default()
        };
        let manager = conf.buffer_manager();
        assert_eq!(Some(16), manager.limit());
        manager.try_reserve(17).unwrap_err();

        let manager = AggregateConfig::default().buffer_manager();
        assert_eq!(None, manager.limit());
    }

    #[test]
    fn settings_listed() {
        let names: Vec<_> = AggregateConfig::settings()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(vec!["group_array_min_capacity", "memory_limit"], names);
    }
}
