/*!
Per-area result manifests.

Each area lists the result types it is allowed to put on the wire. Results are
serialized only through the manifest of the command's area, so a type that was
never registered fails loudly instead of leaking an arbitrary shape.
*/

use std::collections::BTreeSet;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// A command result that can be registered in an area manifest.
///
/// Implementors use `#[serde(rename_all = "camelCase")]`.
pub trait ResultType: Serialize + DeserializeOwned + Send + 'static {
    const TYPE_NAME: &'static str;
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("result type {type_name} is not registered in the {area} manifest")]
    Unregistered {
        area: &'static str,
        type_name: &'static str,
    },

    #[error("failed to (de)serialize {type_name}: {source}")]
    Serialize {
        type_name: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone)]
pub struct AreaManifest {
    area: &'static str,
    types: BTreeSet<&'static str>,
}

impl AreaManifest {
    pub fn new(area: &'static str) -> Self {
        Self {
            area,
            types: BTreeSet::new(),
        }
    }

    pub fn register<T: ResultType>(mut self) -> Self {
        self.types.insert(T::TYPE_NAME);
        self
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.types.contains(type_name)
    }

    pub fn to_value<T: ResultType>(&self, value: &T) -> Result<serde_json::Value, ManifestError> {
        self.ensure::<T>()?;
        serde_json::to_value(value).map_err(|source| ManifestError::Serialize {
            type_name: T::TYPE_NAME,
            source,
        })
    }

    pub fn from_value<T: ResultType>(&self, value: serde_json::Value) -> Result<T, ManifestError> {
        self.ensure::<T>()?;
        serde_json::from_value(value).map_err(|source| ManifestError::Serialize {
            type_name: T::TYPE_NAME,
            source,
        })
    }

    fn ensure<T: ResultType>(&self) -> Result<(), ManifestError> {
        if self.contains(T::TYPE_NAME) {
            Ok(())
        } else {
            Err(ManifestError::Unregistered {
                area: self.area,
                type_name: T::TYPE_NAME,
            })
        }
    }
}

/// Serialize `original` through `manifest`, compare it with the expected wire
/// shape and read it back. Returns the type name so callers can tally coverage.
#[cfg(test)]
pub(crate) fn assert_round_trip<T>(
    manifest: &AreaManifest,
    original: &T,
    wire: serde_json::Value,
) -> &'static str
where
    T: ResultType + PartialEq + std::fmt::Debug,
{
    let value = manifest.to_value(original).unwrap();
    assert_eq!(value, wire, "{}", T::TYPE_NAME);
    let back: T = manifest.from_value(value).unwrap();
    assert_eq!(&back, original, "{}", T::TYPE_NAME);
    T::TYPE_NAME
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct SeriesResult {
        metric_name: String,
        values: Vec<f64>,
    }

    impl ResultType for SeriesResult {
        const TYPE_NAME: &'static str = "SeriesResult";
    }

    #[derive(Debug, Serialize, Deserialize)]
    struct Stray;

    impl ResultType for Stray {
        const TYPE_NAME: &'static str = "Stray";
    }

    #[test]
    fn registered_type_serializes_camel_case() {
        let m = AreaManifest::new("test").register::<SeriesResult>();
        let v = m
            .to_value(&SeriesResult {
                metric_name: "cpu".into(),
                values: vec![1.0, 2.5],
            })
            .unwrap();
        assert_eq!(v, json!({"metricName": "cpu", "values": [1.0, 2.5]}));
        let back: SeriesResult = m.from_value(v).unwrap();
        assert_eq!(back.values, vec![1.0, 2.5]);
    }

    #[test]
    fn unregistered_type_fails() {
        let m = AreaManifest::new("test");
        let err = m.to_value(&Stray).unwrap_err();
        assert!(matches!(
            err,
            ManifestError::Unregistered {
                area: "test",
                type_name: "Stray"
            }
        ));
    }
}
