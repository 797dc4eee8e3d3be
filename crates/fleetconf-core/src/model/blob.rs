// Serde helpers for opaque config bytes.
//
// Model types keep configs as raw `Vec<u8>`; when serialized (CLI output,
// seed files) the bytes travel as standard base64 strings, matching the
// wire encoding used by remote builders.

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Deserializer, Serializer};

pub(crate) fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub mod option {
    use super::{Deserialize, Deserializer, STANDARD, Serializer, encode};
    use base64::Engine;

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(value: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(bytes) => s.serialize_some(&encode(bytes)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u8>>, D::Error> {
        Option::<String>::deserialize(d)?
            .map(|raw| STANDARD.decode(raw).map_err(serde::de::Error::custom))
            .transpose()
    }
}

pub mod map {
    use super::{BTreeMap, Deserialize, Deserializer, STANDARD, Serializer, encode};
    use base64::Engine;
    use serde::ser::SerializeMap;

    pub fn serialize<S: Serializer>(
        value: &BTreeMap<String, Vec<u8>>,
        s: S,
    ) -> Result<S::Ok, S::Error> {
        let mut map = s.serialize_map(Some(value.len()))?;
        for (k, v) in value {
            map.serialize_entry(k, &encode(v))?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<BTreeMap<String, Vec<u8>>, D::Error> {
        BTreeMap::<String, String>::deserialize(d)?
            .into_iter()
            .map(|(k, v)| {
                STANDARD
                    .decode(v)
                    .map(|bytes| (k, bytes))
                    .map_err(serde::de::Error::custom)
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde::Serialize;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Holder {
        #[serde(with = "option", default)]
        config: Option<Vec<u8>>,
        #[serde(with = "map", default)]
        configs: BTreeMap<String, Vec<u8>>,
    }

    #[test]
    fn bytes_travel_as_base64() {
        let holder = Holder {
            config: Some(b"{}".to_vec()),
            configs: BTreeMap::from([("cellular".to_owned(), b"x".to_vec())]),
        };
        let value = serde_json::to_value(&holder).unwrap();
        assert_eq!(value, json!({ "config": "e30=", "configs": { "cellular": "eA==" } }));

        let back: Holder = serde_json::from_value(value).unwrap();
        assert_eq!(back, holder);
    }

    #[test]
    fn missing_fields_default() {
        let holder: Holder = serde_json::from_value(json!({})).unwrap();
        assert!(holder.config.is_none());
        assert!(holder.configs.is_empty());
    }
}
