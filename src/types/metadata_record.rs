use serde::{de, Deserialize, Deserializer, Serialize};

/// One `{trait_type, value}` pair of a token's metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub trait_type: String,
    #[serde(deserialize_with = "scalar_as_string")]
    pub value: String,
}

/// The fields read from a descriptor file before the `id` is known.
#[derive(Clone, Debug, Deserialize)]
pub struct Descriptor {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

/// A token's metadata after its image was uploaded and its id attached.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MetadataRecord {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub image: String,
    pub attributes: Vec<Attribute>,
}

impl MetadataRecord {
    pub fn from_descriptor(id: u64, descriptor: Descriptor) -> Self {
        Self {
            id,
            name: descriptor.name,
            description: descriptor.description,
            image: descriptor.image,
            attributes: descriptor.attributes,
        }
    }
}

// Descriptor files in the wild carry numeric trait values (`"value": 3`).
fn scalar_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Bool(b) => Ok(b.to_string()),
        other => Err(de::Error::custom(format!(
            "attribute value must be a string, number or bool, got {other}"
        ))),
    }
}
