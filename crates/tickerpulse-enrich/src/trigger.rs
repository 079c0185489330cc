//! Storage notification payload and the trigger handler that turns each
//! record into an accepted raw partition, or skips it.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use tickerpulse_core::PartitionKey;

/// Characters left as-is when encoding keys into synthesized notifications.
const KEY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// A batch of object-created notifications.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<EventRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub s3: S3Entity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct S3Entity {
    pub bucket: BucketRef,
    pub object: ObjectRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketRef {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRef {
    /// URL-encoded object key, `+` standing for a space.
    pub key: String,
}

impl StorageEvent {
    /// Build the batch a storage service would emit after writing `keys`.
    pub fn for_keys<I, S>(bucket: &str, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let records = keys
            .into_iter()
            .map(|key| EventRecord {
                s3: S3Entity {
                    bucket: BucketRef {
                        name: bucket.to_string(),
                    },
                    object: ObjectRef {
                        key: utf8_percent_encode(key.as_ref(), KEY_ENCODE_SET).to_string(),
                    },
                },
            })
            .collect();
        Self { records }
    }
}

/// A notification accepted for enrichment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedObject {
    pub bucket: String,
    /// Decoded source key.
    pub key: String,
    pub partition: PartitionKey,
}

impl AcceptedObject {
    #[must_use]
    pub fn dest_key(&self) -> String {
        self.partition.enriched_key()
    }
}

/// Decode a notification key: `+` becomes a space, then percent-decoding.
#[must_use]
pub fn decode_key(raw: &str) -> String {
    let plus_decoded = raw.replace('+', " ");
    percent_decode_str(&plus_decoded)
        .decode_utf8_lossy()
        .into_owned()
}

/// Accept `record` if its key is a raw partition file; log and skip otherwise.
#[must_use]
pub fn accept(record: &EventRecord) -> Option<AcceptedObject> {
    let bucket = &record.s3.bucket.name;
    let key = decode_key(&record.s3.object.key);

    match PartitionKey::parse_raw_key(&key) {
        Ok(partition) => Some(AcceptedObject {
            bucket: bucket.clone(),
            key,
            partition,
        }),
        Err(reason) => {
            tracing::info!(bucket = %bucket, key = %key, %reason, "skipping notification");
            None
        }
    }
}
