use super::*;
use crate::app::resource_explorer::state::S3Bucket;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListBucketsOutput {
    #[serde(default)]
    buckets: Vec<RawBucket>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawBucket {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    creation_date: Option<String>,
}

/// Normalizer for S3 buckets (`s3api list-buckets`)
///
/// The listing is global, so the region on each bucket is left empty;
/// resolving it would cost one `get-bucket-location` call per bucket.
pub struct S3BucketNormalizer;

impl ResourceNormalizer for S3BucketNormalizer {
    type Record = S3Bucket;

    fn kind(&self) -> ResourceKind {
        ResourceKind::S3
    }

    fn operation(&self) -> &'static [&'static str] {
        &["s3api", "list-buckets"]
    }

    fn normalize(&self, raw: &[u8], _region: Option<&str>) -> Result<Vec<S3Bucket>, CliError> {
        let output: ListBucketsOutput =
            serde_json::from_slice(raw).map_err(|e| CliError::parse("list-buckets", e))?;

        Ok(output
            .buckets
            .into_iter()
            .map(|b| S3Bucket {
                name: b.name.unwrap_or_default(),
                creation_date: b.creation_date.unwrap_or_default(),
                region: String::new(),
            })
            .collect())
    }

    fn into_service_resources(&self, result: AggregateResult<S3Bucket>) -> ServiceResources {
        ServiceResources {
            service: self.kind().key().to_string(),
            s3_buckets: result.records,
            message: result.message,
            ..Default::default()
        }
    }
}
